//! Lobby state machine.
//!
//! Holds no roster data of its own: the card list and the start gate are
//! recomputed from the session roster on every change event. The only
//! state it carries is the one-way lobby -> match phase flip.

use crate::roster::Roster;
use log::info;
use shared::PlayerColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    Gathering,
    InMatch,
}

/// One rendered roster card.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCardView {
    pub id: u64,
    pub name: String,
    pub ready: bool,
    pub color: PlayerColor,
    /// Kick control: visible only to the authority, never on the host's
    /// own card.
    pub show_kick: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LobbyView {
    pub cards: Vec<PlayerCardView>,
    pub start_enabled: bool,
}

pub struct Lobby {
    phase: LobbyPhase,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            phase: LobbyPhase::Gathering,
        }
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn in_match(&self) -> bool {
        self.phase == LobbyPhase::InMatch
    }

    /// Projects the current roster into the view a given participant sees.
    pub fn project(&self, roster: &Roster, viewer: u64, viewer_is_authority: bool) -> LobbyView {
        let cards = roster
            .snapshot()
            .into_iter()
            .map(|record| PlayerCardView {
                show_kick: viewer_is_authority && record.id != viewer,
                id: record.id,
                name: record.name,
                ready: record.ready,
                color: record.color,
            })
            .collect();

        LobbyView {
            cards,
            start_enabled: roster.all_ready(),
        }
    }

    /// One-shot transition into the match. Returns true exactly once;
    /// repeated start commands are no-ops.
    pub fn start(&mut self) -> bool {
        if self.phase == LobbyPhase::InMatch {
            return false;
        }
        info!("Lobby transitioning to match");
        self.phase = LobbyPhase::InMatch;
        true
    }
}
