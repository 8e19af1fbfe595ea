//! Client-side mirror of the replicated session state.
//!
//! The mirror never commits local guesses. Every packet from the authority
//! is applied verbatim, and [`SessionMirror::apply`] reports what changed
//! as a list of [`MirrorEvent`]s in application order, so the presentation
//! layer reacts to changes without polling.

use log::warn;
use shared::{NoticeKind, Packet, ParticipantRecord, PlayerColor, Vec3, SYSTEM_SENDER};
use std::collections::HashMap;

/// Replicated per-player arena state, filled in lazily as updates arrive.
#[derive(Debug, Clone, Default)]
pub struct MirroredPlayer {
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: Option<PlayerColor>,
    pub health: Option<i32>,
    pub dead: bool,
    pub score: i32,
}

/// One rendered chat line, already resolved against the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub line: String,
    pub is_error: bool,
}

/// State change observed while applying one replication packet.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEvent {
    Connected { participant_id: u64, host_id: u64 },
    Disconnected { reason: String },
    RosterChanged,
    TransformChanged(u64),
    ColorChanged(u64),
    HealthChanged(u64),
    ScoreChanged(u64),
    ChatReceived(ChatEntry),
    MatchStarted,
}

pub struct SessionMirror {
    local_id: Option<u64>,
    host_id: Option<u64>,
    records: Vec<ParticipantRecord>,
    players: HashMap<u64, MirroredPlayer>,
    chat_log: Vec<ChatEntry>,
    in_match: bool,
}

impl Default for SessionMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMirror {
    pub fn new() -> Self {
        Self {
            local_id: None,
            host_id: None,
            records: Vec::new(),
            players: HashMap::new(),
            chat_log: Vec::new(),
            in_match: false,
        }
    }

    pub fn local_id(&self) -> Option<u64> {
        self.local_id
    }

    pub fn host_id(&self) -> Option<u64> {
        self.host_id
    }

    pub fn is_local_host(&self) -> bool {
        self.local_id.is_some() && self.local_id == self.host_id
    }

    pub fn in_match(&self) -> bool {
        self.in_match
    }

    pub fn roster(&self) -> &[ParticipantRecord] {
        &self.records
    }

    pub fn player(&self, id: u64) -> Option<&MirroredPlayer> {
        self.players.get(&id)
    }

    pub fn chat_log(&self) -> &[ChatEntry] {
        &self.chat_log
    }

    /// The authority-confirmed name of the local participant. Name change
    /// requests that the authority rejects never show up here, so the
    /// display silently stays on the last accepted name.
    pub fn local_name(&self) -> Option<&str> {
        let id = self.local_id?;
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.as_str())
    }

    fn name_of(&self, id: u64) -> String {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("Player {}", id))
    }

    fn push_chat(&mut self, line: String, is_error: bool) -> MirrorEvent {
        let entry = ChatEntry { line, is_error };
        self.chat_log.push(entry.clone());
        MirrorEvent::ChatReceived(entry)
    }

    /// Applies one authority packet and reports the observed changes.
    pub fn apply(&mut self, packet: Packet) -> Vec<MirrorEvent> {
        match packet {
            Packet::Connected {
                participant_id,
                host_id,
            } => {
                self.local_id = Some(participant_id);
                self.host_id = Some(host_id);
                vec![MirrorEvent::Connected {
                    participant_id,
                    host_id,
                }]
            }

            Packet::Disconnected { reason } => {
                self.local_id = None;
                vec![MirrorEvent::Disconnected { reason }]
            }

            Packet::Roster { records } => {
                // Snapshot replaces the cache wholesale; the host is
                // always the first surviving joiner.
                self.players.retain(|id, _| records.iter().any(|r| r.id == *id));
                self.records = records;
                vec![MirrorEvent::RosterChanged]
            }

            Packet::TransformUpdate {
                id,
                position,
                rotation,
            } => {
                let player = self.players.entry(id).or_default();
                // Canonical values snap; there is no local smoothing.
                player.position = position;
                player.rotation = rotation;
                vec![MirrorEvent::TransformChanged(id)]
            }

            Packet::ColorUpdate { id, color } => {
                self.players.entry(id).or_default().color = Some(color);
                vec![MirrorEvent::ColorChanged(id)]
            }

            Packet::HealthUpdate { id, health, dead } => {
                let player = self.players.entry(id).or_default();
                player.health = Some(health);
                player.dead = dead;
                vec![MirrorEvent::HealthChanged(id)]
            }

            Packet::ScoreUpdate { id, score } => {
                self.players.entry(id).or_default().score = score;
                vec![MirrorEvent::ScoreChanged(id)]
            }

            Packet::ChatLine { from, text } => {
                let line = if from == SYSTEM_SENDER {
                    format!("[System] {}", text)
                } else {
                    format!("{}: {}", self.name_of(from), text)
                };
                vec![self.push_chat(line, false)]
            }

            Packet::Whisper { from, to, text } => {
                let line = if Some(from) == self.local_id {
                    format!("You whispered to {}: {}", self.name_of(to), text)
                } else {
                    format!("{} whispered you: {}", self.name_of(from), text)
                };
                vec![self.push_chat(line, false)]
            }

            Packet::SystemNotice { text, kind } => {
                let is_error = kind == NoticeKind::Error;
                let line = if is_error {
                    format!("[Error] {}", text)
                } else {
                    format!("[System] {}", text)
                };
                vec![self.push_chat(line, is_error)]
            }

            Packet::GameStarted => {
                self.in_match = true;
                vec![MirrorEvent::MatchStarted]
            }

            other => {
                warn!("Unexpected packet type: {:?}", other);
                Vec::new()
            }
        }
    }

    /// Renders one lobby card line per roster record.
    pub fn roster_lines(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| {
                let marker = if Some(r.id) == self.local_id { "*" } else { " " };
                let ready = if r.ready { "ready" } else { "not ready" };
                format!(
                    "{}[{}] {} ({}) - {}",
                    marker,
                    r.id,
                    r.name,
                    r.color.name(),
                    ready
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str, ready: bool, color: PlayerColor) -> ParticipantRecord {
        ParticipantRecord {
            id,
            name: name.to_string(),
            ready,
            color,
        }
    }

    fn connected_mirror(local: u64, host: u64) -> SessionMirror {
        let mut mirror = SessionMirror::new();
        mirror.apply(Packet::Connected {
            participant_id: local,
            host_id: host,
        });
        mirror.apply(Packet::Roster {
            records: vec![
                record(host, "The Host", true, PlayerColor::Black),
                record(local, "Player 2", false, PlayerColor::Blue),
            ],
        });
        mirror
    }

    #[test]
    fn test_connected_sets_identity() {
        let mirror = connected_mirror(2, 1);
        assert_eq!(mirror.local_id(), Some(2));
        assert_eq!(mirror.host_id(), Some(1));
        assert!(!mirror.is_local_host());
        assert_eq!(mirror.local_name(), Some("Player 2"));
    }

    #[test]
    fn test_roster_snapshot_replaces_cache() {
        let mut mirror = connected_mirror(2, 1);
        mirror.apply(Packet::TransformUpdate {
            id: 3,
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
        });

        // Participant 3 was never in the roster, so the next snapshot
        // drops its stale arena state.
        let events = mirror.apply(Packet::Roster {
            records: vec![record(1, "The Host", true, PlayerColor::Black)],
        });
        assert_eq!(events, vec![MirrorEvent::RosterChanged]);
        assert!(mirror.player(3).is_none());
        assert_eq!(mirror.roster().len(), 1);
    }

    #[test]
    fn test_transform_updates_snap() {
        let mut mirror = connected_mirror(2, 1);
        mirror.apply(Packet::TransformUpdate {
            id: 2,
            position: Vec3::new(4.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 90.0, 0.0),
        });

        let player = mirror.player(2).unwrap();
        assert_eq!(player.position, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(player.rotation, Vec3::new(0.0, 90.0, 0.0));
    }

    #[test]
    fn test_whisper_rendering_depends_on_direction() {
        let mut mirror = connected_mirror(2, 1);

        let sent = mirror.apply(Packet::Whisper {
            from: 2,
            to: 1,
            text: "hi".to_string(),
        });
        match &sent[0] {
            MirrorEvent::ChatReceived(entry) => {
                assert_eq!(entry.line, "You whispered to The Host: hi");
            }
            other => panic!("Expected ChatReceived, got {:?}", other),
        }

        let received = mirror.apply(Packet::Whisper {
            from: 1,
            to: 2,
            text: "yo".to_string(),
        });
        match &received[0] {
            MirrorEvent::ChatReceived(entry) => {
                assert_eq!(entry.line, "The Host whispered you: yo");
            }
            other => panic!("Expected ChatReceived, got {:?}", other),
        }
    }

    #[test]
    fn test_error_notice_is_flagged() {
        let mut mirror = connected_mirror(2, 1);
        let events = mirror.apply(Packet::SystemNotice {
            text: "You cannot whisper to yourself.".to_string(),
            kind: NoticeKind::Error,
        });
        match &events[0] {
            MirrorEvent::ChatReceived(entry) => {
                assert!(entry.is_error);
                assert!(entry.line.starts_with("[Error]"));
            }
            other => panic!("Expected ChatReceived, got {:?}", other),
        }
    }

    #[test]
    fn test_chat_log_accumulates_in_order() {
        let mut mirror = connected_mirror(2, 1);
        mirror.apply(Packet::ChatLine {
            from: 1,
            text: "first".to_string(),
        });
        mirror.apply(Packet::ChatLine {
            from: 2,
            text: "second".to_string(),
        });

        let log = mirror.chat_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].line, "The Host: first");
        assert_eq!(log[1].line, "Player 2: second");
    }

    #[test]
    fn test_game_started_flips_phase_once() {
        let mut mirror = connected_mirror(2, 1);
        assert!(!mirror.in_match());
        assert_eq!(mirror.apply(Packet::GameStarted), vec![MirrorEvent::MatchStarted]);
        assert!(mirror.in_match());
    }

    #[test]
    fn test_health_and_score_tracking() {
        let mut mirror = connected_mirror(2, 1);
        mirror.apply(Packet::HealthUpdate {
            id: 1,
            health: 4,
            dead: false,
        });
        mirror.apply(Packet::ScoreUpdate { id: 2, score: 3 });

        assert_eq!(mirror.player(1).unwrap().health, Some(4));
        assert!(!mirror.player(1).unwrap().dead);
        assert_eq!(mirror.player(2).unwrap().score, 3);
    }

    #[test]
    fn test_roster_lines_mark_local_participant() {
        let mirror = connected_mirror(2, 1);
        let lines = mirror.roster_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" [1] The Host"));
        assert!(lines[1].starts_with("*[2] Player 2"));
    }
}
