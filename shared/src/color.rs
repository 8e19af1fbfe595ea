use serde::{Deserialize, Serialize};

/// One value from the shared finite color set players can wear.
///
/// `Gray` is the non-exclusive fallback handed out when the pool runs dry;
/// it never sits in the pool itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    Black,
    Blue,
    Green,
    Yellow,
    Magenta,
    Gray,
}

/// The fixed universe of exclusively assignable colors, in issue order.
pub const COLOR_UNIVERSE: [PlayerColor; 5] = [
    PlayerColor::Black,
    PlayerColor::Blue,
    PlayerColor::Green,
    PlayerColor::Yellow,
    PlayerColor::Magenta,
];

/// Shared color issued once the universe is exhausted.
pub const FALLBACK_COLOR: PlayerColor = PlayerColor::Gray;

impl PlayerColor {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerColor::Black => "black",
            PlayerColor::Blue => "blue",
            PlayerColor::Green => "green",
            PlayerColor::Yellow => "yellow",
            PlayerColor::Magenta => "magenta",
            PlayerColor::Gray => "gray",
        }
    }

    /// Parses a color by its lowercase name. Used by the client's
    /// `/color` command; the fallback color is not requestable.
    pub fn parse(name: &str) -> Option<PlayerColor> {
        COLOR_UNIVERSE
            .iter()
            .find(|c| c.name() == name.to_ascii_lowercase())
            .copied()
    }
}
