pub mod color;
pub mod math;
pub mod protocol;

pub use color::{PlayerColor, COLOR_UNIVERSE, FALLBACK_COLOR};
pub use math::{wrap_euler, Vec3};
pub use protocol::{NoticeKind, Packet, ParticipantRecord, SYSTEM_SENDER};

pub const PROTOCOL_VERSION: u32 = 1;

/// Rectangular arena boundary. Non-host movement is clamped into this box.
pub const ARENA_MIN: Vec3 = Vec3 {
    x: -25.0,
    y: 0.0,
    z: -25.0,
};
pub const ARENA_MAX: Vec3 = Vec3 {
    x: 25.0,
    y: 10.0,
    z: 25.0,
};

/// Round-robin spawn ring used when the match starts.
pub const SPAWN_POSITIONS: [Vec3; 4] = [
    Vec3 {
        x: 4.0,
        y: 0.0,
        z: 0.0,
    },
    Vec3 {
        x: -4.0,
        y: 0.0,
        z: 0.0,
    },
    Vec3 {
        x: 0.0,
        y: 0.0,
        z: 4.0,
    },
    Vec3 {
        x: 0.0,
        y: 0.0,
        z: -4.0,
    },
];

pub const STARTING_HEALTH: i32 = 10;
pub const BULLET_DAMAGE: i32 = 3;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 16;

/// Substrings that may not appear in a display name, matched
/// case-insensitively.
pub const BANNED_NAME_WORDS: [&str; 2] = ["badword", "admin"];

/// Validates a display name: 3-16 characters, ASCII alphanumeric only,
/// and free of banned substrings. The authority re-runs this on every
/// name-change request; clients use it for early local feedback.
pub fn is_valid_name(name: &str) -> bool {
    if name.len() < NAME_MIN_LEN || name.len() > NAME_MAX_LEN {
        return false;
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    let lowered = name.to_ascii_lowercase();
    !BANNED_NAME_WORDS.iter().any(|word| lowered.contains(word))
}
