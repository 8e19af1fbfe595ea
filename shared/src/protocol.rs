use crate::color::PlayerColor;
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Sender id used for authority-originated chat notices.
pub const SYSTEM_SENDER: u64 = u64::MAX;

/// One entry in the replicated session roster.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub id: u64,
    pub name: String,
    pub ready: bool,
    pub color: PlayerColor,
}

/// Severity of an authority-originated chat notice.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Participant -> authority
    Connect {
        client_version: u32,
        requested_name: Option<String>,
    },
    Disconnect,
    SetReady {
        ready: bool,
    },
    SetName {
        name: String,
    },
    Chat {
        text: String,
    },
    Move {
        delta: Vec3,
    },
    Rotate {
        delta: Vec3,
    },
    ColorChange {
        color: PlayerColor,
    },
    /// Damage-application entry point, normally driven by the physics
    /// collaborator when a projectile strikes `target`.
    ReportHit {
        target: u64,
        amount: i32,
    },
    /// Begins a weapon reload; the authority settles the player back to
    /// idle once the reload duration elapses.
    Reload,
    StartGame,
    /// Host-only: ejects `target` from the session.
    Kick {
        target: u64,
    },

    // Authority -> participants
    Connected {
        participant_id: u64,
        host_id: u64,
    },
    Disconnected {
        reason: String,
    },
    /// Full ordered roster snapshot, broadcast after every roster mutation.
    Roster {
        records: Vec<ParticipantRecord>,
    },
    TransformUpdate {
        id: u64,
        position: Vec3,
        rotation: Vec3,
    },
    ColorUpdate {
        id: u64,
        color: PlayerColor,
    },
    HealthUpdate {
        id: u64,
        health: i32,
        dead: bool,
    },
    ScoreUpdate {
        id: u64,
        score: i32,
    },
    ChatLine {
        from: u64,
        text: String,
    },
    Whisper {
        from: u64,
        to: u64,
        text: String,
    },
    SystemNotice {
        text: String,
        kind: NoticeKind,
    },
    GameStarted,
}
