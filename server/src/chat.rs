//! Chat fan-out and direct-message protocol.
//!
//! This module only plans deliveries; the network loop executes them.
//! Keeping the planner pure makes the whisper grammar and the recipient
//! sets directly testable without a socket.

use crate::roster::Roster;
use log::warn;
use shared::{NoticeKind, Packet};

/// Who a planned packet goes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    All,
    AllExcept(u64),
    Only(Vec<u64>),
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipients: Recipients,
    pub packet: Packet,
}

fn error_notice(to: u64, text: String) -> Delivery {
    Delivery {
        recipients: Recipients::Only(vec![to]),
        packet: Packet::SystemNotice {
            text,
            kind: NoticeKind::Error,
        },
    }
}

/// Plans deliveries for one chat send from `sender`.
///
/// A leading `@` starts a whisper: the first whitespace-delimited token is
/// `@<participant id>`. A malformed id, a self-target, or a target not in
/// the roster yields a single error notice back to the sender and nothing
/// else. A valid whisper reaches exactly the sender and the target.
/// Anything else broadcasts to all connected participants.
pub fn plan_send(sender: u64, text: &str, roster: &Roster) -> Vec<Delivery> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if let Some(rest) = text.strip_prefix('@') {
        return plan_whisper(sender, rest, roster);
    }

    vec![Delivery {
        recipients: Recipients::All,
        packet: Packet::ChatLine {
            from: sender,
            text: text.to_string(),
        },
    }]
}

fn plan_whisper(sender: u64, rest: &str, roster: &Roster) -> Vec<Delivery> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let id_token = parts.next().unwrap_or("");
    let body = parts.next().unwrap_or("").trim_start();

    let target = match id_token.parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            warn!("Whisper from {} with malformed id {:?}", sender, id_token);
            return vec![error_notice(
                sender,
                format!("Invalid participant id: {}", id_token),
            )];
        }
    };

    if target == sender {
        return vec![error_notice(
            sender,
            "You cannot whisper to yourself.".to_string(),
        )];
    }

    if roster.find(target).is_none() {
        return vec![error_notice(
            sender,
            format!(
                "The message could not be sent. Player {} is not connected.",
                target
            ),
        )];
    }

    vec![Delivery {
        recipients: Recipients::Only(vec![sender, target]),
        packet: Packet::Whisper {
            from: sender,
            to: target,
            text: body.to_string(),
        },
    }]
}

/// Join notice: everyone except the joiner hears about it.
pub fn plan_join_notice(joiner: u64) -> Delivery {
    Delivery {
        recipients: Recipients::AllExcept(joiner),
        packet: Packet::SystemNotice {
            text: format!("Player {} has connected to the server.", joiner),
            kind: NoticeKind::Info,
        },
    }
}

/// Leave notice: all remaining participants hear about it.
pub fn plan_leave_notice(leaver: u64) -> Delivery {
    Delivery {
        recipients: Recipients::All,
        packet: Packet::SystemNotice {
            text: format!("Player {} has disconnected from the server.", leaver),
            kind: NoticeKind::Info,
        },
    }
}
