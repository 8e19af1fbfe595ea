//! Authoritative session roster.
//!
//! Owns the ordered list of connected participants (id, name, ready flag,
//! color) and the instance-scoped color pool. Only the authority loop
//! mutates it; every successful mutation yields one [`RosterEvent`] which
//! the caller fans out in mutation order, so observers always see events
//! in the same order the roster changed.

use crate::colors::ColorPool;
use log::{info, warn};
use shared::{is_valid_name, ParticipantRecord};

/// Change notification emitted by every successful roster mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    Added(ParticipantRecord),
    Removed(ParticipantRecord),
    Updated(ParticipantRecord),
}

pub struct Roster {
    records: Vec<ParticipantRecord>,
    colors: ColorPool,
    host_id: Option<u64>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            colors: ColorPool::new(),
            host_id: None,
        }
    }

    /// Adds a participant. The first joiner becomes the host (named and
    /// ready from the start); later joiners get a default name and must
    /// ready up themselves. Returns `None` if the id is already present
    /// (idempotent join-dedup).
    pub fn join(&mut self, participant_id: u64) -> Option<RosterEvent> {
        if self.find(participant_id).is_some() {
            warn!("Duplicate join for participant {}, ignoring", participant_id);
            return None;
        }

        let is_host = self.host_id.is_none();
        if is_host {
            self.host_id = Some(participant_id);
        }

        let record = ParticipantRecord {
            id: participant_id,
            name: if is_host {
                "The Host".to_string()
            } else {
                format!("Player {}", participant_id)
            },
            ready: is_host,
            color: self.colors.assign(participant_id),
        };

        info!(
            "Participant {} joined as {:?} ({})",
            participant_id,
            record.name,
            record.color.name()
        );
        self.records.push(record.clone());
        Some(RosterEvent::Added(record))
    }

    /// Removes a participant and returns their color to the pool. No-op
    /// for unknown ids (the record may already be gone when an in-flight
    /// request races a disconnect).
    pub fn leave(&mut self, participant_id: u64) -> Option<RosterEvent> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == participant_id)?;

        let record = self.records.remove(idx);
        self.colors.release(record.color);
        info!("Participant {} left", participant_id);
        Some(RosterEvent::Removed(record))
    }

    /// Updates a participant's ready flag in place. Silently dropped when
    /// the participant has already disconnected.
    pub fn set_ready(&mut self, participant_id: u64, ready: bool) -> Option<RosterEvent> {
        let record = self.records.iter_mut().find(|r| r.id == participant_id)?;
        record.ready = ready;
        Some(RosterEvent::Updated(record.clone()))
    }

    /// Commits a validated name change. Rejections cause no state change
    /// and no event; the requester is expected to restore its own cached
    /// last-good name.
    pub fn set_name(&mut self, participant_id: u64, name: &str) -> Option<RosterEvent> {
        if !is_valid_name(name) {
            warn!(
                "Rejected invalid name {:?} from participant {}",
                name, participant_id
            );
            return None;
        }

        let record = self.records.iter_mut().find(|r| r.id == participant_id)?;
        record.name = name.to_string();
        Some(RosterEvent::Updated(record.clone()))
    }

    /// O(n) scan of the ordered list.
    pub fn find(&self, participant_id: u64) -> Option<&ParticipantRecord> {
        self.records.iter().find(|r| r.id == participant_id)
    }

    /// True when every current record is ready; vacuously true when empty.
    pub fn all_ready(&self) -> bool {
        self.records.iter().all(|r| r.ready)
    }

    pub fn host_id(&self) -> Option<u64> {
        self.host_id
    }

    pub fn is_host(&self, participant_id: u64) -> bool {
        self.host_id == Some(participant_id)
    }

    /// The full ordered snapshot, cloned for replication.
    pub fn snapshot(&self) -> Vec<ParticipantRecord> {
        self.records.clone()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
