//! Authoritative per-player simulation state.
//!
//! Holds the canonical transform (position + Euler rotation), appearance
//! color, health, score, and the per-life state machine for every player
//! in the match. Mutators return the committed value only when the
//! canonical state actually changed, so the network loop never replicates
//! a redundant write.

use log::{info, warn};
use shared::{wrap_euler, PlayerColor, Vec3, ARENA_MAX, ARENA_MIN, SPAWN_POSITIONS, STARTING_HEALTH};
use std::collections::HashMap;

/// Per-life state. `Dead` is terminal; there is no respawn path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Idle,
    Moving,
    Reloading,
    Dead,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: u64,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: PlayerColor,
    pub health: i32,
    pub score: i32,
    pub score_multiplier: f32,
    pub life: LifeState,
}

impl PlayerState {
    fn new(id: u64, position: Vec3, color: PlayerColor) -> Self {
        Self {
            id,
            position,
            rotation: Vec3::ZERO,
            color,
            health: STARTING_HEALTH,
            score: 0,
            score_multiplier: 1.0,
            life: LifeState::Idle,
        }
    }
}

pub struct Arena {
    players: HashMap<u64, PlayerState>,
    host_id: u64,
    bounds_min: Vec3,
    bounds_max: Vec3,
    spawn_index: usize,
}

impl Arena {
    pub fn new(host_id: u64) -> Self {
        Self {
            players: HashMap::new(),
            host_id,
            bounds_min: ARENA_MIN,
            bounds_max: ARENA_MAX,
            spawn_index: 0,
        }
    }

    #[cfg(test)]
    pub fn with_bounds(host_id: u64, min: Vec3, max: Vec3) -> Self {
        let mut arena = Self::new(host_id);
        arena.bounds_min = min;
        arena.bounds_max = max;
        arena
    }

    fn next_spawn(&mut self) -> Vec3 {
        let pos = SPAWN_POSITIONS[self.spawn_index];
        self.spawn_index = (self.spawn_index + 1) % SPAWN_POSITIONS.len();
        pos
    }

    /// Spawns a player at the next slot in the spawn ring. Idempotent per id.
    pub fn spawn_player(&mut self, id: u64, color: PlayerColor) -> &PlayerState {
        if !self.players.contains_key(&id) {
            let position = self.next_spawn();
            info!("Spawned player {} at ({}, {}, {})", id, position.x, position.y, position.z);
            self.players.insert(id, PlayerState::new(id, position, color));
        }
        &self.players[&id]
    }

    pub fn remove_player(&mut self, id: u64) {
        if self.players.remove(&id).is_some() {
            info!("Removed player {} from arena", id);
        }
    }

    /// Applies a movement delta from the owning participant.
    ///
    /// The candidate position is clamped component-wise into the arena
    /// bounds unless the mover is the host participant, which is exempt
    /// (preserved quirk of the original game). Commits and returns the new
    /// position only when it differs from the current canonical value;
    /// dead players and no-op moves return `None`.
    pub fn apply_move(&mut self, id: u64, delta: Vec3) -> Option<Vec3> {
        let host_id = self.host_id;
        let (min, max) = (self.bounds_min, self.bounds_max);
        let player = self.players.get_mut(&id)?;

        if player.life == LifeState::Dead {
            return None;
        }

        if delta.is_zero() {
            if player.life == LifeState::Moving {
                player.life = LifeState::Idle;
            }
            return None;
        }

        let mut candidate = player.position.add(&delta);
        if id != host_id {
            candidate = candidate.clamp_into(&min, &max);
        }

        if candidate == player.position {
            return None;
        }

        player.position = candidate;
        if player.life == LifeState::Idle {
            player.life = LifeState::Moving;
        }
        Some(candidate)
    }

    /// Applies an Euler rotation delta, wrapping into [0, 360). Zero
    /// deltas and results identical to the current rotation commit nothing.
    pub fn apply_rotate(&mut self, id: u64, delta: Vec3) -> Option<Vec3> {
        let player = self.players.get_mut(&id)?;

        if player.life == LifeState::Dead || delta.is_zero() {
            return None;
        }

        let candidate = wrap_euler(player.rotation.add(&delta));
        if candidate == player.rotation {
            return None;
        }

        player.rotation = candidate;
        Some(candidate)
    }

    /// Sets the canonical color. The caller replicates the new value to
    /// every observer except the actor, which already updated its local
    /// presentation out-of-band.
    pub fn set_color(&mut self, id: u64, color: PlayerColor) -> Option<PlayerColor> {
        let player = self.players.get_mut(&id)?;
        if player.color == color {
            return None;
        }
        player.color = color;
        Some(color)
    }

    /// Damage-application entry point for the physics collaborator.
    /// Health at or below zero transitions the player to the terminal
    /// `Dead` state; further damage is ignored.
    pub fn apply_damage(&mut self, id: u64, amount: i32) -> Option<(i32, bool)> {
        let player = self.players.get_mut(&id)?;

        if player.life == LifeState::Dead {
            return None;
        }

        player.health -= amount;
        if player.health <= 0 {
            player.health = 0;
            player.life = LifeState::Dead;
            warn!("Player {} died", id);
        }
        Some((player.health, player.life == LifeState::Dead))
    }

    /// Marks the player as reloading. Movement stays legal meanwhile.
    pub fn begin_reload(&mut self, id: u64) -> bool {
        match self.players.get_mut(&id) {
            Some(player) if player.life != LifeState::Dead => {
                player.life = LifeState::Reloading;
                true
            }
            _ => false,
        }
    }

    pub fn finish_reload(&mut self, id: u64) {
        if let Some(player) = self.players.get_mut(&id) {
            if player.life == LifeState::Reloading {
                player.life = LifeState::Idle;
            }
        }
    }

    /// Adds points scaled by the player's score multiplier.
    pub fn add_score(&mut self, id: u64, points: i32) -> Option<i32> {
        let player = self.players.get_mut(&id)?;
        player.score += (points as f32 * player.score_multiplier) as i32;
        Some(player.score)
    }

    pub fn player(&self, id: u64) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::BULLET_DAMAGE;

    fn small_arena(host_id: u64) -> Arena {
        Arena::with_bounds(
            host_id,
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 5.0, 10.0),
        )
    }

    #[test]
    fn test_spawn_ring_round_robin() {
        let mut arena = Arena::new(1);
        let first = arena.spawn_player(1, PlayerColor::Black).position;
        let second = arena.spawn_player(2, PlayerColor::Blue).position;
        assert_eq!(first, SPAWN_POSITIONS[0]);
        assert_eq!(second, SPAWN_POSITIONS[1]);
    }

    #[test]
    fn test_spawn_is_idempotent() {
        let mut arena = Arena::new(1);
        let first = arena.spawn_player(1, PlayerColor::Black).position;
        let again = arena.spawn_player(1, PlayerColor::Black).position;
        assert_eq!(first, again);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_move_commits_and_returns_new_position() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);
        let start = arena.player(2).unwrap().position;

        let committed = arena.apply_move(2, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(committed, start.add(&Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(arena.player(2).unwrap().life, LifeState::Moving);
    }

    #[test]
    fn test_non_host_is_clamped_to_bounds() {
        let mut arena = small_arena(1);
        arena.spawn_player(1, PlayerColor::Black);
        arena.spawn_player(2, PlayerColor::Blue);

        let committed = arena.apply_move(2, Vec3::new(1000.0, 0.0, 0.0)).unwrap();
        assert_eq!(committed.x, 10.0);
    }

    #[test]
    fn test_host_is_exempt_from_clamping() {
        let mut arena = small_arena(1);
        arena.spawn_player(1, PlayerColor::Black);

        let committed = arena.apply_move(1, Vec3::new(1000.0, 0.0, 0.0)).unwrap();
        assert!(committed.x > 10.0);
    }

    #[test]
    fn test_fully_clamped_move_commits_nothing() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);

        // Walk into the wall, then push further: position no longer changes.
        arena.apply_move(2, Vec3::new(1000.0, 0.0, 0.0));
        assert!(arena.apply_move(2, Vec3::new(5.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_zero_delta_returns_to_idle() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);
        arena.apply_move(2, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(arena.player(2).unwrap().life, LifeState::Moving);

        assert!(arena.apply_move(2, Vec3::ZERO).is_none());
        assert_eq!(arena.player(2).unwrap().life, LifeState::Idle);
    }

    #[test]
    fn test_rotation_ignores_zero_delta_and_wraps() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);

        assert!(arena.apply_rotate(2, Vec3::ZERO).is_none());

        let committed = arena.apply_rotate(2, Vec3::new(0.0, 450.0, 0.0)).unwrap();
        assert!((committed.y - 90.0).abs() < 0.001);
    }

    #[test]
    fn test_full_turn_commits_nothing() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);
        assert!(arena.apply_rotate(2, Vec3::new(0.0, 360.0, 0.0)).is_none());
    }

    #[test]
    fn test_color_change_suppresses_redundant_write() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);

        assert_eq!(
            arena.set_color(2, PlayerColor::Green),
            Some(PlayerColor::Green)
        );
        assert!(arena.set_color(2, PlayerColor::Green).is_none());
    }

    #[test]
    fn test_damage_until_death_is_terminal() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);

        let mut last = (STARTING_HEALTH, false);
        while !last.1 {
            last = arena.apply_damage(2, BULLET_DAMAGE).unwrap();
        }
        assert_eq!(last.0, 0);
        assert_eq!(arena.player(2).unwrap().life, LifeState::Dead);

        // Death is terminal: no further damage, no movement.
        assert!(arena.apply_damage(2, 1).is_none());
        assert!(arena.apply_move(2, Vec3::new(1.0, 0.0, 0.0)).is_none());
        assert!(arena.apply_rotate(2, Vec3::new(0.0, 10.0, 0.0)).is_none());
    }

    #[test]
    fn test_reload_round_trip() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);

        assert!(arena.begin_reload(2));
        assert_eq!(arena.player(2).unwrap().life, LifeState::Reloading);
        arena.finish_reload(2);
        assert_eq!(arena.player(2).unwrap().life, LifeState::Idle);
    }

    #[test]
    fn test_score_respects_multiplier() {
        let mut arena = small_arena(1);
        arena.spawn_player(2, PlayerColor::Blue);
        assert_eq!(arena.add_score(2, 10), Some(10));

        // Double-points effect doubles every subsequent award.
        if let Some(player) = arena.players.get_mut(&2) {
            player.score_multiplier = 2.0;
        }
        assert_eq!(arena.add_score(2, 10), Some(30));
    }

    #[test]
    fn test_requests_for_unknown_player_are_dropped() {
        let mut arena = small_arena(1);
        assert!(arena.apply_move(99, Vec3::new(1.0, 0.0, 0.0)).is_none());
        assert!(arena.apply_damage(99, 1).is_none());
        assert!(arena.set_color(99, PlayerColor::Green).is_none());
    }
}
