//! Finite color pool backing the session roster.
//!
//! Colors are issued in a fixed preset order and returned to the back of
//! the queue, so a just-released color waits behind every color that was
//! already unissued. When the pool is exhausted the shared fallback color
//! is handed out without being bound to anyone.

use log::warn;
use shared::{PlayerColor, COLOR_UNIVERSE, FALLBACK_COLOR};
use std::collections::{HashMap, VecDeque};

pub struct ColorPool {
    /// Colors not currently worn by anyone, in issue order.
    unissued: VecDeque<PlayerColor>,
    /// Issued color -> holder participant id.
    issued: HashMap<PlayerColor, u64>,
}

impl Default for ColorPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPool {
    pub fn new() -> Self {
        Self {
            unissued: COLOR_UNIVERSE.into_iter().collect(),
            issued: HashMap::new(),
        }
    }

    /// Issues a color to `holder`. Idempotent: a holder that already has a
    /// color gets the same one back. Returns the fallback color, unbound,
    /// once the pool is empty.
    pub fn assign(&mut self, holder: u64) -> PlayerColor {
        if let Some((color, _)) = self.issued.iter().find(|(_, h)| **h == holder) {
            return *color;
        }

        match self.unissued.pop_front() {
            Some(color) => {
                self.issued.insert(color, holder);
                color
            }
            None => {
                warn!(
                    "Color pool exhausted, issuing shared fallback to participant {}",
                    holder
                );
                FALLBACK_COLOR
            }
        }
    }

    /// Returns an issued color to the pool. No-op for the fallback color
    /// or a color that is already unissued.
    pub fn release(&mut self, color: PlayerColor) {
        if color == FALLBACK_COLOR || self.unissued.contains(&color) {
            return;
        }

        self.issued.remove(&color);
        self.unissued.push_back(color);
    }

    /// The color currently bound to `holder`, if any.
    pub fn color_of(&self, holder: u64) -> Option<PlayerColor> {
        self.issued
            .iter()
            .find(|(_, h)| **h == holder)
            .map(|(color, _)| *color)
    }

    pub fn remaining(&self) -> usize {
        self.unissued.len()
    }

    /// Issued and unissued together must always equal the fixed universe.
    #[cfg(test)]
    fn universe_intact(&self) -> bool {
        let mut seen: Vec<PlayerColor> = self.unissued.iter().copied().collect();
        seen.extend(self.issued.keys().copied());
        seen.len() == COLOR_UNIVERSE.len()
            && COLOR_UNIVERSE.iter().all(|c| seen.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_follows_preset_order() {
        let mut pool = ColorPool::new();
        for (i, expected) in COLOR_UNIVERSE.iter().enumerate() {
            assert_eq!(pool.assign(i as u64), *expected);
        }
        assert!(pool.universe_intact());
    }

    #[test]
    fn test_assign_is_idempotent_per_holder() {
        let mut pool = ColorPool::new();
        let first = pool.assign(7);
        let second = pool.assign(7);
        assert_eq!(first, second);
        assert_eq!(pool.remaining(), COLOR_UNIVERSE.len() - 1);
    }

    #[test]
    fn test_exhaustion_degrades_to_fallback() {
        let mut pool = ColorPool::new();
        for id in 0..COLOR_UNIVERSE.len() as u64 {
            pool.assign(id);
        }

        assert_eq!(pool.assign(100), FALLBACK_COLOR);
        assert_eq!(pool.assign(101), FALLBACK_COLOR);
        // Fallback is never bound, so each caller keeps re-receiving it.
        assert_eq!(pool.color_of(100), None);
        assert!(pool.universe_intact());
    }

    #[test]
    fn test_released_color_waits_behind_unissued() {
        let mut pool = ColorPool::new();
        let black = pool.assign(1);
        assert_eq!(black, PlayerColor::Black);

        pool.release(black);

        // Three other colors are still ahead in the queue.
        assert_eq!(pool.assign(2), PlayerColor::Blue);
        assert_eq!(pool.assign(3), PlayerColor::Green);
        assert!(pool.universe_intact());
    }

    #[test]
    fn test_release_fallback_is_noop() {
        let mut pool = ColorPool::new();
        pool.release(FALLBACK_COLOR);
        assert_eq!(pool.remaining(), COLOR_UNIVERSE.len());
        assert!(pool.universe_intact());
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut pool = ColorPool::new();
        let color = pool.assign(1);
        pool.release(color);
        pool.release(color);
        assert_eq!(pool.remaining(), COLOR_UNIVERSE.len());
        assert!(pool.universe_intact());
    }

    #[test]
    fn test_no_double_allocation_after_release() {
        let mut pool = ColorPool::new();
        let a = pool.assign(1);
        pool.release(a);

        let mut handed_out = Vec::new();
        for id in 10..(10 + COLOR_UNIVERSE.len() as u64) {
            handed_out.push(pool.assign(id));
        }

        let mut deduped = handed_out.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), handed_out.len());
        assert!(pool.universe_intact());
    }
}
