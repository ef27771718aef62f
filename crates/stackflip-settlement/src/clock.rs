//! A chain clock driven by hand.

use std::sync::atomic::{AtomicU64, Ordering};

use stackflip_types::{BlockHeight, ChainClock};

/// Block height that only moves when told to, and never backwards.
#[derive(Debug, Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Mine `blocks` blocks. Returns the new height.
    pub fn advance(&self, blocks: BlockHeight) -> BlockHeight {
        let prev = self
            .height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| {
                Some(h.saturating_add(blocks))
            })
            .unwrap_or_else(|h| h);
        prev.saturating_add(blocks)
    }

    /// Jump to `height`. Earlier heights are ignored.
    pub fn set(&self, height: BlockHeight) -> BlockHeight {
        self.height.fetch_max(height, Ordering::SeqCst).max(height)
    }
}

impl ChainClock for ManualClock {
    fn current_height(&self) -> BlockHeight {
        self.height.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_set() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.current_height(), 100);
        assert_eq!(clock.advance(50), 150);
        assert_eq!(clock.set(400), 400);
        assert_eq!(clock.current_height(), 400);
    }

    #[test]
    fn never_goes_backwards() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.set(10), 100);
        assert_eq!(clock.current_height(), 100);
        clock.set(BlockHeight::MAX);
        assert_eq!(clock.advance(1), BlockHeight::MAX);
    }
}
