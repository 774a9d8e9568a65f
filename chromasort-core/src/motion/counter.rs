//! Delivery slot counter for the rotating tray

/// Monotonic cube count with a clamped slot index
///
/// Once the count passes the last slot, every further cube uses the last
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CubeCounter {
    count: u32,
    slot_count: usize,
}

impl CubeCounter {
    pub const fn new(slot_count: usize) -> Self {
        Self {
            count: 0,
            slot_count,
        }
    }

    /// Cubes counted so far
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Slot for the next cube, in `[0, slot_count - 1]`
    pub fn index(&self) -> usize {
        (self.count as usize).min(self.slot_count.saturating_sub(1))
    }

    pub fn advance(&mut self) {
        self.count = self.count.saturating_add(1);
    }
}
