/// Roll counter and the bounded action queue it sizes.
///
/// The roll cycles 1..=6, one step per completed drop cycle. A jump opens
/// the queue with capacity = current roll; the capacity is captured at open
/// time and never changes while the queue is open.

use super::grid::Direction;

pub const ROLL_MIN: u8 = 1;
pub const ROLL_MAX: u8 = 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RollCounter {
    value: u8,
}

impl Default for RollCounter {
    fn default() -> Self {
        RollCounter { value: ROLL_MIN }
    }
}

impl RollCounter {
    /// Out-of-range starts are clamped into 1..=6.
    pub fn new(start: u8) -> Self {
        RollCounter { value: start.clamp(ROLL_MIN, ROLL_MAX) }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Step to the next face, wrapping 6 → 1. Returns the new value.
    pub fn advance(&mut self) -> u8 {
        self.value = if self.value >= ROLL_MAX { ROLL_MIN } else { self.value + 1 };
        self.value
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppendOutcome {
    /// Stored; queue still has room.
    Accepted { len: usize },
    /// Stored, and the queue is now at capacity; resolve it.
    Filled,
    /// Queue closed or already full; the command was discarded.
    Dropped,
}

#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    commands: Vec<Direction>,
    capacity: usize,
    open: bool,
}

impl ActionQueue {
    pub fn new() -> Self {
        ActionQueue::default()
    }

    /// Start a fresh queue phase. Any leftovers are discarded.
    pub fn open(&mut self, capacity: usize) {
        self.commands.clear();
        self.commands.reserve(capacity);
        self.capacity = capacity;
        self.open = true;
    }

    pub fn append(&mut self, dir: Direction) -> AppendOutcome {
        if !self.open || self.commands.len() >= self.capacity {
            return AppendOutcome::Dropped;
        }
        self.commands.push(dir);
        if self.commands.len() == self.capacity {
            AppendOutcome::Filled
        } else {
            AppendOutcome::Accepted { len: self.commands.len() }
        }
    }

    /// Drain the commands and close the queue.
    pub fn take(&mut self) -> Vec<Direction> {
        self.open = false;
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_full(&self) -> bool {
        self.open && self.commands.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn commands(&self) -> &[Direction] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_wraps_after_six() {
        let mut r = RollCounter::new(5);
        assert_eq!(r.advance(), 6);
        assert_eq!(r.advance(), 1);
    }

    #[test]
    fn six_cycles_return_to_start() {
        for start in ROLL_MIN..=ROLL_MAX {
            let mut r = RollCounter::new(start);
            for _ in 0..6 { r.advance(); }
            assert_eq!(r.value(), start);
        }
    }

    #[test]
    fn roll_start_is_clamped() {
        assert_eq!(RollCounter::new(0).value(), 1);
        assert_eq!(RollCounter::new(9).value(), 6);
    }

    #[test]
    fn queue_never_exceeds_capacity() {
        let dirs = [Direction::Right, Direction::Up, Direction::Left, Direction::Down];
        for cap in 1..=6usize {
            let mut q = ActionQueue::new();
            q.open(cap);
            for i in 0..20 {
                q.append(dirs[i % dirs.len()]);
                assert!(q.len() <= cap);
            }
            assert_eq!(q.len(), cap);
        }
    }

    #[test]
    fn append_outcomes() {
        let mut q = ActionQueue::new();
        assert_eq!(q.append(Direction::Right), AppendOutcome::Dropped);

        q.open(2);
        assert_eq!(q.append(Direction::Right), AppendOutcome::Accepted { len: 1 });
        assert_eq!(q.append(Direction::Down), AppendOutcome::Filled);
        assert!(q.is_full());
        assert_eq!(q.append(Direction::Left), AppendOutcome::Dropped);
        assert_eq!(q.commands(), &[Direction::Right, Direction::Down]);
    }

    #[test]
    fn take_drains_and_closes() {
        let mut q = ActionQueue::new();
        q.open(1);
        assert_eq!(q.append(Direction::Up), AppendOutcome::Filled);
        assert_eq!(q.take(), vec![Direction::Up]);
        assert!(q.is_empty());
        assert!(!q.is_open());
        assert_eq!(q.append(Direction::Up), AppendOutcome::Dropped);
    }
}
