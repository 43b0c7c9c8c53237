use serde::{Deserialize, Serialize};

pub const DEFAULT_TAPE_CAPACITY: usize = 30_000;

/// What `>` does on the last cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TapeOverflow {
    /// Fail the run with `TapeOverflow`.
    #[default]
    Reject,
    /// Stay on the last cell.
    Clamp,
    /// Append a fresh zero cell.
    Grow,
}

/// Result of moving the pointer right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Grew,
    Clamped,
    Rejected,
}

/// Zero-initialized byte tape with a data pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    ptr: usize,
}

impl Tape {
    pub fn new(capacity: usize) -> Self {
        Tape {
            cells: vec![0; capacity.max(1)],
            ptr: 0,
        }
    }

    #[inline]
    pub fn ptr(&self) -> usize {
        self.ptr
    }

    #[inline]
    pub fn get(&self) -> u8 {
        self.cells[self.ptr]
    }

    #[inline]
    pub fn set(&mut self, value: u8) {
        self.cells[self.ptr] = value;
    }

    pub fn inc(&mut self) {
        self.cells[self.ptr] = self.cells[self.ptr].wrapping_add(1);
    }

    pub fn dec(&mut self) {
        self.cells[self.ptr] = self.cells[self.ptr].wrapping_sub(1);
    }

    /// Move left, stopping at cell 0.
    pub fn left(&mut self) {
        self.ptr = self.ptr.saturating_sub(1);
    }

    pub fn right(&mut self, policy: TapeOverflow) -> Advance {
        if self.ptr + 1 < self.cells.len() {
            self.ptr += 1;
            return Advance::Moved;
        }
        match policy {
            TapeOverflow::Reject => Advance::Rejected,
            TapeOverflow::Clamp => Advance::Clamped,
            TapeOverflow::Grow => {
                self.cells.push(0);
                self.ptr += 1;
                Advance::Grew
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Cells up to the last one that matters: the last non-zero cell or the
    /// data pointer, whichever is further right.
    pub fn truncated(&self) -> Vec<u8> {
        let last_used = self.cells.iter().rposition(|&c| c != 0).unwrap_or(0);
        let end = last_used.max(self.ptr) + 1;
        self.cells[..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound_round_trip() {
        let mut t = Tape::new(4);
        t.set(17);
        for _ in 0..256 {
            t.inc();
        }
        assert_eq!(t.get(), 17);
        for _ in 0..256 {
            t.dec();
        }
        assert_eq!(t.get(), 17);
    }

    #[test]
    fn test_wrap_edges() {
        let mut t = Tape::new(1);
        t.dec();
        assert_eq!(t.get(), 255);
        t.inc();
        assert_eq!(t.get(), 0);
    }

    #[test]
    fn test_left_floor() {
        let mut t = Tape::new(3);
        t.left();
        t.left();
        assert_eq!(t.ptr(), 0);
    }

    #[test]
    fn test_right_policies() {
        let mut t = Tape::new(2);
        assert_eq!(t.right(TapeOverflow::Reject), Advance::Moved);
        assert_eq!(t.right(TapeOverflow::Reject), Advance::Rejected);
        assert_eq!(t.ptr(), 1);
        assert_eq!(t.right(TapeOverflow::Clamp), Advance::Clamped);
        assert_eq!(t.ptr(), 1);
        assert_eq!(t.right(TapeOverflow::Grow), Advance::Grew);
        assert_eq!(t.ptr(), 2);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_truncated() {
        let mut t = Tape::new(10);
        assert_eq!(t.truncated(), vec![0]);
        t.right(TapeOverflow::Reject);
        t.right(TapeOverflow::Reject);
        t.inc();
        t.right(TapeOverflow::Reject);
        t.right(TapeOverflow::Reject);
        assert_eq!(t.truncated(), vec![0, 0, 1, 0, 0]);
    }
}
