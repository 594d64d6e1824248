//! Ping-pong double buffer
//!
//! A full-field pass must never read and write the same storage. `BufferPair`
//! owns both instances and only hands them out as one shared read handle plus
//! one exclusive write handle, then makes the written instance current.

/// Identity of one of the two buffers in a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// First instance
    A,
    /// Second instance
    B,
}

impl FieldId {
    /// The other instance of the pair
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Two equally sized buffers used alternately as source and target
#[derive(Debug, Clone)]
pub struct BufferPair<T> {
    a: T,
    b: T,
    current: FieldId,
}

impl<T> BufferPair<T> {
    /// Create a pair with `a` as the current buffer
    pub fn new(a: T, b: T) -> Self {
        Self {
            a,
            b,
            current: FieldId::A,
        }
    }

    /// Latest buffer
    pub fn current(&self) -> &T {
        self.get(self.current)
    }

    /// Identity of the latest buffer
    pub fn current_id(&self) -> FieldId {
        self.current
    }

    /// Buffer by identity
    pub fn get(&self, id: FieldId) -> &T {
        match id {
            FieldId::A => &self.a,
            FieldId::B => &self.b,
        }
    }

    /// Run one pass from the current buffer into the other, then swap
    ///
    /// The closure receives the current buffer as `read` and the write
    /// target as `write`. The two borrows are disjoint, so a pass cannot
    /// alias its input and output.
    pub fn pass<R>(&mut self, f: impl FnOnce(&T, &mut T) -> R) -> R {
        let result = match self.current {
            FieldId::A => f(&self.a, &mut self.b),
            FieldId::B => f(&self.b, &mut self.a),
        };
        self.swap();
        result
    }

    /// Make the write target current
    pub fn swap(&mut self) {
        self.current = self.current.other();
    }

    /// Mutable access to both buffers, for bulk uploads
    pub fn both_mut(&mut self) -> (&mut T, &mut T) {
        (&mut self.a, &mut self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_reads_current_and_swaps() {
        let mut pair = BufferPair::new(vec![1], vec![0]);
        assert_eq!(pair.current_id(), FieldId::A);

        pair.pass(|read, write| {
            write[0] = read[0] + 1;
        });

        assert_eq!(pair.current_id(), FieldId::B);
        assert_eq!(pair.current(), &vec![2]);
        // Source is untouched
        assert_eq!(pair.get(FieldId::A), &vec![1]);
    }

    #[test]
    fn test_identity_alternates() {
        let mut pair = BufferPair::new(0_u8, 0_u8);
        for _ in 0..7 {
            let before = pair.current_id();
            pair.pass(|_, _| ());
            assert_ne!(pair.current_id(), before);
        }
    }

    #[test]
    fn test_other() {
        assert_eq!(FieldId::A.other(), FieldId::B);
        assert_eq!(FieldId::B.other(), FieldId::A);
    }
}
