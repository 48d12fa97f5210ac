/// One pass of the effect scheduler.
///
/// Frames are counted, not timed: everything that happens between two
/// flushes belongs to the same frame, which keeps traces replayable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// 0-based flush index.
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn next_advances_index() {
        let f0 = Frame::default();
        assert_eq!(f0.index, 0);
        assert_eq!(f0.next().next(), Frame::new(2));
    }
}
