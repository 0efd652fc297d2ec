use super::labels::LABEL_CAPACITY;

/// Chronological sample buffer that keeps at least the newest `LABEL_CAPACITY`
/// values.
///
/// Samples are only ever appended. Once the buffer holds twice the retained
/// size, the oldest half is dropped in one go, so the tail stays a contiguous
/// slice and the per-push cost stays amortized constant.
#[derive(Debug, Clone, Default)]
pub struct History {
    samples: Vec<f64>,
}

impl History {
    pub fn new() -> Self {
        History {
            samples: Vec::with_capacity(LABEL_CAPACITY),
        }
    }

    /// Buffer seeded with a single sample.
    pub fn seeded(value: f64) -> Self {
        let mut history = History::new();
        history.push(value);
        history
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() >= 2 * LABEL_CAPACITY {
            let excess = self.samples.len() - LABEL_CAPACITY;
            self.samples.drain(..excess);
        }
        self.samples.push(value);
    }

    /// Retained samples, oldest first.
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut h = History::new();
        for i in 0..10 {
            h.push(i as f64);
        }
        assert_eq!(h.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_bounded() {
        let mut h = History::new();
        let n = 5 * LABEL_CAPACITY + 7;
        for i in 0..n {
            h.push(i as f64);
        }
        let retained = h.as_slice();
        assert!(retained.len() >= LABEL_CAPACITY);
        assert!(retained.len() <= 2 * LABEL_CAPACITY);

        // the newest LABEL_CAPACITY samples survive, in order
        let tail = &retained[retained.len() - LABEL_CAPACITY..];
        for (offset, value) in tail.iter().enumerate() {
            assert_eq!(*value, (n - LABEL_CAPACITY + offset) as f64);
        }
    }

    #[test]
    fn test_seeded() {
        let h = History::seeded(42.0);
        assert_eq!(h.as_slice(), &[42.0]);
    }
}
