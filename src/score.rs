//! Score: one point per cleared run.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    value: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one point per run found in a clear pass. Saturates instead of wrapping.
    pub fn add_runs(&mut self, runs: u32) {
        self.value = self.value.saturating_add(runs);
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(Score::new().value(), 0);
    }

    #[test]
    fn test_each_run_counts() {
        let mut score = Score::new();
        score.add_runs(2);
        score.add_runs(0);
        score.add_runs(1);
        assert_eq!(score.value(), 3);
    }

    #[test]
    fn test_never_wraps() {
        let mut score = Score::new();
        score.add_runs(u32::MAX);
        score.add_runs(5);
        assert_eq!(score.value(), u32::MAX);
    }
}
