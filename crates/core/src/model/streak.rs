/// What happened to the streak on the most recent terminal answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakChange {
    Increase,
    Reset,
    #[default]
    None,
}

/// Consecutive-correct counter plus a flag the presenter consumes once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakTracker {
    count: u32,
    last_change: StreakChange,
}

impl StreakTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn last_change(&self) -> StreakChange {
        self.last_change
    }

    /// Apply a terminal answer: `true` increments, anything else resets to zero.
    pub fn apply(&mut self, correct: bool) {
        if correct {
            self.count = self.count.saturating_add(1);
            self.last_change = StreakChange::Increase;
        } else {
            self.count = 0;
            self.last_change = StreakChange::Reset;
        }
    }

    /// Acknowledge the last change; returns it and clears the flag.
    pub fn settle(&mut self) -> StreakChange {
        std::mem::take(&mut self.last_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answers_accumulate_and_miss_resets() {
        let mut streak = StreakTracker::new();
        streak.apply(true);
        streak.apply(true);
        assert_eq!(streak.count(), 2);
        assert_eq!(streak.last_change(), StreakChange::Increase);

        streak.apply(false);
        assert_eq!(streak.count(), 0);
        assert_eq!(streak.last_change(), StreakChange::Reset);
    }

    #[test]
    fn settle_clears_flag_but_keeps_count() {
        let mut streak = StreakTracker::new();
        streak.apply(true);
        assert_eq!(streak.settle(), StreakChange::Increase);
        assert_eq!(streak.last_change(), StreakChange::None);
        assert_eq!(streak.count(), 1);
    }
}
