use std::time::Duration;

/// Cursor over `0..=step_count`. Index 0 is the overview; `k` means "after
/// step `k`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepNavigator {
    index: usize,
    step_count: usize,
}

impl StepNavigator {
    pub fn new(step_count: usize) -> Self {
        Self {
            index: 0,
            step_count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn at_overview(&self) -> bool {
        self.index == 0
    }

    pub fn at_end(&self) -> bool {
        self.index == self.step_count
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn previous(&mut self) -> bool {
        self.step(-1)
    }

    /// Move by `delta`, clamped to `0..=step_count`. Returns whether the
    /// index changed.
    pub fn step(&mut self, delta: isize) -> bool {
        let target = self.index.saturating_add_signed(delta).min(self.step_count);
        self.jump_to(target)
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        let clamped = index.min(self.step_count);
        if clamped == self.index {
            return false;
        }
        self.index = clamped;
        true
    }

    /// Update the upper bound after steps were added or removed; re-clamps
    /// the cursor.
    pub fn set_step_count(&mut self, step_count: usize) -> bool {
        self.step_count = step_count;
        if self.index > step_count {
            self.index = step_count;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPlayState {
    Paused,
    Playing,
}

/// Timer-driven repeated `next`. Driven by [`AutoPlay::tick`] from the host
/// loop; no threads or timers of its own.
#[derive(Debug, Clone)]
pub struct AutoPlay {
    interval: Duration,
    elapsed: Duration,
    state: AutoPlayState,
}

impl AutoPlay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            state: AutoPlayState::Paused,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_playing(&self) -> bool {
        self.state == AutoPlayState::Playing
    }

    /// Start playing. Playing from the last step restarts at the overview.
    pub fn play(&mut self, navigator: &mut StepNavigator) {
        if navigator.step_count() == 0 {
            return;
        }
        if navigator.at_end() {
            navigator.jump_to(0);
        }
        self.elapsed = Duration::ZERO;
        self.state = AutoPlayState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = AutoPlayState::Paused;
        self.elapsed = Duration::ZERO;
    }

    /// Advance by `delta` of wall time. Returns how many steps were taken.
    pub fn tick(&mut self, delta: Duration, navigator: &mut StepNavigator) -> usize {
        if !self.is_playing() {
            return 0;
        }
        self.elapsed += delta;
        let mut advanced = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            if !navigator.next() {
                break;
            }
            advanced += 1;
        }
        if navigator.at_end() {
            log::debug!("auto-play reached the last step");
            self.pause();
        }
        advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_clamps_to_range() {
        let mut nav = StepNavigator::new(2);
        assert!(!nav.previous());
        assert!(nav.next());
        assert!(nav.next());
        assert!(!nav.next());
        assert_eq!(nav.index(), 2);
        assert!(nav.jump_to(0));
        assert!(nav.jump_to(99));
        assert_eq!(nav.index(), 2);
        assert!(!nav.jump_to(2));
    }

    #[test]
    fn shrinking_step_count_reclamps_cursor() {
        let mut nav = StepNavigator::new(4);
        nav.jump_to(4);
        assert!(nav.set_step_count(2));
        assert_eq!(nav.index(), 2);
        assert!(!nav.set_step_count(5));
        assert_eq!(nav.index(), 2);
    }

    #[test]
    fn autoplay_advances_per_interval_and_stops_at_end() {
        let mut nav = StepNavigator::new(3);
        let mut autoplay = AutoPlay::new(Duration::from_millis(100));
        assert_eq!(autoplay.tick(Duration::from_millis(500), &mut nav), 0);

        autoplay.play(&mut nav);
        assert_eq!(autoplay.tick(Duration::from_millis(50), &mut nav), 0);
        assert_eq!(autoplay.tick(Duration::from_millis(60), &mut nav), 1);
        assert_eq!(nav.index(), 1);
        assert_eq!(autoplay.tick(Duration::from_millis(1000), &mut nav), 2);
        assert_eq!(nav.index(), 3);
        assert!(!autoplay.is_playing());
    }

    #[test]
    fn pause_is_idempotent_and_play_restarts_from_end() {
        let mut nav = StepNavigator::new(2);
        let mut autoplay = AutoPlay::new(Duration::from_millis(10));
        autoplay.pause();
        autoplay.pause();
        assert!(!autoplay.is_playing());

        nav.jump_to(2);
        autoplay.play(&mut nav);
        assert!(autoplay.is_playing());
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn play_without_steps_does_nothing() {
        let mut nav = StepNavigator::new(0);
        let mut autoplay = AutoPlay::new(Duration::from_millis(10));
        autoplay.play(&mut nav);
        assert!(!autoplay.is_playing());
    }
}
