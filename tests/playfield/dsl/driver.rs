//! Test playfield driver implementation

use gametime::{TimeSpan, TimeStamp};
use playfield_rs::prelude::*;

use super::time_step::{TimeStep, TimeStepBuilder};

/// Drives a playfield frame by frame with a wall clock starting at [`TimeStamp::start`].
///
/// Every step advances the clock, updates the playfield with the resulting song time, runs the
/// step's input actions and finally checks the step's assertions.
pub struct TestPlayfieldDriver {
    manager: Option<HitObjectManager>,
    start_time: Option<TimeStamp>,
    pub(crate) time_steps: Vec<TimeStep>,
}

impl TestPlayfieldDriver {
    /// Creates a new test driver
    pub const fn new(manager: HitObjectManager) -> Self {
        Self {
            manager: Some(manager),
            start_time: None,
            time_steps: Vec::new(),
        }
    }

    /// Sets the wall clock time the song starts at
    #[must_use]
    pub const fn start_at(mut self, time: TimeStamp) -> Self {
        self.start_time = Some(time);
        self
    }

    /// Advances time by `duration` and starts a new step
    pub fn past(&mut self, duration: TimeSpan) -> TimeStepBuilder<'_> {
        self.time_steps.push(TimeStep::new(duration));
        TimeStepBuilder::new(self)
    }

    /// Convenience method: advance by specified milliseconds
    pub fn past_ms(&mut self, millis: i64) -> TimeStepBuilder<'_> {
        self.past(TimeSpan::MILLISECOND * millis)
    }

    /// Checks the playfield without advancing time
    #[must_use]
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&HitObjectManager) + 'static,
    {
        let _ = self.past(TimeSpan::ZERO).view(check);
        self
    }

    /// Runs the test
    ///
    /// # Panics
    ///
    /// Panics if any assertion fails.
    pub fn run(mut self) {
        self.run_mut();
    }

    pub(crate) fn run_mut(&mut self) {
        let mut manager = self.manager.take().expect("manager not set");
        let start_time = self.start_time.unwrap_or_else(TimeStamp::start);
        let mut clock = SongClock::new();
        clock.start_play(start_time);

        let mut now = start_time;
        for step in &mut self.time_steps {
            now = now + step.duration;
            let mut song_time = clock.song_time_ms(now);
            if let Some(target) = step.seek.take() {
                clock.seek(now, target);
                manager.handle_skip(target);
                song_time = target;
            }

            let mut transitions: Vec<_> = manager.update(song_time).collect();
            for action in std::mem::take(&mut step.input_actions) {
                transitions.extend(action(&mut manager));
            }

            for assertion in &step.state_assertions {
                assertion(&manager);
            }
            for assertion in &step.transition_assertions {
                assertion(&transitions);
            }
        }
    }
}
