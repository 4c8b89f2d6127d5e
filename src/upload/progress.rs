//! Cosmetic upload progress.
//!
//! By the time this runs the file is already on the server. The bar is a pacing
//! device: one percent per tick, then processing starts. It is not wired to the
//! transport and must not be mistaken for real transfer progress.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const COMPLETE_TEXT: &str = "✅ Upload Complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressPhase {
    #[default]
    Idle,
    Running,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTick {
    Advanced(u8),
    Completed,
}

/// One run's counter. Reaching 100 is not completion; the tick after is.
#[derive(Debug, Default)]
pub struct ProgressMeter {
    percent: u8,
}

impl ProgressMeter {
    pub fn tick(&mut self) -> ProgressTick {
        if self.percent >= 100 {
            ProgressTick::Completed
        } else {
            self.percent += 1;
            ProgressTick::Advanced(self.percent)
        }
    }
}

/// What the progress panel draws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub visible: bool,
    pub percent: u8,
    pub status_text: String,
    pub phase: ProgressPhase,
    pub primary_active: bool,
    pub secondary_visible: bool,
}

impl ProgressState {
    pub fn fraction(&self) -> f32 {
        f32::from(self.percent) / 100.0
    }
}

pub struct ProgressSimulator {
    interval: Duration,
    state: ProgressState,
    run_id: u64,
    task: Option<JoinHandle<()>>,
}

impl ProgressSimulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ProgressState::default(),
            run_id: 0,
            task: None,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Shows the panel at 0% and binds the primary control. Nothing ticks yet.
    pub fn start(&mut self) {
        self.cancel_timer();
        self.state = ProgressState {
            visible: true,
            ..ProgressState::default()
        };
        info!("progress armed");
    }

    /// The primary control was pressed. Starts the timer once per run; returns
    /// the run id that ticks will be tagged with.
    pub fn activate<F>(&mut self, runtime: &Handle, on_tick: F) -> Option<u64>
    where
        F: Fn(u64, ProgressTick) + Send + 'static,
    {
        if !self.state.visible || self.state.phase != ProgressPhase::Idle {
            debug!(phase = ?self.state.phase, "ignoring progress activation");
            return None;
        }

        self.cancel_timer();
        self.run_id += 1;
        self.state.primary_active = true;
        self.state.secondary_visible = true;
        self.state.phase = ProgressPhase::Running;

        let run_id = self.run_id;
        let period = self.interval;
        self.task = Some(runtime.spawn(async move {
            let mut meter = ProgressMeter::default();
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let tick = meter.tick();
                on_tick(run_id, tick);
                if tick == ProgressTick::Completed {
                    break;
                }
            }
        }));

        info!(run_id, interval_ms = period.as_millis() as u64, "progress timer started");
        Some(run_id)
    }

    /// Folds a tick into the panel. Returns true exactly once per run, when the
    /// run completes and processing should begin.
    pub fn apply(&mut self, run_id: u64, tick: ProgressTick) -> bool {
        if run_id != self.run_id || self.state.phase != ProgressPhase::Running {
            debug!(run_id, current = self.run_id, "dropping stale progress tick");
            return false;
        }

        match tick {
            ProgressTick::Advanced(percent) => {
                if percent > self.state.percent {
                    self.state.percent = percent;
                }
                self.state.status_text = format!("{}% Uploading...", self.state.percent);
                false
            }
            ProgressTick::Completed => {
                self.task = None;
                self.state.phase = ProgressPhase::Complete;
                self.state.status_text = COMPLETE_TEXT.to_string();
                self.state.primary_active = false;
                info!(run_id, "progress complete");
                true
            }
        }
    }

    /// Hides the panel and stops any timer.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.state = ProgressState::default();
    }

    fn cancel_timer(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(run_id = self.run_id, "progress timer cancelled");
        }
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type TickLog = Arc<Mutex<Vec<(u64, ProgressTick)>>>;

    fn recorder() -> (TickLog, impl Fn(u64, ProgressTick) + Send + Clone + 'static) {
        let log: TickLog = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |run, tick| sink.lock().unwrap().push((run, tick)))
    }

    #[test]
    fn meter_counts_to_one_hundred_then_completes() {
        let mut meter = ProgressMeter::default();
        for expected in 1..=100u8 {
            assert_eq!(meter.tick(), ProgressTick::Advanced(expected));
        }
        assert_eq!(meter.tick(), ProgressTick::Completed);
        assert_eq!(meter.tick(), ProgressTick::Completed);
    }

    #[test]
    fn start_resets_panel() {
        let mut sim = ProgressSimulator::new(Duration::from_millis(50));
        sim.start();
        let state = sim.state();
        assert!(state.visible);
        assert_eq!(state.percent, 0);
        assert_eq!(state.status_text, "");
        assert_eq!(state.phase, ProgressPhase::Idle);
        assert!(!state.primary_active);
        assert!(!state.secondary_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn activation_is_required_before_anything_ticks() {
        let (log, sink) = recorder();
        let mut sim = ProgressSimulator::new(Duration::from_millis(50));

        assert_eq!(sim.activate(&Handle::current(), sink.clone()), None);

        sim.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(sim.activate(&Handle::current(), sink.clone()), Some(1));
        assert!(sim.state().primary_active);
        assert!(sim.state().secondary_visible);
        assert_eq!(sim.activate(&Handle::current(), sink), None);
    }

    #[tokio::test(start_paused = true)]
    async fn run_reaches_exactly_one_hundred_before_completing() {
        let (log, sink) = recorder();
        let mut sim = ProgressSimulator::new(Duration::from_millis(50));
        sim.start();
        let run = sim.activate(&Handle::current(), sink).unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;

        let ticks = log.lock().unwrap().clone();
        assert_eq!(ticks.len(), 101);
        let mut completions = 0;
        let mut last = 0u8;
        for (tick_run, tick) in ticks {
            assert_eq!(tick_run, run);
            let completed = sim.apply(tick_run, tick);
            match tick {
                ProgressTick::Advanced(p) => {
                    assert!(p >= last);
                    last = p;
                    assert!(!completed);
                }
                ProgressTick::Completed => {
                    assert_eq!(last, 100);
                    assert!(completed);
                    completions += 1;
                }
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(sim.state().percent, 100);
        assert_eq!(sim.state().phase, ProgressPhase::Complete);
        assert_eq!(sim.state().status_text, COMPLETE_TEXT);
        assert!(!sim.state().primary_active);
        assert!(!sim.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_cancels_the_previous_timer() {
        let (log, sink) = recorder();
        let mut sim = ProgressSimulator::new(Duration::from_millis(50));
        sim.start();
        let first = sim.activate(&Handle::current(), sink.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let seen_before_restart = log.lock().unwrap().len();
        assert!(seen_before_restart > 0 && seen_before_restart < 101);

        sim.start();
        let second = sim.activate(&Handle::current(), sink).unwrap();
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_secs(10)).await;

        let ticks = log.lock().unwrap().clone();
        assert!(ticks[seen_before_restart..]
            .iter()
            .all(|(run, _)| *run == second));
        assert!(!ticks
            .iter()
            .any(|(run, tick)| *run == first && *tick == ProgressTick::Completed));
        assert_eq!(ticks.len() - seen_before_restart, 101);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut sim = ProgressSimulator::new(Duration::from_secs(3600));
        sim.start();
        let run = sim.activate(rt.handle(), |_, _| {}).unwrap();

        assert!(!sim.apply(run + 7, ProgressTick::Completed));
        assert_eq!(sim.state().phase, ProgressPhase::Running);

        assert!(!sim.apply(run, ProgressTick::Advanced(3)));
        assert!(!sim.apply(run, ProgressTick::Advanced(2)));
        assert_eq!(sim.state().percent, 3);
        assert_eq!(sim.state().status_text, "3% Uploading...");
    }
}
