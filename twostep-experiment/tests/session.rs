use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;
use twostep_core::{Generator, GeneratorParams, RewardGenerator};
use twostep_experiment::{
    FinishReason, InputEvent, Key, Layout, Screen, Stage, TaskConfig, TaskStatus, TrialPhase,
    TwoStepTask,
};

const FRAME: Duration = Duration::from_millis(16);

/// Every uniform draw is 0.0, so any positive reward probability pays out
struct Floor;

impl RngCore for Floor {
    fn next_u32(&mut self) -> u32 {
        0
    }
    fn next_u64(&mut self) -> u64 {
        0
    }
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0);
    }
}

fn quick_config(n_trials: usize) -> TaskConfig {
    TaskConfig {
        n_trials,
        startup_black: Duration::ZERO,
        lead_in: Duration::ZERO,
        skip_pause: Duration::from_millis(50),
        feedback_duration: Duration::from_millis(50),
        animation_ticks: 5,
        ..TaskConfig::default()
    }
}

struct Session<R: RngCore> {
    task: TwoStepTask<Generator, R>,
    now: Duration,
    status: TaskStatus,
}

impl<R: RngCore> Session<R> {
    fn new(config: TaskConfig, params: GeneratorParams, rng: R) -> Self {
        let generator = params.build().unwrap();
        let task = TwoStepTask::new(config, generator, rng, Layout::default(), |_| (128.0, 96.0));
        Self {
            task,
            now: Duration::ZERO,
            status: TaskStatus::Running,
        }
    }

    fn frame(&mut self) {
        self.now += FRAME;
        self.status = self.task.step(self.now, None);
    }

    fn send(&mut self, event: InputEvent) {
        self.status = self.task.step(self.now, Some(event));
    }

    /// Waits for the next choice point and picks `key`
    fn choose(&mut self, key: Key) {
        for _ in 0..10_000 {
            if matches!(self.status, TaskStatus::Finished(_)) {
                return;
            }
            if matches!(
                self.task.trial_phase(),
                Some(TrialPhase::AwaitingChoice(_))
            ) {
                self.send(InputEvent::KeyDown(key));
                self.send(InputEvent::KeyUp(key));
                return;
            }
            self.frame();
        }
        panic!("no choice point reached");
    }

    fn run_out(&mut self) -> FinishReason {
        for _ in 0..100_000 {
            if let TaskStatus::Finished(reason) = self.status {
                return reason;
            }
            self.frame();
        }
        panic!("session never finished");
    }
}

#[test]
fn single_blocked_trial_rewarded_with_unchanged_probabilities() {
    let params = GeneratorParams::Blocked {
        step2flip: 0.2,
        bounds: [0.2, 0.8],
        block_length: 10,
    };
    let mut session = Session::new(quick_config(1), params, Floor);
    let initial = session.task.reward_probs();

    session.choose(Key::Left);
    session.choose(Key::Left);
    assert_eq!(session.run_out(), FinishReason::Completed);

    let history = session.task.history();
    assert_eq!(history.len(), 1);
    let record = &history[0];
    assert_eq!(record.index, 1);
    assert_eq!(record.stage1_choice, 0);
    assert_eq!(record.stage2_choice, 0);
    assert!(record.rewarded);
    assert_eq!(record.reward_probs, initial);
    assert_eq!(session.task.reward_probs(), initial);
    assert_eq!(session.task.total_reward(), 20.0);
}

#[test]
fn timeouts_leave_no_rows_and_freeze_probabilities() {
    let mut session = Session::new(
        quick_config(3),
        GeneratorParams::brownian_preset(),
        StdRng::seed_from_u64(5),
    );
    let initial = session.task.reward_probs();

    assert_eq!(session.run_out(), FinishReason::Completed);
    assert!(session.task.history().is_empty());
    assert_eq!(session.task.attempts(), 3);
    assert_eq!(session.task.reward_probs(), initial);
}

#[test]
fn skipped_attempts_keep_their_index() {
    let mut session = Session::new(
        quick_config(3),
        GeneratorParams::blocked_preset(),
        StdRng::seed_from_u64(9),
    );

    // first attempt times out
    while session.task.attempts() == 0 {
        session.frame();
    }
    session.choose(Key::Right);
    session.choose(Key::Left);
    session.choose(Key::Left);
    session.choose(Key::Right);
    assert_eq!(session.run_out(), FinishReason::Completed);

    let indices: Vec<usize> = session.task.history().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![2, 3]);
    assert!(session.task.history().len() < 3);
}

#[test]
fn probabilities_advance_after_each_completed_trial() {
    let params = GeneratorParams::Blocked {
        step2flip: 0.2,
        bounds: [0.2, 0.8],
        block_length: 1,
    };
    let mut session = Session::new(quick_config(2), params, StdRng::seed_from_u64(1));
    let initial = session.task.reward_probs();

    session.choose(Key::Left);
    session.choose(Key::Right);
    while session.task.history().len() < 1 {
        session.frame();
    }
    let flipped = session.task.reward_probs();
    assert_eq!(session.task.history()[0].reward_probs, initial);
    for (before, after) in initial.iter().zip(flipped.iter()) {
        assert_ne!(before, after);
    }

    session.choose(Key::Left);
    session.choose(Key::Left);
    session.run_out();
    assert_eq!(session.task.history()[1].reward_probs, flipped);
    assert_eq!(session.task.reward_probs(), initial);
}

#[test]
fn quit_stops_the_session_and_keeps_history() {
    let mut session = Session::new(
        quick_config(5),
        GeneratorParams::brownian_preset(),
        StdRng::seed_from_u64(2),
    );
    session.choose(Key::Left);
    session.choose(Key::Right);
    while session.task.history().is_empty() {
        session.frame();
    }
    session.choose(Key::Right);
    session.send(InputEvent::Quit);

    assert_eq!(session.status, TaskStatus::Finished(FinishReason::Quit));
    assert_eq!(session.task.history().len(), 1);
    session.frame();
    assert_eq!(session.status, TaskStatus::Finished(FinishReason::Quit));
}

#[test]
fn quit_before_first_trial() {
    let config = TaskConfig {
        startup_black: Duration::from_secs(1),
        ..quick_config(5)
    };
    let mut session = Session::new(config, GeneratorParams::blocked_preset(), Floor);
    session.frame();
    assert_eq!(session.task.screen(), Screen::Black);
    session.send(InputEvent::Quit);
    assert_eq!(session.status, TaskStatus::Finished(FinishReason::Quit));
    assert!(session.task.history().is_empty());
}

#[test]
fn screens_follow_session_phases() {
    let config = TaskConfig {
        startup_black: Duration::from_millis(100),
        lead_in: Duration::from_millis(100),
        ..quick_config(1)
    };
    let mut session = Session::new(config, GeneratorParams::blocked_preset(), Floor);
    session.frame();
    assert_eq!(session.task.screen(), Screen::Black);
    while session.task.screen() == Screen::Black {
        session.frame();
    }
    assert_eq!(session.task.screen(), Screen::Blank);
    while session.task.trial_phase().is_none() {
        session.frame();
    }
    let Screen::Trial(view) = session.task.screen() else {
        panic!("expected a trial on screen");
    };
    assert_eq!(view.sprites.len(), 2);
    assert_eq!(
        session.task.trial_phase(),
        Some(TrialPhase::AwaitingChoice(Stage::One))
    );
}

#[test]
fn history_never_exceeds_trial_count() {
    let generator = GeneratorParams::brownian_preset().build().unwrap();
    assert_eq!(generator.step2flip(), 0.3);
    let mut session = Session::new(
        quick_config(4),
        GeneratorParams::brownian_preset(),
        StdRng::seed_from_u64(77),
    );
    for _ in 0..6 {
        session.choose(Key::Left);
        session.choose(Key::Right);
        if matches!(session.status, TaskStatus::Finished(_)) {
            break;
        }
    }
    session.run_out();
    assert!(session.task.history().len() <= 4);
}

/// Shared buffer a fmt subscriber writes into
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn discarded_trials_are_silent_at_warn_level() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut session = Session::new(quick_config(2), GeneratorParams::blocked_preset(), Floor);
        assert_eq!(session.run_out(), FinishReason::Completed);
        assert_eq!(session.task.attempts(), 2);
        assert!(session.task.history().is_empty());
    });

    let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(out.is_empty(), "unexpected output: {out}");
}
