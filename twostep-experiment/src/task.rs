use crate::config::TaskConfig;
use crate::input::InputEvent;
use crate::layout::Layout;
use crate::trial::{Transition, Trial, TrialPhase, TrialSetup, TrialView};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};
use twostep_core::{CardKey, CardSet, RewardGenerator, RewardProbs, TrialOutcome, TrialRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every trial attempt was used
    Completed,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Finished(FinishReason),
}

/// What the display should show
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Black,
    Blank,
    Trial(TrialView),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionPhase {
    Startup,
    LeadIn { until: Duration },
    Running,
    Finished(FinishReason),
}

/// Runs a whole two-step session: owns the cards, the reward generator,
/// the random source and the history.
pub struct TwoStepTask<G, R>
where
    G: RewardGenerator,
    R: Rng,
{
    config: TaskConfig,
    generator: G,
    rng: R,
    cards: CardSet,
    layout: Layout,
    phase: SessionPhase,
    started_at: Option<Duration>,
    current: Option<Trial>,
    /// 0-based index of the attempt in progress
    attempt: usize,
    history: Vec<TrialRecord>,
    total_reward: f64,
}

impl<G, R> TwoStepTask<G, R>
where
    G: RewardGenerator,
    R: Rng,
{
    pub fn new<F>(config: TaskConfig, generator: G, mut rng: R, layout: Layout, card_size: F) -> Self
    where
        F: FnMut(CardKey) -> (f32, f32),
    {
        let probs = generator.initial_probs(&mut rng);
        info!(?probs, "initial reward probabilities");
        Self {
            config,
            generator,
            rng,
            cards: CardSet::new(probs, card_size),
            layout,
            phase: SessionPhase::Startup,
            started_at: None,
            current: None,
            attempt: 0,
            history: Vec::new(),
            total_reward: 0.0,
        }
    }

    /// Advances the session to `now`, delivering at most one input event.
    /// Call with `None` once per display frame.
    pub fn step(&mut self, now: Duration, event: Option<InputEvent>) -> TaskStatus {
        if event == Some(InputEvent::Quit) && self.current.is_none() {
            self.finish(FinishReason::Quit);
        }

        loop {
            match self.phase {
                SessionPhase::Startup => {
                    let started = *self.started_at.get_or_insert(now);
                    if now.saturating_sub(started) < self.config.startup_black {
                        return TaskStatus::Running;
                    }
                    self.phase = SessionPhase::LeadIn {
                        until: now + self.config.lead_in,
                    };
                }
                SessionPhase::LeadIn { until } => {
                    if now < until {
                        return TaskStatus::Running;
                    }
                    self.phase = SessionPhase::Running;
                    if self.attempt >= self.config.n_trials {
                        self.finish(FinishReason::Completed);
                    }
                }
                SessionPhase::Running => {
                    let mut trial = match self.current.take() {
                        Some(trial) => trial,
                        None => self.start_trial(),
                    };
                    match trial.step(now, event, &mut self.rng) {
                        Transition::Running => {
                            self.current = Some(trial);
                            return TaskStatus::Running;
                        }
                        Transition::Finished(outcome) => {
                            self.finish_trial(outcome);
                            return self.status();
                        }
                    }
                }
                SessionPhase::Finished(reason) => return TaskStatus::Finished(reason),
            }
        }
    }

    fn start_trial(&mut self) -> Trial {
        info!("Trial {}:", self.attempt + 1);
        let setup = TrialSetup::shuffled(&mut self.rng);
        debug!(?setup, "trial setup");
        Trial::new(
            setup,
            self.cards.clone(),
            self.layout,
            self.generator.step2flip(),
            &self.config,
        )
    }

    fn finish_trial(&mut self, outcome: TrialOutcome) {
        match outcome {
            TrialOutcome::Quit => {
                self.finish(FinishReason::Quit);
                return;
            }
            TrialOutcome::Skipped(reason) => {
                info!(attempt = self.attempt + 1, %reason, "trial discarded");
            }
            TrialOutcome::Completed(choices) => {
                let reward = if choices.rewarded {
                    self.config.reward_amount
                } else {
                    0.0
                };
                self.total_reward += reward;
                info!(
                    "REWARD: ${:.2}, AVG: ${:.2}, TOTAL: ${:.2}",
                    reward,
                    self.total_reward / (self.attempt + 1) as f64,
                    self.total_reward,
                );
                self.history
                    .push(TrialRecord::new(self.attempt + 1, &choices, &self.cards));
                let next = self
                    .generator
                    .advance(&self.cards.reward_probs(), self.attempt, &mut self.rng);
                debug!(?next, "reward probabilities advanced");
                self.cards = self.cards.with_reward_probs(next);
            }
        }
        self.attempt += 1;
        if self.attempt >= self.config.n_trials {
            self.finish(FinishReason::Completed);
        }
    }

    fn finish(&mut self, reason: FinishReason) {
        if matches!(self.phase, SessionPhase::Finished(_)) {
            return;
        }
        self.current = None;
        self.phase = SessionPhase::Finished(reason);
        info!(
            ?reason,
            completed = self.history.len(),
            attempts = self.attempt,
            total = self.total_reward,
            "session finished"
        );
    }

    pub fn status(&self) -> TaskStatus {
        match self.phase {
            SessionPhase::Finished(reason) => TaskStatus::Finished(reason),
            _ => TaskStatus::Running,
        }
    }

    pub fn screen(&self) -> Screen {
        match self.phase {
            SessionPhase::Startup => Screen::Black,
            SessionPhase::Running => match &self.current {
                Some(trial) => Screen::Trial(trial.view()),
                None => Screen::Blank,
            },
            SessionPhase::LeadIn { .. } | SessionPhase::Finished(_) => Screen::Blank,
        }
    }

    pub fn trial_phase(&self) -> Option<TrialPhase> {
        self.current.as_ref().map(Trial::phase)
    }

    /// Takes effect from the next trial
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn history(&self) -> &[TrialRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<TrialRecord> {
        self.history
    }

    pub fn reward_probs(&self) -> RewardProbs {
        self.cards.reward_probs()
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Attempts finished so far, skipped ones included
    pub fn attempts(&self) -> usize {
        self.attempt
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }
}
