use crate::animation::ChoiceAnimation;
use crate::choice::{ChoicePoll, ChoiceWindow};
use crate::config::TaskConfig;
use crate::input::InputEvent;
use crate::layout::Layout;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};
use twostep_core::{
    draw_reward, CardKey, CardSet, Side, SkipReason, TrialChoices, TrialOutcome,
};

/// Which choice point a trial is at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    One,
    Two { context: usize },
}

impl Stage {
    fn number(self) -> u8 {
        match self {
            Stage::One => 1,
            Stage::Two { .. } => 2,
        }
    }
}

/// Card order on screen for one trial, left card first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSetup {
    pub stage1: [CardKey; 2],
    /// Indexed by stage-2 context
    pub stage2: [[CardKey; 2]; 2],
}

impl TrialSetup {
    /// Unshuffled order: index 0 on the left everywhere
    pub fn ordered() -> Self {
        Self {
            stage1: CardKey::STAGE1,
            stage2: [CardKey::stage2(0), CardKey::stage2(1)],
        }
    }

    /// Three independent coin flips: stage-1 order, then each context's order
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut setup = Self::ordered();
        if rng.random_range(0..2u8) == 1 {
            setup.stage1.swap(0, 1);
        }
        for pair in setup.stage2.iter_mut() {
            if rng.random_range(0..2u8) == 1 {
                pair.swap(0, 1);
            }
        }
        setup
    }

    pub fn pair(&self, stage: Stage) -> [CardKey; 2] {
        match stage {
            Stage::One => self.stage1,
            Stage::Two { context } => self.stage2[context],
        }
    }
}

/// Coarse position in the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Presenting(Stage),
    AwaitingChoice(Stage),
    Animating(Stage),
    Feedback { rewarded: bool },
    Pause(SkipReason),
    Done(TrialOutcome),
}

#[derive(Debug, Clone)]
enum State {
    Present(Stage),
    Await {
        stage: Stage,
        window: ChoiceWindow,
    },
    Animate {
        stage: Stage,
        chosen: Side,
        animation: ChoiceAnimation,
    },
    Feedback {
        until: Duration,
        choices: TrialChoices,
    },
    Pause {
        until: Duration,
        reason: SkipReason,
    },
    Done(TrialOutcome),
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Running,
    Finished(TrialOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub card: CardKey,
    pub position: (f32, f32),
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Winner,
    Loser,
}

/// What the trial wants on screen, drawn in order over the background
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialView {
    pub sprites: Vec<Sprite>,
    pub overlay: Option<(Overlay, (f32, f32))>,
}

/// One run of stage-1 choice, transition, stage-2 choice and reward.
///
/// Driven by [`Trial::step`] with the current time and at most one input
/// event. A step without an event is a display frame tick.
#[derive(Debug, Clone)]
pub struct Trial {
    setup: TrialSetup,
    cards: CardSet,
    layout: Layout,
    step2flip: f64,
    step1_timeout: Duration,
    step2_timeout: Duration,
    animation_ticks: u32,
    feedback_duration: Duration,
    skip_pause: Duration,
    state: State,
    stage1: Option<(Side, CardKey)>,
    stage2: Option<(Side, CardKey)>,
}

impl Trial {
    pub fn new(
        setup: TrialSetup,
        cards: CardSet,
        layout: Layout,
        step2flip: f64,
        config: &TaskConfig,
    ) -> Self {
        Self {
            setup,
            cards,
            layout,
            step2flip,
            step1_timeout: config.step1_timeout,
            step2_timeout: config.step2_timeout,
            animation_ticks: config.animation_ticks,
            feedback_duration: config.feedback_duration,
            skip_pause: config.skip_pause,
            state: State::Present(Stage::One),
            stage1: None,
            stage2: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        match &self.state {
            State::Present(stage) => TrialPhase::Presenting(*stage),
            State::Await { stage, .. } => TrialPhase::AwaitingChoice(*stage),
            State::Animate { stage, .. } => TrialPhase::Animating(*stage),
            State::Feedback { choices, .. } => TrialPhase::Feedback {
                rewarded: choices.rewarded,
            },
            State::Pause { reason, .. } => TrialPhase::Pause(*reason),
            State::Done(outcome) => TrialPhase::Done(*outcome),
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        event: Option<InputEvent>,
        rng: &mut R,
    ) -> Transition {
        if event == Some(InputEvent::Quit) {
            debug!("quit requested mid-trial");
            self.state = State::Done(TrialOutcome::Quit);
        }

        loop {
            match &mut self.state {
                State::Present(stage) => {
                    // keys pressed before the cards are up never reach the window
                    if event.is_some() {
                        return Transition::Running;
                    }
                    let stage = *stage;
                    let timeout = match stage {
                        Stage::One => self.step1_timeout,
                        Stage::Two { .. } => self.step2_timeout,
                    };
                    debug!(stage = stage.number(), "presenting choice");
                    self.state = State::Await {
                        stage,
                        window: ChoiceWindow::open(now, timeout),
                    };
                    return Transition::Running;
                }
                State::Await { stage, window } => {
                    let stage = *stage;
                    match window.poll(now, event) {
                        ChoicePoll::Waiting => return Transition::Running,
                        ChoicePoll::Quit => self.state = State::Done(TrialOutcome::Quit),
                        ChoicePoll::Expired(reason) => {
                            info!("STEP {} {}", stage.number(), reason);
                            self.state = State::Pause {
                                until: now + self.skip_pause,
                                reason,
                            };
                        }
                        ChoicePoll::Chosen(side) => self.choose(stage, side),
                    }
                    return self.transition();
                }
                State::Animate { stage, animation, .. } => {
                    if event.is_some() || !animation.advance() {
                        return Transition::Running;
                    }
                    let stage = *stage;
                    match stage {
                        Stage::One => self.enter_stage_two(rng),
                        Stage::Two { .. } => self.resolve_reward(now, rng),
                    }
                    return self.transition();
                }
                State::Feedback { until, choices } => {
                    if now < *until {
                        return Transition::Running;
                    }
                    let choices = *choices;
                    self.state = State::Done(TrialOutcome::Completed(choices));
                }
                State::Pause { until, reason } => {
                    if now < *until {
                        return Transition::Running;
                    }
                    let reason = *reason;
                    self.state = State::Done(TrialOutcome::Skipped(reason));
                }
                State::Done(outcome) => return Transition::Finished(*outcome),
            }
        }
    }

    fn transition(&self) -> Transition {
        match self.state {
            State::Done(outcome) => Transition::Finished(outcome),
            _ => Transition::Running,
        }
    }

    fn choose(&mut self, stage: Stage, side: Side) {
        let card = self.setup.pair(stage)[side.index()];
        debug!(stage = stage.number(), ?side, card = %card, "choice made");
        match stage {
            Stage::One => self.stage1 = Some((side, card)),
            Stage::Two { .. } => self.stage2 = Some((side, card)),
        }
        let from = self
            .layout
            .holding_position(side, self.cards.get(card).size.0);
        self.state = State::Animate {
            stage,
            chosen: side,
            animation: ChoiceAnimation::new(from, self.layout.top_anchor(), self.animation_ticks),
        };
    }

    fn enter_stage_two<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some((side, _)) = self.stage1 else {
            return;
        };
        let mut context = side.index();
        if rng.random::<f64>() < self.step2flip {
            context = 1 - context;
        }
        debug!(context, "stage-2 context");
        self.state = State::Present(Stage::Two { context });
    }

    fn resolve_reward<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) {
        let (Some((stage1_side, stage1_card)), Some((stage2_side, stage2_card))) =
            (self.stage1, self.stage2)
        else {
            return;
        };
        let rewarded = draw_reward(self.cards.get(stage2_card).reward_prob, rng);
        debug!(rewarded, "reward resolved");
        self.state = State::Feedback {
            until: now + self.feedback_duration,
            choices: TrialChoices {
                stage1_side,
                stage1_card,
                stage2_side,
                stage2_card,
                rewarded,
            },
        };
    }

    /// Sprites and overlay for the current state
    pub fn view(&self) -> TrialView {
        let mut view = TrialView::default();
        match &self.state {
            State::Present(stage) | State::Await { stage, .. } => {
                self.push_stage1_header(*stage, &mut view);
                for (i, card) in self.setup.pair(*stage).into_iter().enumerate() {
                    view.sprites.push(self.held_sprite(card, i, 1.0));
                }
            }
            State::Animate {
                stage,
                chosen,
                animation,
            } => {
                self.push_stage1_header(*stage, &mut view);
                let pair = self.setup.pair(*stage);
                let frame = animation.frame();
                let other = chosen.other();
                view.sprites
                    .push(self.held_sprite(pair[other.index()], other.index(), frame.fader_alpha));
                view.sprites.push(Sprite {
                    card: pair[chosen.index()],
                    position: frame.mover,
                    alpha: 1.0,
                });
            }
            State::Feedback { choices, .. } => {
                view.sprites.push(Sprite {
                    card: choices.stage2_card,
                    position: self.layout.top_anchor(),
                    alpha: 1.0,
                });
                let overlay = if choices.rewarded {
                    Overlay::Winner
                } else {
                    Overlay::Loser
                };
                view.overlay = Some((overlay, self.layout.feedback_anchor()));
            }
            State::Pause { .. } | State::Done(_) => {}
        }
        view
    }

    fn push_stage1_header(&self, stage: Stage, view: &mut TrialView) {
        if let (Stage::Two { .. }, Some((_, card))) = (stage, self.stage1) {
            view.sprites.push(Sprite {
                card,
                position: self.layout.top_anchor(),
                alpha: 1.0,
            });
        }
    }

    fn held_sprite(&self, card: CardKey, slot: usize, alpha: f32) -> Sprite {
        let side = if slot == 0 { Side::Left } else { Side::Right };
        Sprite {
            card,
            position: self.layout.holding_position(side, self.cards.get(card).size.0),
            alpha,
        }
    }
}
