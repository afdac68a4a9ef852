use crate::card::{CardKey, CardSet, Side};
use crate::probs::RewardProbs;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a trial was thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No directional key was pressed in time
    Timeout,
    /// A key was pressed but never released in time
    InvalidInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Timeout => f.write_str("TIMEOUT"),
            SkipReason::InvalidInput => f.write_str("INVALID"),
        }
    }
}

/// Choices made during a completed trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialChoices {
    pub stage1_side: Side,
    pub stage1_card: CardKey,
    pub stage2_side: Side,
    pub stage2_card: CardKey,
    pub rewarded: bool,
}

/// How a trial ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    Completed(TrialChoices),
    /// Discarded; the session moves on to the next trial
    Skipped(SkipReason),
    /// Stop the whole session
    Quit,
}

/// Bernoulli draw for the chosen stage-2 card
pub fn draw_reward<R: Rng + ?Sized>(reward_prob: f64, rng: &mut R) -> bool {
    reward_prob > rng.random::<f64>()
}

/// One history row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// 1-based attempt number
    pub index: usize,
    pub stage1_choice: usize,
    pub stage1_card: String,
    pub stage2_choice: usize,
    pub stage2_card: String,
    pub rewarded: bool,
    pub reward_probs: RewardProbs,
}

impl TrialRecord {
    pub const HEADER: [&'static str; 10] = [
        "trial",
        "step1val",
        "step1choice",
        "step2val",
        "step2choice",
        "reward",
        "reward00",
        "reward01",
        "reward10",
        "reward11",
    ];

    pub fn new(index: usize, choices: &TrialChoices, cards: &CardSet) -> Self {
        Self {
            index,
            stage1_choice: choices.stage1_side.index(),
            stage1_card: cards.get(choices.stage1_card).name.clone(),
            stage2_choice: choices.stage2_side.index(),
            stage2_card: cards.get(choices.stage2_card).name.clone(),
            rewarded: choices.rewarded,
            reward_probs: cards.reward_probs(),
        }
    }

    /// Row values in [`TrialRecord::HEADER`] order
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.index.to_string(),
            self.stage1_choice.to_string(),
            self.stage1_card.clone(),
            self.stage2_choice.to_string(),
            self.stage2_card.clone(),
            if self.rewarded { "True" } else { "False" }.to_string(),
        ];
        fields.extend(self.reward_probs.flatten().iter().map(f64::to_string));
        fields
    }
}
