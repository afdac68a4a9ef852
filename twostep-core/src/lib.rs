pub mod card;
pub mod error;
pub mod generator;
pub mod probs;
pub mod trial;

pub use card::{CardKey, CardSet, ChoiceCard, Side};
pub use error::GeneratorError;
pub use generator::{
    reflect, Blocked, Brownian, Generator, GeneratorConfig, GeneratorParams, RewardGenerator,
};
pub use probs::RewardProbs;
pub use trial::{draw_reward, SkipReason, TrialChoices, TrialOutcome, TrialRecord};
