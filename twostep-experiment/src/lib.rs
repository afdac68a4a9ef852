pub mod animation;
pub mod choice;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod layout;
pub mod task;
pub mod trial;

pub use animation::{AnimationFrame, ChoiceAnimation};
pub use choice::{ChoicePoll, ChoiceWindow};
pub use config::{TaskConfig, load_generator_params};
pub use error::ExperimentError;
pub use history::{save_history, write_csv};
pub use input::{InputEvent, Key};
pub use layout::Layout;
pub use task::{FinishReason, Screen, TaskStatus, TwoStepTask};
pub use trial::{Overlay, Sprite, Stage, Transition, Trial, TrialPhase, TrialSetup, TrialView};
