use crate::input::InputEvent;
use std::time::Duration;
use twostep_core::{Side, SkipReason};

/// Result of feeding the window one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoicePoll {
    Waiting,
    Chosen(Side),
    Expired(SkipReason),
    Quit,
}

/// Timed wait for a press-then-release of one directional key.
///
/// The first directional key-down is latched; the choice is made when that
/// same key is released. Other keys, and releases that do not match the
/// latched key, are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceWindow {
    opened_at: Duration,
    timeout: Duration,
    pressed: Option<Side>,
}

impl ChoiceWindow {
    pub fn open(now: Duration, timeout: Duration) -> Self {
        Self {
            opened_at: now,
            timeout,
            pressed: None,
        }
    }

    pub fn poll(&mut self, now: Duration, event: Option<InputEvent>) -> ChoicePoll {
        if event == Some(InputEvent::Quit) {
            return ChoicePoll::Quit;
        }
        if now.saturating_sub(self.opened_at) > self.timeout {
            let reason = match self.pressed {
                Some(_) => SkipReason::InvalidInput,
                None => SkipReason::Timeout,
            };
            return ChoicePoll::Expired(reason);
        }
        match event {
            Some(InputEvent::KeyDown(key)) => {
                if self.pressed.is_none() {
                    self.pressed = key.side();
                }
                ChoicePoll::Waiting
            }
            Some(InputEvent::KeyUp(key)) => match (key.side(), self.pressed) {
                (Some(released), Some(pressed)) if released == pressed => {
                    ChoicePoll::Chosen(released)
                }
                _ => ChoicePoll::Waiting,
            },
            _ => ChoicePoll::Waiting,
        }
    }

    pub fn pressed(&self) -> Option<Side> {
        self.pressed
    }
}
