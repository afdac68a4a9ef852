use twostep_core::Side;

/// Keys the task distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Other,
}

impl Key {
    /// Side selected by a directional key
    pub fn side(self) -> Option<Side> {
        match self {
            Key::Left => Some(Side::Left),
            Key::Right => Some(Side::Right),
            Key::Other => None,
        }
    }
}

/// Input delivered to the task by the display front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Window closed or the operator asked to stop
    Quit,
}
