use twostep_core::Side;

/// Screen geometry for the choice cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    /// Horizontal gap between a holding position and the window edge
    pub margin: f32,
    /// y of the holding row and of the win/lose overlay
    pub row_y: f32,
    /// y of the top anchor chosen cards travel to
    pub top_y: f32,
    /// Width used to centre the anchors
    pub reference_width: f32,
}

impl Layout {
    pub fn new(width: f32, height: f32, reference_width: f32) -> Self {
        Self {
            width,
            height,
            margin: 75.0,
            row_y: 200.0,
            top_y: 50.0,
            reference_width,
        }
    }

    /// Top-left corner of a card waiting to be chosen
    pub fn holding_position(&self, side: Side, card_width: f32) -> (f32, f32) {
        match side {
            Side::Left => (self.margin, self.row_y),
            Side::Right => (self.width - self.margin - card_width, self.row_y),
        }
    }

    pub fn top_anchor(&self) -> (f32, f32) {
        (self.centered_x(), self.top_y)
    }

    /// Where the win/lose overlay is drawn
    pub fn feedback_anchor(&self) -> (f32, f32) {
        (self.centered_x(), self.row_y)
    }

    fn centered_x(&self) -> f32 {
        self.width / 2.0 - self.reference_width / 2.0
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(640.0, 400.0, 128.0)
    }
}
