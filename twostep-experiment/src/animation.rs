/// Positions and opacity for one animation frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub mover: (f32, f32),
    /// Opacity of the unchosen card, 1.0 opaque
    pub fader_alpha: f32,
}

/// Slides the chosen card to the top anchor while the other one fades out
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceAnimation {
    from: (f32, f32),
    to: (f32, f32),
    ticks: u32,
    tick: u32,
}

impl ChoiceAnimation {
    pub fn new(from: (f32, f32), to: (f32, f32), ticks: u32) -> Self {
        Self {
            from,
            to,
            ticks,
            tick: 0,
        }
    }

    /// Moves one tick forward; returns true once the last tick has been shown
    pub fn advance(&mut self) -> bool {
        if self.tick < self.ticks {
            self.tick += 1;
        }
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.ticks
    }

    pub fn progress(&self) -> f32 {
        if self.ticks == 0 {
            1.0
        } else {
            self.tick as f32 / self.ticks as f32
        }
    }

    pub fn frame(&self) -> AnimationFrame {
        let t = self.progress();
        AnimationFrame {
            mover: (
                self.from.0 + (self.to.0 - self.from.0) * t,
                self.from.1 + (self.to.1 - self.from.1) * t,
            ),
            fader_alpha: 1.0 - t,
        }
    }
}
