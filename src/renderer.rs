use crate::assets::Assets;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};
use twostep_experiment::{Overlay, Screen, TrialView};

/// Draws task screens onto a tiny-skia canvas
pub struct ExperimentRenderer {
    assets: Assets,
    background: Color,
}

impl ExperimentRenderer {
    pub fn new(assets: Assets) -> Self {
        Self {
            assets,
            background: Color::from_rgba8(190, 190, 190, 255),
        }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn render_frame(&self, canvas: &mut Pixmap, screen: &Screen) {
        match screen {
            Screen::Black => canvas.fill(Color::BLACK),
            Screen::Blank => canvas.fill(self.background),
            Screen::Trial(view) => {
                canvas.fill(self.background);
                self.render_trial(canvas, view);
            }
        }
    }

    fn render_trial(&self, canvas: &mut Pixmap, view: &TrialView) {
        for sprite in &view.sprites {
            if let Some(image) = self.assets.card(sprite.card) {
                blit(canvas, image, sprite.position, sprite.alpha);
            }
        }
        if let Some((overlay, position)) = view.overlay {
            let image = match overlay {
                Overlay::Winner => &self.assets.winner,
                Overlay::Loser => &self.assets.loser,
            };
            blit(canvas, image, position, 1.0);
        }
    }
}

fn blit(canvas: &mut Pixmap, image: &Pixmap, (x, y): (f32, f32), alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let paint = PixmapPaint {
        opacity: alpha.min(1.0),
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(
        x.round() as i32,
        y.round() as i32,
        image.as_ref(),
        &paint,
        Transform::identity(),
        None,
    );
}
