use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::collections::HashMap;
use std::path::Path;
use tiny_skia::{ColorU8, Pixmap};
use twostep_core::CardKey;

/// Images are drawn at half their file resolution
pub const IMAGE_SCALE: f32 = 0.5;

/// Card artwork and the win/lose overlays, decoded once at startup
pub struct Assets {
    cards: HashMap<CardKey, Pixmap>,
    pub winner: Pixmap,
    pub loser: Pixmap,
}

impl Assets {
    pub fn load(dir: &Path, scale: f32) -> Result<Self> {
        let mut cards = HashMap::with_capacity(CardKey::ALL.len());
        for key in CardKey::ALL {
            let pixmap = load_scaled(&dir.join(key.image_file()), scale)?;
            cards.insert(key, pixmap);
        }
        Ok(Self {
            cards,
            winner: load_scaled(&dir.join("Winner.png"), scale)?,
            loser: load_scaled(&dir.join("Loser.png"), scale)?,
        })
    }

    pub fn from_parts(cards: HashMap<CardKey, Pixmap>, winner: Pixmap, loser: Pixmap) -> Self {
        Self {
            cards,
            winner,
            loser,
        }
    }

    pub fn card(&self, key: CardKey) -> Option<&Pixmap> {
        self.cards.get(&key)
    }

    pub fn card_size(&self, key: CardKey) -> (f32, f32) {
        self.card(key)
            .map(|p| (p.width() as f32, p.height() as f32))
            .unwrap_or((0.0, 0.0))
    }

    /// Width the screen anchors are centred on
    pub fn reference_width(&self) -> f32 {
        self.card_size(CardKey::Stage1(0)).0
    }
}

fn load_scaled(path: &Path, scale: f32) -> Result<Pixmap> {
    let img = image::open(path)
        .with_context(|| format!("cannot load image {}", path.display()))?
        .into_rgba8();
    let (w, h) = img.dimensions();
    let sw = ((w as f32 * scale).round() as u32).max(1);
    let sh = ((h as f32 * scale).round() as u32).max(1);
    let scaled = image::imageops::resize(&img, sw, sh, FilterType::Triangle);

    let mut pixmap = Pixmap::new(sw, sh)
        .ok_or_else(|| anyhow::anyhow!("invalid image size {sw}×{sh} for {}", path.display()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(scaled.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    tracing::debug!(path = %path.display(), width = sw, height = sh, "image loaded");
    Ok(pixmap)
}
