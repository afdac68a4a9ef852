use crate::error::GeneratorError;
use crate::probs::RewardProbs;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Produces stage-2 reward probabilities trial after trial
pub trait RewardGenerator {
    fn config(&self) -> &GeneratorConfig;

    /// Starting probabilities for the four stage-2 cards
    fn initial_probs<R: Rng + ?Sized>(&self, rng: &mut R) -> RewardProbs;

    /// Next value of a single card given its previous value and the 0-based
    /// trial index.
    fn next<R: Rng + ?Sized>(&self, prev: f64, trial_index: usize, rng: &mut R) -> f64;

    /// Probability of routing to the less likely stage-2 context
    fn step2flip(&self) -> f64 {
        self.config().step2flip
    }

    fn advance<R: Rng + ?Sized>(
        &self,
        probs: &RewardProbs,
        trial_index: usize,
        rng: &mut R,
    ) -> RewardProbs {
        probs.map(|prev| self.next(prev, trial_index, rng))
    }
}

/// Settings shared by every generator variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    pub step2flip: f64,
    pub lower: f64,
    pub upper: f64,
}

impl GeneratorConfig {
    pub fn new(step2flip: f64, bounds: [f64; 2]) -> Result<Self, GeneratorError> {
        let [lower, upper] = bounds;
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
            return Err(GeneratorError::InvalidBounds { lower, upper });
        }
        if !(0.0..=1.0).contains(&step2flip) {
            return Err(GeneratorError::InvalidStep2Flip(step2flip));
        }
        Ok(Self {
            step2flip,
            lower,
            upper,
        })
    }
}

/// Mirrors a value that left `[lower, upper]` back inside. Single pass: a
/// step larger than the interval width can still land outside.
pub fn reflect(value: f64, lower: f64, upper: f64) -> f64 {
    if value > upper {
        upper - (value - upper)
    } else if value < lower {
        lower + (lower - value)
    } else {
        value
    }
}

/// Gaussian random walk reflected at the bounds
#[derive(Debug, Clone)]
pub struct Brownian {
    config: GeneratorConfig,
    drift: Normal<f64>,
}

impl Brownian {
    pub fn new(config: GeneratorConfig, loc: f64, scale: f64) -> Result<Self, GeneratorError> {
        if !loc.is_finite() {
            return Err(GeneratorError::InvalidLoc(loc));
        }
        if !scale.is_finite() || scale < 0.0 {
            return Err(GeneratorError::InvalidScale(scale));
        }
        let drift = Normal::new(loc, scale).map_err(|_| GeneratorError::InvalidScale(scale))?;
        Ok(Self { config, drift })
    }
}

impl RewardGenerator for Brownian {
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn initial_probs<R: Rng + ?Sized>(&self, rng: &mut R) -> RewardProbs {
        let GeneratorConfig { lower, upper, .. } = self.config;
        RewardProbs::new([[0.0; 2]; 2]).map(|_| lower + rng.random::<f64>() * (upper - lower))
    }

    fn next<R: Rng + ?Sized>(&self, prev: f64, _trial_index: usize, rng: &mut R) -> f64 {
        let stepped = prev + self.drift.sample(rng);
        reflect(stepped, self.config.lower, self.config.upper)
    }
}

/// Alternates each card between the two bounds every `block_length` trials
#[derive(Debug, Clone)]
pub struct Blocked {
    config: GeneratorConfig,
    block_length: usize,
}

impl Blocked {
    pub fn new(config: GeneratorConfig, block_length: usize) -> Result<Self, GeneratorError> {
        if block_length == 0 {
            return Err(GeneratorError::ZeroBlockLength);
        }
        Ok(Self {
            config,
            block_length,
        })
    }

    pub fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn is_block_boundary(&self, trial_index: usize) -> bool {
        (trial_index + 1) % self.block_length == 0
    }
}

impl RewardGenerator for Blocked {
    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn initial_probs<R: Rng + ?Sized>(&self, rng: &mut R) -> RewardProbs {
        let high = rng.random_range(0..2usize);
        let mut row = [self.config.lower; 2];
        row[high] = self.config.upper;
        RewardProbs::new([row, row])
    }

    fn next<R: Rng + ?Sized>(&self, prev: f64, trial_index: usize, _rng: &mut R) -> f64 {
        if !self.is_block_boundary(trial_index) {
            return prev;
        }
        if prev == self.config.upper {
            self.config.lower
        } else {
            self.config.upper
        }
    }
}

/// Run-time choice between the generator variants
#[derive(Debug, Clone)]
pub enum Generator {
    Brownian(Brownian),
    Blocked(Blocked),
}

impl Generator {
    pub fn kind(&self) -> &'static str {
        match self {
            Generator::Brownian(_) => "brownian",
            Generator::Blocked(_) => "blocked",
        }
    }
}

impl RewardGenerator for Generator {
    fn config(&self) -> &GeneratorConfig {
        match self {
            Generator::Brownian(g) => g.config(),
            Generator::Blocked(g) => g.config(),
        }
    }

    fn initial_probs<R: Rng + ?Sized>(&self, rng: &mut R) -> RewardProbs {
        match self {
            Generator::Brownian(g) => g.initial_probs(rng),
            Generator::Blocked(g) => g.initial_probs(rng),
        }
    }

    fn next<R: Rng + ?Sized>(&self, prev: f64, trial_index: usize, rng: &mut R) -> f64 {
        match self {
            Generator::Brownian(g) => g.next(prev, trial_index, rng),
            Generator::Blocked(g) => g.next(prev, trial_index, rng),
        }
    }
}

impl From<Brownian> for Generator {
    fn from(g: Brownian) -> Self {
        Generator::Brownian(g)
    }
}

impl From<Blocked> for Generator {
    fn from(g: Blocked) -> Self {
        Generator::Blocked(g)
    }
}

/// Serializable description of a generator, as stored in parameter files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeneratorParams {
    Brownian {
        step2flip: f64,
        bounds: [f64; 2],
        loc: f64,
        scale: f64,
    },
    Blocked {
        step2flip: f64,
        bounds: [f64; 2],
        block_length: usize,
    },
}

impl GeneratorParams {
    pub fn brownian_preset() -> Self {
        GeneratorParams::Brownian {
            step2flip: 0.3,
            bounds: [0.25, 0.75],
            loc: 0.0,
            scale: 0.025,
        }
    }

    pub fn blocked_preset() -> Self {
        GeneratorParams::Blocked {
            step2flip: 0.2,
            bounds: [0.2, 0.8],
            block_length: 10,
        }
    }

    pub fn build(&self) -> Result<Generator, GeneratorError> {
        Ok(match *self {
            GeneratorParams::Brownian {
                step2flip,
                bounds,
                loc,
                scale,
            } => Brownian::new(GeneratorConfig::new(step2flip, bounds)?, loc, scale)?.into(),
            GeneratorParams::Blocked {
                step2flip,
                bounds,
                block_length,
            } => Blocked::new(GeneratorConfig::new(step2flip, bounds)?, block_length)?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn blocked(block_length: usize) -> Blocked {
        let config = GeneratorConfig::new(0.2, [0.2, 0.8]).unwrap();
        Blocked::new(config, block_length).unwrap()
    }

    #[test]
    fn reflect_keeps_single_steps_in_bounds() {
        let (lower, upper) = (0.25, 0.75);
        let width = upper - lower;
        for i in 0..=50 {
            let prev = lower + width * i as f64 / 50.0;
            for k in -50..=50 {
                let step = width * k as f64 / 50.0;
                let value = reflect(prev + step, lower, upper);
                assert!(
                    (lower - 1e-12..=upper + 1e-12).contains(&value),
                    "prev={prev} step={step} gave {value}"
                );
            }
        }
    }

    #[test]
    fn reflect_mirrors_across_the_bound() {
        assert!((reflect(0.8, 0.25, 0.75) - 0.7).abs() < 1e-12);
        assert!((reflect(0.2, 0.25, 0.75) - 0.3).abs() < 1e-12);
        assert_eq!(reflect(0.5, 0.25, 0.75), 0.5);
    }

    #[test]
    fn brownian_walk_stays_in_bounds() {
        let generator = GeneratorParams::brownian_preset().build().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut probs = generator.initial_probs(&mut rng);
        for trial in 0..5_000 {
            probs = generator.advance(&probs, trial, &mut rng);
            for p in probs.iter() {
                assert!((0.25..=0.75).contains(&p), "trial {trial}: {p}");
            }
        }
    }

    #[test]
    fn brownian_initial_probs_within_bounds() {
        let generator = GeneratorParams::brownian_preset().build().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let probs = generator.initial_probs(&mut rng);
            assert!(probs.iter().all(|p| (0.25..=0.75).contains(&p)));
        }
    }

    #[test]
    fn zero_scale_brownian_holds_value() {
        let config = GeneratorConfig::new(0.3, [0.25, 0.75]).unwrap();
        let generator = Brownian::new(config, 0.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generator.next(0.4, 0, &mut rng), 0.4);
    }

    #[test]
    fn blocked_flips_only_on_block_boundary() {
        let generator = blocked(10);
        let mut rng = StdRng::seed_from_u64(0);
        let mut value = 0.8;
        for trial in 0..40 {
            let next = generator.next(value, trial, &mut rng);
            assert_eq!(next != value, (trial + 1) % 10 == 0, "trial {trial}");
            value = next;
        }
    }

    #[test]
    fn blocked_alternates_once_per_window() {
        let generator = blocked(4);
        let mut rng = StdRng::seed_from_u64(0);
        let mut values = vec![0.2];
        for trial in 0..20 {
            let prev = *values.last().unwrap();
            values.push(generator.next(prev, trial, &mut rng));
        }
        for window in values.windows(5) {
            let changes = window.windows(2).filter(|w| w[0] != w[1]).count();
            assert_eq!(changes, 1, "{window:?}");
        }
        assert!(values.iter().all(|&v| v == 0.2 || v == 0.8));
    }

    #[test]
    fn blocked_initial_rows_are_complementary() {
        let generator = blocked(10);
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen_high = [false; 2];
        for _ in 0..100 {
            let probs = generator.initial_probs(&mut rng);
            for context in 0..2 {
                let mut row = probs.row(context);
                if row[0] == 0.8 {
                    seen_high[0] = true;
                } else {
                    seen_high[1] = true;
                }
                row.sort_by(|a, b| a.partial_cmp(b).unwrap());
                assert_eq!(row, [0.2, 0.8]);
            }
            assert_eq!(probs.row(0), probs.row(1));
        }
        assert_eq!(seen_high, [true, true]);
    }

    #[test]
    fn presets_expose_step2flip() {
        let brownian = GeneratorParams::brownian_preset().build().unwrap();
        let blocked = GeneratorParams::blocked_preset().build().unwrap();
        assert_eq!(brownian.step2flip(), 0.3);
        assert_eq!(blocked.step2flip(), 0.2);
        assert_eq!(brownian.kind(), "brownian");
        assert_eq!(blocked.kind(), "blocked");
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert_eq!(
            GeneratorConfig::new(0.2, [0.8, 0.2]),
            Err(GeneratorError::InvalidBounds {
                lower: 0.8,
                upper: 0.2
            })
        );
        assert_eq!(
            GeneratorConfig::new(1.5, [0.2, 0.8]),
            Err(GeneratorError::InvalidStep2Flip(1.5))
        );
        let config = GeneratorConfig::new(0.2, [0.2, 0.8]).unwrap();
        assert!(matches!(
            Brownian::new(config, 0.0, -1.0),
            Err(GeneratorError::InvalidScale(_))
        ));
        assert!(matches!(
            Brownian::new(config, f64::NAN, 0.1),
            Err(GeneratorError::InvalidLoc(_))
        ));
        assert!(matches!(
            Blocked::new(config, 0),
            Err(GeneratorError::ZeroBlockLength)
        ));
    }

    #[test]
    fn params_parse_from_json() {
        let json = r#"{"kind": "blocked", "step2flip": 0.1, "bounds": [0.3, 0.9], "block_length": 5}"#;
        let params: GeneratorParams = serde_json::from_str(json).unwrap();
        let Generator::Blocked(generator) = params.build().unwrap() else {
            panic!("expected blocked generator");
        };
        assert_eq!(generator.block_length(), 5);
        assert_eq!(generator.step2flip(), 0.1);
        assert_eq!(generator.config().upper, 0.9);
    }
}
