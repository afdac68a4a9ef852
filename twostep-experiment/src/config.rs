use crate::error::ExperimentError;
use std::path::Path;
use std::time::Duration;
use twostep_core::GeneratorParams;

/// Session parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    /// Trial attempts, completed or not
    pub n_trials: usize,
    pub step1_timeout: Duration,
    pub step2_timeout: Duration,
    /// Frames taken by the choice animation
    pub animation_ticks: u32,
    /// How long the win/lose overlay stays up
    pub feedback_duration: Duration,
    /// Blank screen shown after a discarded trial
    pub skip_pause: Duration,
    pub startup_black: Duration,
    /// Blank screen before the first trial
    pub lead_in: Duration,
    pub reward_amount: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            n_trials: 201,
            step1_timeout: Duration::from_secs(2),
            step2_timeout: Duration::from_secs(3),
            animation_ticks: 60,
            feedback_duration: Duration::from_secs(3),
            skip_pause: Duration::from_secs(3),
            startup_black: Duration::from_secs(1),
            lead_in: Duration::from_secs(5),
            reward_amount: 20.0,
        }
    }
}

/// Reads generator parameters from a JSON file
pub fn load_generator_params(path: &Path) -> Result<GeneratorParams, ExperimentError> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| ExperimentError::Params {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_paradigm() {
        let config = TaskConfig::default();
        assert_eq!(config.n_trials, 201);
        assert_eq!(config.step1_timeout, Duration::from_secs(2));
        assert_eq!(config.step2_timeout, Duration::from_secs(3));
        assert_eq!(config.animation_ticks, 60);
    }

    #[test]
    fn loads_params_from_file() {
        let path = std::env::temp_dir().join(format!("twostep-params-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"kind": "brownian", "step2flip": 0.25, "bounds": [0.1, 0.9], "loc": 0.0, "scale": 0.05}"#,
        )
        .unwrap();
        let params = load_generator_params(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            params,
            GeneratorParams::Brownian {
                step2flip: 0.25,
                bounds: [0.1, 0.9],
                loc: 0.0,
                scale: 0.05,
            }
        );
    }

    #[test]
    fn malformed_params_name_the_file() {
        let path = std::env::temp_dir().join(format!("twostep-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"kind": "sawtooth"}"#).unwrap();
        let err = load_generator_params(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ExperimentError::Params { .. }));
        assert!(err.to_string().contains("twostep-bad"));
    }
}
