//! Tunable constants for metraj generation.
//!
//! Defaults reproduce the field crews' conventions: one SPT row every 1.5 m,
//! a 45 cm sampler, and a 1 cm tolerance when matching UD depths to rows.
//! A TOML document may override any subset of the keys.

use serde::Deserialize;

use crate::error::MetrajError;

pub const DEFAULT_STEP_M: f64 = 1.5;
pub const DEFAULT_MAX_DEPTH_M: f64 = 500.0;
pub const DEFAULT_MATCH_TOLERANCE_M: f64 = 0.01;
pub const DEFAULT_SAMPLE_LENGTH_M: f64 = 0.45;

/// Grid depths are rounded to centimetres every step, so anything finer
/// than one centimetre can never advance the loop.
pub const MIN_STEP_M: f64 = 0.01;

#[derive(Clone, Debug, PartialEq, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct MetrajSettings {
    /// Spacing between generated rows.
    pub step_m: f64,
    /// Deepest accepted target. Anything beyond is rejected as a typo.
    pub max_depth_m: f64,
    /// A UD depth closer than this to an existing row reuses that row.
    pub match_tolerance_m: f64,
    /// Length of the recovered sample, used for `sample_interval`.
    pub sample_length_m: f64,
}

impl Default for MetrajSettings {
    fn default() -> Self {
        Self {
            step_m: DEFAULT_STEP_M,
            max_depth_m: DEFAULT_MAX_DEPTH_M,
            match_tolerance_m: DEFAULT_MATCH_TOLERANCE_M,
            sample_length_m: DEFAULT_SAMPLE_LENGTH_M,
        }
    }
}

impl MetrajSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, MetrajError> {
        let settings: MetrajSettings =
            toml::from_str(input).map_err(|e| MetrajError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), MetrajError> {
        if !self.step_m.is_finite() || self.step_m < MIN_STEP_M {
            return Err(MetrajError::InvalidSettings(format!(
                "step_m must be at least {MIN_STEP_M}, got {}",
                self.step_m
            )));
        }
        if !self.max_depth_m.is_finite() || self.max_depth_m < self.step_m {
            return Err(MetrajError::InvalidSettings(format!(
                "max_depth_m must be at least one step ({}), got {}",
                self.step_m, self.max_depth_m
            )));
        }
        if !self.match_tolerance_m.is_finite() || self.match_tolerance_m < 0.0 {
            return Err(MetrajError::InvalidSettings(format!(
                "match_tolerance_m must not be negative, got {}",
                self.match_tolerance_m
            )));
        }
        if !self.sample_length_m.is_finite() || self.sample_length_m < 0.0 {
            return Err(MetrajError::InvalidSettings(format!(
                "sample_length_m must not be negative, got {}",
                self.sample_length_m
            )));
        }
        Ok(())
    }
}
