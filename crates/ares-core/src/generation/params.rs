//! Generation parameters and presets.

use crate::error::{AresError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{Display, EnumIter, EnumString};

pub const MAX_NEW_TOKENS_RANGE: RangeInclusive<u32> = 10..=500;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const TOP_P_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const REPETITION_PENALTY_RANGE: RangeInclusive<f32> = 1.0..=2.0;

/// Sampling options forwarded to the generation backend.
///
/// Values outside their ranges are rejected by [`GenerationParams::validate`],
/// never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Caps reply length.
    pub max_new_tokens: u32,
    /// Sampling randomness.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Penalizes repeated n-grams.
    pub repetition_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationPreset::Conservative.params()
    }
}

impl GenerationParams {
    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !MAX_NEW_TOKENS_RANGE.contains(&self.max_new_tokens) {
            return Err(out_of_range(
                "max_new_tokens",
                self.max_new_tokens,
                &MAX_NEW_TOKENS_RANGE,
            ));
        }
        check_float("temperature", self.temperature, &TEMPERATURE_RANGE)?;
        check_float("top_p", self.top_p, &TOP_P_RANGE)?;
        check_float(
            "repetition_penalty",
            self.repetition_penalty,
            &REPETITION_PENALTY_RANGE,
        )?;
        Ok(())
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

fn check_float(field: &str, value: f32, range: &RangeInclusive<f32>) -> Result<()> {
    // NaN fails `contains`, so it is rejected here too.
    if range.contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(field, value, range))
    }
}

fn out_of_range<T: std::fmt::Display>(field: &str, value: T, range: &RangeInclusive<T>) -> AresError {
    AresError::invalid_argument(
        field,
        format!(
            "{} is outside the allowed range {}..={}",
            value,
            range.start(),
            range.end()
        ),
    )
}

/// Named parameter sets tuned for patient replies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationPreset {
    /// Short, focused replies.
    #[default]
    Conservative,
    Balanced,
    /// More varied phrasing.
    Creative,
}

impl GenerationPreset {
    pub fn params(self) -> GenerationParams {
        let (max_new_tokens, temperature, top_p, repetition_penalty) = match self {
            Self::Conservative => (80, 0.3, 0.85, 1.15),
            Self::Balanced => (100, 0.4, 0.9, 1.1),
            Self::Creative => (150, 0.7, 0.95, 1.05),
        };
        GenerationParams {
            max_new_tokens,
            temperature,
            top_p,
            repetition_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_token_boundaries() {
        let base = GenerationParams::default();
        assert!(base.with_max_new_tokens(10).validate().is_ok());
        assert!(base.with_max_new_tokens(500).validate().is_ok());

        let err = base.with_max_new_tokens(501).validate().unwrap_err();
        assert!(matches!(err, AresError::InvalidArgument { ref field, .. } if field == "max_new_tokens"));
        assert!(base.with_max_new_tokens(9).validate().is_err());
    }

    #[test]
    fn test_float_bounds_are_not_clamped() {
        let base = GenerationParams::default();
        assert!(base.with_temperature(0.0).validate().is_ok());
        assert!(base.with_temperature(2.0).validate().is_ok());
        assert!(base.with_temperature(2.01).validate().is_err());
        assert!(base.with_temperature(f32::NAN).validate().is_err());

        let params = GenerationParams {
            repetition_penalty: 0.9,
            ..base
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, AresError::InvalidArgument { ref field, .. } if field == "repetition_penalty"));
        assert_eq!(params.repetition_penalty, 0.9);
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in GenerationPreset::iter() {
            assert!(preset.params().validate().is_ok(), "{preset} invalid");
        }
        assert_eq!(GenerationParams::default().max_new_tokens, 80);
    }
}
