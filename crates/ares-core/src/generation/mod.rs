//! Generation request contract and engine trait.

mod engine;
mod params;

pub use engine::{GenerationRequest, PatientEngine};
pub use params::{
    GenerationParams, GenerationPreset, MAX_NEW_TOKENS_RANGE, REPETITION_PENALTY_RANGE,
    TEMPERATURE_RANGE, TOP_P_RANGE,
};
