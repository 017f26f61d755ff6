//! Prompt construction for the simulated patient.

mod builder;
mod templates;

pub use builder::{Prompt, PromptBuilder, context_injection, opening_message};
