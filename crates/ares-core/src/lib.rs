//! Domain layer of the dental patient simulator.
//!
//! Everything here is free of I/O: the error taxonomy, the pathology
//! catalog, session and message models, the generation contract, prompt
//! construction and output sanitization.

pub mod config;
pub mod error;
pub mod generation;
pub mod pathology;
pub mod prompt;
pub mod safety;
pub mod session;

pub use error::{AresError, Result};
