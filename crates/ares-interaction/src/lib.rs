//! Generation engines for the patient simulator.
//!
//! Three interchangeable implementations of
//! [`PatientEngine`](ares_core::generation::PatientEngine):
//!
//! - [`MockPatientEngine`]: deterministic canned replies, never fails
//! - [`OllamaPatientEngine`]: a local Ollama-compatible model server
//! - [`EndpointPatientEngine`]: a remote text-generation endpoint
//!
//! [`EngineSelector`] picks one at startup and falls back to the mock when
//! the requested engine is not ready.

pub mod config;
pub mod endpoint_engine;
mod http_error;
pub mod mock_engine;
pub mod ollama_engine;
pub mod selector;

pub use config::{EngineConfig, EngineKind, LocalModelConfig, RemoteEndpointConfig};
pub use endpoint_engine::EndpointPatientEngine;
pub use mock_engine::MockPatientEngine;
pub use ollama_engine::OllamaPatientEngine;
pub use selector::{ActiveEngine, EngineSelector, EngineStatus};
