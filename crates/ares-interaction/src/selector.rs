//! Startup-time engine selection with fallback to the mock engine.

use crate::config::{EngineConfig, EngineKind};
use crate::endpoint_engine::EndpointPatientEngine;
use crate::mock_engine::MockPatientEngine;
use crate::ollama_engine::OllamaPatientEngine;
use ares_core::Result;
use ares_core::generation::PatientEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which engine was asked for, which one runs, and why they differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub requested: EngineKind,
    pub active: EngineKind,
    pub degraded: bool,
    pub reason: Option<String>,
}

impl EngineStatus {
    fn healthy(kind: EngineKind) -> Self {
        Self {
            requested: kind,
            active: kind,
            degraded: false,
            reason: None,
        }
    }
}

/// The engine chosen at startup together with its status.
#[derive(Clone)]
pub struct ActiveEngine {
    pub engine: Arc<dyn PatientEngine>,
    pub status: EngineStatus,
}

impl std::fmt::Debug for ActiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveEngine")
            .field("engine", &self.engine.name())
            .field("status", &self.status)
            .finish()
    }
}

pub struct EngineSelector;

impl EngineSelector {
    /// Starts the configured engine.
    ///
    /// If the requested engine reports `ModelNotLoaded` while starting, the
    /// mock engine is used instead and the status is marked degraded. This is
    /// the only place a fallback happens; failures during generation are
    /// never downgraded.
    ///
    /// # Errors
    ///
    /// Propagates any startup error other than `ModelNotLoaded`.
    pub async fn initialize(config: &EngineConfig) -> Result<ActiveEngine> {
        let started: Result<Arc<dyn PatientEngine>> = match config.kind {
            EngineKind::Mock => Ok(Arc::new(MockPatientEngine::new())),
            EngineKind::Local => OllamaPatientEngine::connect(&config.local)
                .await
                .map(|engine| Arc::new(engine) as Arc<dyn PatientEngine>),
            EngineKind::Remote => EndpointPatientEngine::new(&config.remote)
                .map(|engine| Arc::new(engine) as Arc<dyn PatientEngine>),
        };

        match started {
            Ok(engine) => {
                tracing::info!(engine = engine.name(), "Generation engine ready");
                Ok(ActiveEngine {
                    engine,
                    status: EngineStatus::healthy(config.kind),
                })
            }
            Err(err) if err.is_model_not_loaded() => {
                tracing::warn!(
                    requested = %config.kind,
                    error = %err,
                    "Generation engine unavailable, falling back to mock"
                );
                Ok(Self::fallback(config.kind, err.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn fallback(requested: EngineKind, reason: String) -> ActiveEngine {
        ActiveEngine {
            engine: Arc::new(MockPatientEngine::new()),
            status: EngineStatus {
                requested,
                active: EngineKind::Mock,
                degraded: true,
                reason: Some(reason),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalModelConfig;

    #[tokio::test]
    async fn test_mock_is_healthy() {
        let active = EngineSelector::initialize(&EngineConfig::default()).await.unwrap();
        assert_eq!(active.engine.name(), "mock");
        assert_eq!(active.status, EngineStatus::healthy(EngineKind::Mock));
    }

    #[tokio::test]
    async fn test_remote_without_token_falls_back() {
        let config = EngineConfig {
            kind: EngineKind::Remote,
            ..EngineConfig::default()
        };
        let active = EngineSelector::initialize(&config).await.unwrap();

        assert_eq!(active.engine.name(), "mock");
        assert_eq!(active.status.requested, EngineKind::Remote);
        assert_eq!(active.status.active, EngineKind::Mock);
        assert!(active.status.degraded);
        assert!(active.status.reason.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_unreachable_local_falls_back() {
        let config = EngineConfig {
            kind: EngineKind::Local,
            local: LocalModelConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                connect_timeout_secs: 1,
                request_timeout_secs: 1,
                ..LocalModelConfig::default()
            },
            ..EngineConfig::default()
        };
        let active = EngineSelector::initialize(&config).await.unwrap();
        assert!(active.status.degraded);
        assert_eq!(active.status.active, EngineKind::Mock);
    }

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("Remote".parse::<EngineKind>().unwrap(), EngineKind::Remote);
        assert_eq!(EngineKind::Local.to_string(), "local");
        assert!("gpu".parse::<EngineKind>().is_err());
    }
}
