use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

/// Subscriber settings, usually taken from the `network` config section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TracingSettings {
    fn filter(&self) -> Result<EnvFilter, TracingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let directive = format!("{},wallet_flow=debug", self.level);
        EnvFilter::try_new(&directive).map_err(|e| TracingError::InvalidFilter {
            directive,
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(settings: &TracingSettings) -> Result<(), TracingError> {
    let env_filter = settings.filter()?;

    let fmt_layer = if settings.json {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
            .boxed()
    } else {
        fmt::layer().with_target(true).with_level(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Span context for one orchestration run
#[derive(Debug, Clone)]
pub struct RunSpan {
    pub run_id: Uuid,
    pub owner: String,
}

impl RunSpan {
    pub fn new(run_id: Uuid, owner: &str) -> Self {
        Self {
            run_id,
            owner: owner.to_string(),
        }
    }

    /// Span to instrument the run's task with
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "flow_run",
            run_id = %self.run_id,
            owner = %self.owner,
        )
    }

    /// Enter the span on the current thread
    pub fn enter(&self) -> tracing::span::EnteredSpan {
        self.span().entered()
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("failed to initialize tracing: {0}")]
    InitError(String),
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidFilter { directive: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = TracingSettings::default();
        assert_eq!(settings.level, "info");
        assert!(!settings.json);
    }

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = TracingSettings {
            level: "wallet_flow=loud".to_string(),
            json: false,
        };
        assert!(matches!(
            settings.filter(),
            Err(TracingError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_run_span_carries_ids() {
        let run_id = Uuid::new_v4();
        let span = RunSpan::new(run_id, "owner-1");
        assert_eq!(span.run_id, run_id);
        assert_eq!(span.owner, "owner-1");

        let _entered = span.enter();
    }
}
