use thiserror::Error;

/// Errors surfaced by flow construction and execution
#[derive(Debug, Error)]
pub enum FlowError {
    /// Caller-supplied input violated the run contract; checked before any
    /// stage runs, never subject to retry
    #[error("invalid input: {0}")]
    Validation(String),

    /// The flow graph itself is malformed (missing start node, dangling edge)
    #[error("invalid flow configuration: {0}")]
    Config(String),

    /// A stage's prepare or postprocess step failed
    #[error("stage '{stage}' failed")]
    Stage {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    /// A stage's execute step failed on every attempt and no fallback
    /// recovered the result
    #[error("stage '{stage}' failed after {attempts} attempts")]
    Exhausted {
        stage: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl FlowError {
    pub fn stage(stage: &str, source: anyhow::Error) -> Self {
        Self::Stage {
            stage: stage.to_string(),
            source,
        }
    }

    pub fn exhausted(stage: &str, attempts: u32, source: anyhow::Error) -> Self {
        Self::Exhausted {
            stage: stage.to_string(),
            attempts,
            source,
        }
    }

    /// Name of the stage this error originated from, if any
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::Stage { stage, .. } | Self::Exhausted { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
