use thiserror::Error;

/// Failures a tool surfaces to the user.
///
/// None of these are fatal: the view stays interactive and the user retries
/// by submitting again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("please enter some code first")]
    EmptyInput,

    #[error("AI service is not ready yet")]
    ServiceNotReady,

    #[error("{0}")]
    ServiceError(String),

    #[error("{0}")]
    ClipboardError(String),
}

impl ToolError {
    pub fn service(err: &anyhow::Error) -> Self {
        ToolError::ServiceError(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_keeps_cause_chain() {
        let err = anyhow::anyhow!("connection refused").context("Ollama request failed");
        assert_eq!(
            ToolError::service(&err),
            ToolError::ServiceError("Ollama request failed: connection refused".to_string())
        );
    }
}
