use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out waiting for {selector} after {secs}s")]
    Timeout { selector: String, secs: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Detail fetch failed for {url}: {reason}")]
    DetailFetch { url: String, reason: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Errors that a fresh attempt of the whole fetch sequence may cure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Connection(_)
                | PipelineError::Timeout { .. }
                | PipelineError::Browser(_)
                | PipelineError::Http(_)
                | PipelineError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_selector() {
        let err = PipelineError::Timeout {
            selector: "div.article".into(),
            secs: 20,
        };
        assert_eq!(err.to_string(), "Timed out waiting for div.article after 20s");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PipelineError::Connection("down".into()).is_retryable());
        assert!(PipelineError::Browser("crashed".into()).is_retryable());
        assert!(!PipelineError::Config("bad".into()).is_retryable());
        assert!(!PipelineError::Store("locked".into()).is_retryable());
    }
}
