/// Errors that can occur across Herald.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use herald_core::HeraldError;
///
/// let err = HeraldError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    /// Filesystem or stdin I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Assistant API failure (registration, threads, messages, runs).
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Tool-integration service failure (action execution, capability lookup).
    #[error("toolset error: {0}")]
    Toolset(String),

    /// Trigger subscription or event stream failure.
    #[error("listener error: {0}")]
    Listener(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How an error should be treated by the process.
///
/// The source scripts were inconsistent here (some re-raised, some swallowed);
/// Herald settles on one policy: `FatalStartup` aborts with a nonzero exit,
/// while both event classes are logged and the subscription loop moves on to
/// the next event. No event is ever retried.
///
/// # Examples
///
/// ```
/// use herald_core::{Disposition, HeraldError};
///
/// let err = HeraldError::Config("no credentials".into());
/// assert_eq!(err.disposition(), Disposition::FatalStartup);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Abort startup; the process exits nonzero.
    FatalStartup,
    /// The event cannot succeed even if redelivered; log and continue.
    FatalEvent,
    /// Likely transient (network, timeout, malformed payload); log and continue.
    RetryableEvent,
}

impl HeraldError {
    /// Classify this error for the subscription loop.
    pub fn disposition(&self) -> Disposition {
        match self {
            HeraldError::Io(_) | HeraldError::Config(_) | HeraldError::Toml(_) => {
                Disposition::FatalStartup
            }
            // A dead event stream means nobody is listening; crashing beats idling.
            HeraldError::Listener(_) => Disposition::FatalStartup,
            HeraldError::Assistant(_) => Disposition::FatalEvent,
            HeraldError::Toolset(_) | HeraldError::Serialization(_) => Disposition::RetryableEvent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HeraldError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = HeraldError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn startup_domains_are_fatal() {
        assert_eq!(
            HeraldError::Config("x".into()).disposition(),
            Disposition::FatalStartup
        );
        assert_eq!(
            HeraldError::Listener("stream closed".into()).disposition(),
            Disposition::FatalStartup
        );
    }

    #[test]
    fn event_domains_do_not_kill_the_loop() {
        assert_eq!(
            HeraldError::Assistant("run failed".into()).disposition(),
            Disposition::FatalEvent
        );
        assert_eq!(
            HeraldError::Toolset("503".into()).disposition(),
            Disposition::RetryableEvent
        );
    }
}
