pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("worker pool is not accepting tasks")]
    PoolClosed,

    #[error("operation cancelled while blocked")]
    Cancelled,

    #[error("timed out waiting for a message")]
    Timeout,

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    /// True for the two ways a blocked handoff can give up without a message.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout)
    }
}

/// Returned by [`HandoffChannel::try_send`](crate::handoff::HandoffChannel::try_send)
/// when the slot is occupied. Carries the rejected message back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrySendError<T> {
    #[error("handoff slot is full")]
    Full(T),
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::PoolClosed.to_string(),
            "worker pool is not accepting tasks"
        );
        assert_eq!(
            Error::config("num_threads must be > 0").to_string(),
            "config error: num_threads must be > 0"
        );
    }

    #[test]
    fn test_interrupted() {
        assert!(Error::Cancelled.is_interrupted());
        assert!(Error::Timeout.is_interrupted());
        assert!(!Error::PoolClosed.is_interrupted());
    }

    #[test]
    fn test_try_send_error_returns_message() {
        let err = TrySendError::Full("payload");
        assert_eq!(err.to_string(), "handoff slot is full");
        assert_eq!(err.into_inner(), "payload");
    }
}
