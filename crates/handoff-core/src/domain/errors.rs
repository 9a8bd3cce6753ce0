//! Errors - エラー型と分類
//!
//! - **TaskError**: task 本体が返す失敗（dispatcher からは不透明）
//! - **ProtocolMisuse**: ResultCarrier の誤用（二重 settle / 二重 wait）
//! - **DispatchError**: propagating 経路の呼び出し側に返るエラー

use std::any::Any;
use std::fmt;

/// ErrorKind は TaskError の分類
///
/// - Failed: task のロジックが返した失敗
/// - Panicked: task 本体が panic した（owning context 側で捕捉済み）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Failed,
    Panicked,
}

/// TaskError は task のロジックが返す失敗
///
/// owning context から呼び出し側スレッドへ渡るため、source も `Send + Sync` を要求します。
#[derive(Debug)]
pub struct TaskError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Failed,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error as the cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            kind: ErrorKind::Failed,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Build from a `catch_unwind` payload.
    ///
    /// `panic!` payloads are `&'static str` or `String` in practice; anything
    /// else is reported without its text.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            kind: ErrorKind::Panicked,
            message,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Failed => f.write_str(&self.message),
            ErrorKind::Panicked => write!(f, "task panicked: {}", self.message),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// ProtocolMisuse は ResultCarrier の誤用
///
/// 回復可能な状態ではなく、呼び出し側のバグを示します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolMisuse {
    #[error("result carrier was already settled")]
    AlreadySettled,

    #[error("result carrier outcome was already taken")]
    AlreadyTaken,
}

/// DispatchError is what the propagating entry point hands back to callers.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The owning context stopped before the task could run.
    #[error("owning context is no longer accepting tasks")]
    Closed,

    #[error(transparent)]
    Misuse(#[from] ProtocolMisuse),
}

impl DispatchError {
    /// The task failure, if this error came from the task body.
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            DispatchError::Task(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn failed_error_displays_bare_message() {
        let err = TaskError::new("boom");
        assert_eq!(err.kind(), ErrorKind::Failed);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such table");
        let err = TaskError::with_source("load failed", io);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "no such table");
    }

    #[test]
    fn panic_payloads_are_extracted() {
        let err = TaskError::from_panic(Box::new("static str"));
        assert_eq!(err.kind(), ErrorKind::Panicked);
        assert_eq!(err.message(), "static str");

        let err = TaskError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.to_string(), "task panicked: owned");

        let err = TaskError::from_panic(Box::new(7_u32));
        assert_eq!(err.message(), "non-string panic payload");
    }

    #[test]
    fn dispatch_error_is_transparent_over_task_error() {
        let err = DispatchError::from(TaskError::new("boom"));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.task_error().map(TaskError::message), Some("boom"));
        assert!(DispatchError::Closed.task_error().is_none());
    }
}
