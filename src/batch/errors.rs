//! Batch error types
//!
//! Error codes:
//! - BATCH_INVALID_ARGUMENT (REJECT)
//! - BATCH_UNEXPECTED_VALUE (REJECT)
//! - BATCH_RUNTIME_ERROR (ERROR)
//!
//! Configuration errors are raised synchronously by the setter that received the
//! bad value. Run errors are raised by `execute` and always abort the current run.
//! Nothing here is retried.

use std::error::Error as StdError;
use std::fmt;

/// Severity levels for batch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller supplied something unusable; nothing was started
    Reject,
    /// A run was aborted
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Closed set of batch error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchErrorCode {
    /// A setter received a value outside its accepted domain
    InvalidArgument,
    /// A structurally valid value that cannot be used
    UnexpectedValue,
    /// A fault discovered while the run was in progress
    RuntimeError,
}

impl BatchErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            BatchErrorCode::InvalidArgument => "BATCH_INVALID_ARGUMENT",
            BatchErrorCode::UnexpectedValue => "BATCH_UNEXPECTED_VALUE",
            BatchErrorCode::RuntimeError => "BATCH_RUNTIME_ERROR",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            BatchErrorCode::RuntimeError => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for BatchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// While building a configuration
    Configure,
    /// At the start of `execute`, before any document was read
    Start,
    /// While documents were being delivered
    Run,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Start => "start",
            Phase::Run => "run",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch error with structured context
#[derive(Debug)]
pub struct BatchError {
    code: BatchErrorCode,
    message: String,
    /// Parameter or field name the error is about
    name: Option<String>,
    /// Rendered offending value
    value: Option<String>,
    phase: Phase,
    /// Callbacks already invoked when the error was raised
    processed: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl BatchError {
    fn new(code: BatchErrorCode, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            name: None,
            value: None,
            phase,
            processed: None,
            source: None,
        }
    }

    /// A setter received a value outside its accepted domain
    pub fn invalid_argument(name: impl Into<String>, value: impl fmt::Display) -> Self {
        let name = name.into();
        let value = value.to_string();
        let mut err = Self::new(
            BatchErrorCode::InvalidArgument,
            Phase::Configure,
            format!("Invalid argument {} = {}", name, value),
        );
        err.name = Some(name);
        err.value = Some(value);
        err
    }

    /// A value that is well-formed but unusable
    pub fn unexpected_value(name: impl Into<String>, value: impl fmt::Display) -> Self {
        let name = name.into();
        let value = value.to_string();
        let mut err = Self::new(
            BatchErrorCode::UnexpectedValue,
            Phase::Configure,
            format!("Unexpected value {} = {}", name, value),
        );
        err.name = Some(name);
        err.value = Some(value);
        err
    }

    /// A configuration value required by a run is missing
    pub fn missing_value(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut err = Self::new(
            BatchErrorCode::UnexpectedValue,
            Phase::Start,
            format!("Unexpected value {} = <unset>", name),
        );
        err.name = Some(name);
        err
    }

    /// A fault raised by `operation` while the run was in progress
    pub fn runtime(operation: &str, message: impl Into<String>) -> Self {
        Self::new(
            BatchErrorCode::RuntimeError,
            Phase::Run,
            format!("{}: {}", operation, message.into()),
        )
    }

    /// A delivered document has no usable iteration-field value
    pub fn missing_iteration_value(field: &str, processed: u64) -> Self {
        let mut err = Self::runtime(
            "execute",
            format!("document[{}] cannot be empty", field),
        );
        err.name = Some(field.to_string());
        err.processed = Some(processed);
        err
    }

    /// Moves the error to another phase
    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Records how many callbacks completed before the failure
    pub fn with_processed(mut self, processed: u64) -> Self {
        self.processed = Some(processed);
        self
    }

    /// Attaches the underlying cause
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code
    pub fn code(&self) -> BatchErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Parameter or field name, if the error is about one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Offending value as it was rendered when the error was raised
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of callbacks that completed before the failure, for run errors
    pub fn processed(&self) -> Option<u64> {
        self.processed
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == BatchErrorCode::InvalidArgument
    }

    pub fn is_unexpected_value(&self) -> bool {
        self.code == BatchErrorCode::UnexpectedValue
    }

    pub fn is_runtime(&self) -> bool {
        self.code == BatchErrorCode::RuntimeError
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        write!(f, " [phase {}]", self.phase)?;
        if let Some(processed) = self.processed {
            write!(f, " [processed {}]", processed)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl StdError for BatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Failure of a whole `execute` call.
///
/// The callback's own error is handed back untouched in `Callback`.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E> {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("{0}")]
    Callback(E),
}

impl<E> RunError<E> {
    /// Returns the batch error, if the run failed inside the engine
    pub fn as_batch(&self) -> Option<&BatchError> {
        match self {
            RunError::Batch(err) => Some(err),
            RunError::Callback(_) => None,
        }
    }

    /// Unwraps the callback's error, if the callback failed
    pub fn into_callback(self) -> Option<E> {
        match self {
            RunError::Callback(err) => Some(err),
            RunError::Batch(_) => None,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, RunError::Callback(_))
    }
}
