use std::fmt;

use thiserror::Error;

/// A single field-level failure reported by a form validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error a form produced, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// True if any error was recorded against `field`.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BordError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Failures raised by a [`crate::core::db::Store`] backend. Passed through
/// to callers untouched; the core never retries them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("stored record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum BordError {
    /// Bad input shape or length; the caller should re-prompt.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request is well formed but not allowed, e.g. following yourself.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BordError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BordError::Validation(ValidationErrors(vec![FieldError::new(field, message)]))
    }
}

pub type Result<T> = std::result::Result<T, BordError>;
