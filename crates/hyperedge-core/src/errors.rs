//! Structured error types shared by the rerouting crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`RouterError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, counts, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the rerouting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum RouterError {
    /// Registry and topology errors (unknown objects, cycles, overlaps).
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Errors raised by a hyperedge tree builder.
    #[error("builder error: {0}")]
    Builder(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl RouterError {
    /// Shorthand for a [`RouterError::Graph`] with the provided code and message.
    pub fn graph(code: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::Graph(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`RouterError::Builder`] with the provided code and message.
    pub fn builder(code: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::Builder(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            RouterError::Graph(info) | RouterError::Builder(info) | RouterError::Serde(info) => {
                info
            }
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Adds a context entry to the payload regardless of the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        match self {
            RouterError::Graph(info) => RouterError::Graph(info.with_context(key, value)),
            RouterError::Builder(info) => RouterError::Builder(info.with_context(key, value)),
            RouterError::Serde(info) => RouterError::Serde(info.with_context(key, value)),
        }
    }

    /// Sets a remediation hint regardless of the error family.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            RouterError::Graph(info) => RouterError::Graph(info.with_hint(hint)),
            RouterError::Builder(info) => RouterError::Builder(info.with_hint(hint)),
            RouterError::Serde(info) => RouterError::Serde(info.with_hint(hint)),
        }
    }
}
