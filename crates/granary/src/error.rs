// ABOUTME: Error types for the granary pipeline including FailureKind enum and PipelineError struct.
// ABOUTME: Provides categorized failures with convenience constructors and boolean helpers.

use std::fmt;

/// Failure categories surfaced by one pipeline run.
///
/// `Extraction` covers unreachable sources, navigation timeouts, and
/// undecodable or empty PDF payloads. `Validation` means the normalized
/// payload violated a non-nullable-field invariant (a contract bug, not
/// caller input). `Persistence` covers store rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Extraction,
    Validation,
    Persistence,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Extraction => "extraction failure",
            FailureKind::Validation => "validation failure",
            FailureKind::Persistence => "persistence failure",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for pipeline operations.
///
/// Failures are local to one request: the caller receives the kind plus
/// cause text and no partial record is persisted.
#[derive(Debug, thiserror::Error)]
pub struct PipelineError {
    pub kind: FailureKind,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "granary: {}: {}", self.op, self.kind)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl PipelineError {
    /// Create an Extraction failure.
    pub fn extraction(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            kind: FailureKind::Extraction,
            op: op.into(),
            source,
        }
    }

    /// Create a Validation failure.
    pub fn validation(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            kind: FailureKind::Validation,
            op: op.into(),
            source,
        }
    }

    /// Create a Persistence failure.
    pub fn persistence(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            kind: FailureKind::Persistence,
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is an Extraction failure.
    pub fn is_extraction(&self) -> bool {
        self.kind == FailureKind::Extraction
    }

    /// Returns true if this is a Validation failure.
    pub fn is_validation(&self) -> bool {
        self.kind == FailureKind::Validation
    }

    /// Returns true if this is a Persistence failure.
    pub fn is_persistence(&self) -> bool {
        self.kind == FailureKind::Persistence
    }
}
