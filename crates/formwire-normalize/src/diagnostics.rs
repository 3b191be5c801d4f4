//! Soft diagnostics.
//!
//! Some failures must not abort a normalization: an entity whose identity
//! cannot be read is dropped from the output and reported here instead. The
//! normalizer is handed a [`DiagnosticSink`] rather than writing to a global
//! logger, so callers decide where reports go.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// The category of a soft diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Reading an entity's identity field failed; the value was omitted.
    EntityIdentity,
    /// A field or widget kind had no registered handler; only the base
    /// description was produced.
    UnregisteredKind,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EntityIdentity => "entity_identity",
            Self::UnregisteredKind => "unregistered_kind",
        };
        write!(f, "{name}")
    }
}

/// A single non-fatal report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Location of the offending value, e.g. `$.fields.owner.initial`.
    pub path: String,
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(path: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.path, self.message)
    }
}

/// Receives soft diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` as warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            path = %diagnostic.path,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
    }
}

/// Keeps every diagnostic in memory.
///
/// # Examples
///
/// ```
/// use formwire_normalize::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink};
///
/// let sink = CollectingSink::new();
/// sink.report(Diagnostic::new("$.a", DiagnosticKind::EntityIdentity, "gone"));
/// assert_eq!(sink.len(), 1);
/// assert_eq!(sink.diagnostics()[0].path, "$.a");
/// ```
#[derive(Debug, Default)]
pub struct CollectingSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains and returns everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the number of diagnostics.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
