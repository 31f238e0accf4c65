//! Diagnostic messages collected during extraction.
//!
//! The pipeline never throws for semantic problems: analyzers and the
//! collector append `ExtractorMessage` values keyed to a source location and
//! the offending declaration, and the CLI prints the full list after the
//! artifacts have been written.

use serde::{Deserialize, Serialize};

/// Severity levels for extractor messages.
///
/// Errors always fail the run. Warnings fail the run too unless the
/// extraction was invoked as a local build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input problems: unreadable entry point, unresolvable module,
    /// unsupported syntax.
    Error,
    /// Semantic findings: missing release tags, type leaks, forgotten
    /// exports.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Identifies the check that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    #[serde(rename = "missing_release_tag")]
    MissingReleaseTag,
    #[serde(rename = "inconsistent_release_tags")]
    InconsistentReleaseTags,
    #[serde(rename = "type_leak")]
    TypeLeak,
    #[serde(rename = "invalid_override")]
    InvalidOverride,
    #[serde(rename = "invalid_virtual")]
    InvalidVirtual,
    #[serde(rename = "forgotten_export")]
    ForgottenExport,
    #[serde(rename = "unresolved_reference")]
    UnresolvedReference,
    #[serde(rename = "unsupported_syntax")]
    UnsupportedSyntax,
    #[serde(rename = "disallowed_release_tag")]
    DisallowedReleaseTag,
    #[serde(rename = "missing_entry_point")]
    MissingEntryPoint,
}

impl MessageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageId::MissingReleaseTag => "missing_release_tag",
            MessageId::InconsistentReleaseTags => "inconsistent_release_tags",
            MessageId::TypeLeak => "type_leak",
            MessageId::InvalidOverride => "invalid_override",
            MessageId::InvalidVirtual => "invalid_virtual",
            MessageId::ForgottenExport => "forgotten_export",
            MessageId::UnresolvedReference => "unresolved_reference",
            MessageId::UnsupportedSyntax => "unsupported_syntax",
            MessageId::DisallowedReleaseTag => "disallowed_release_tag",
            MessageId::MissingEntryPoint => "missing_entry_point",
        }
    }

    /// Returns the default severity for this message kind.
    pub fn default_severity(&self) -> Severity {
        match self {
            MessageId::UnsupportedSyntax | MessageId::MissingEntryPoint => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic, keyed to (file, line, column, declaration name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorMessage {
    pub id: MessageId,
    pub severity: Severity,
    pub text: String,
    pub file: String,
    pub line: usize,
    pub col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
}

impl ExtractorMessage {
    pub fn new(id: MessageId, text: String, file: String, line: usize, col: usize) -> Self {
        Self {
            id,
            severity: id.default_severity(),
            text,
            file,
            line,
            col,
            declaration: None,
        }
    }

    pub fn with_declaration(mut self, name: impl Into<String>) -> Self {
        self.declaration = Some(name.into());
        self
    }
}

/// Accumulates messages from every pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    messages: Vec<ExtractorMessage>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ExtractorMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, other: MessageCollector) {
        self.messages.extend(other.messages);
    }

    pub fn messages(&self) -> &[ExtractorMessage] {
        &self.messages
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
            .count()
    }

    /// Messages sorted by (file, line, col, id) for deterministic reporting.
    pub fn sorted(&self) -> Vec<ExtractorMessage> {
        let mut sorted = self.messages.clone();
        sorted.sort_by(|a, b| {
            (&a.file, a.line, a.col, a.id.as_str()).cmp(&(&b.file, b.line, b.col, b.id.as_str()))
        });
        sorted
    }
}
