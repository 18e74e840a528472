//! Language, kind, source, and status enums for Lode.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! except the historically uppercase edge kinds and tag sources, which keep their
//! stored spelling. Every enum provides `as_str` for SQL storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Source language of an indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Go,
    Java,
    Sql,
    Unknown,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Go => "go",
            Self::Java => "java",
            Self::Sql => "sql",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a tree-sitter grammar is available for this language.
    #[must_use]
    pub const fn has_parser(self) -> bool {
        !matches!(self, Self::Sql | Self::Unknown)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SymbolKind
// ---------------------------------------------------------------------------

/// The kind of an extracted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Variable,
    Module,
}

impl SymbolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Variable => "variable",
            Self::Module => "module",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EdgeKind
// ---------------------------------------------------------------------------

/// The kind of a directed relationship between two symbols.
///
/// Stored uppercase (`IMPORTS`, `CALLS`, …) to match the on-disk schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Imports,
    Calls,
    Inherits,
    Implements,
}

impl EdgeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Imports => "IMPORTS",
            Self::Calls => "CALLS",
            Self::Inherits => "INHERITS",
            Self::Implements => "IMPLEMENTS",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// The kind of entity a tag or summary attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    File,
    Symbol,
    Chunk,
    Document,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Symbol => "symbol",
            Self::Chunk => "chunk",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TagSource
// ---------------------------------------------------------------------------

/// How an entity tag was assigned.
///
/// `Manual` tags survive re-indexing; `Rule` and `Auto` tags are rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagSource {
    Manual,
    Rule,
    Auto,
    SemanticMatch,
}

impl TagSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Rule => "RULE",
            Self::Auto => "AUTO",
            Self::SemanticMatch => "SEMANTIC_MATCH",
        }
    }

    /// Whether tags from this source are rebuilt on re-index.
    #[must_use]
    pub const fn is_rebuilt_on_reindex(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DocType / DocSource
// ---------------------------------------------------------------------------

/// The kind of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    DocFile,
    SqlSchema,
    GeneratedSummary,
    DbReport,
}

impl DocType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocFile => "DOC_FILE",
            Self::SqlSchema => "SQL_SCHEMA",
            Self::GeneratedSummary => "GENERATED_SUMMARY",
            Self::DbReport => "DB_REPORT",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a document was written by a human or generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocSource {
    Human,
    Generated,
}

impl DocSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "HUMAN",
            Self::Generated => "GENERATED",
        }
    }
}

impl fmt::Display for DocSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ClaimStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a behavioral claim.
///
/// ```text
/// new → verified   (verification verdict: match)
///     → drift      (verification verdict: mismatch)
///     → unclear    (verification verdict: unclear / no_code_found)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    New,
    Verified,
    Drift,
    Unclear,
}

impl ClaimStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Verified => "verified",
            Self::Drift => "drift",
            Self::Unclear => "unclear",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// The type of a claim's expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Percentage,
    Number,
    Duration,
    Size,
    Boolean,
}

impl ValueType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Number => "number",
            Self::Duration => "duration",
            Self::Size => "size",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of checking a claim against code evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Match,
    Mismatch,
    Unclear,
    NoCodeFound,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::Unclear => "unclear",
            Self::NoCodeFound => "no_code_found",
        }
    }

    /// The claim status this verdict moves the claim to.
    #[must_use]
    pub const fn claim_status(self) -> ClaimStatus {
        match self {
            Self::Match => ClaimStatus::Verified,
            Self::Mismatch => ClaimStatus::Drift,
            Self::Unclear | Self::NoCodeFound => ClaimStatus::Unclear,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DriftSeverity / FixType
// ---------------------------------------------------------------------------

/// Severity of a documentation drift issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DriftSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a suggested fix should change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    UpdateDoc,
    UpdateCode,
    NeedsReview,
}

impl FixType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpdateDoc => "update_doc",
            Self::UpdateCode => "update_code",
            Self::NeedsReview => "needs_review",
        }
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValidityStatus
// ---------------------------------------------------------------------------

/// Classification of a document validity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidityStatus {
    Valid,
    Warning,
    Stale,
}

impl ValidityStatus {
    /// Classify a 0–100 score: `≥70` valid, `≥50` warning, else stale.
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        if score >= 70 {
            Self::Valid
        } else if score >= 50 {
            Self::Warning
        } else {
            Self::Stale
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Warning => "warning",
            Self::Stale => "stale",
        }
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IndexOutcome / ReindexOp
// ---------------------------------------------------------------------------

/// Per-file outcome of an indexing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexOutcome {
    Indexed,
    Skipped,
    TooLarge,
}

/// Single-file reindex operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReindexOp {
    Delete,
    Upsert,
}
