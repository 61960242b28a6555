//! Row-level validation issues.
//!
//! Issues are the non-fatal half of the error model: they exclude only the
//! affected record (or merely annotate it) and are carried through to the
//! approval stage so the operator can see what was skipped and why.

use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a validation issue. Stable codes for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// A header did not resolve to any canonical field.
    UnmappedHeader,
    /// A later row repeated a natural key already seen in this file.
    DuplicateKey,
    /// A row carried entity data but no natural key for that entity type.
    MissingKey,
    /// The tax id did not strip to a valid fixed-length identifier.
    InvalidTaxId,
    /// A required field was absent and substituted with the sentinel.
    MissingRequiredField,
    /// An item referenced a supplier absent from both the store and the
    /// batch's new organizations.
    DanglingReference,
    /// A chunk write failed during apply.
    ChunkFailed,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnmappedHeader => "unmapped_header",
            Self::DuplicateKey => "duplicate_key",
            Self::MissingKey => "missing_key",
            Self::InvalidTaxId => "invalid_tax_id",
            Self::MissingRequiredField => "missing_required_field",
            Self::DanglingReference => "dangling_reference",
            Self::ChunkFailed => "chunk_failed",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding, attached to a key and/or field when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub message: String,
    /// Natural key of the affected entity, when the issue is record-scoped.
    pub key: Option<String>,
    /// Canonical field name, when the issue is field-scoped.
    pub field: Option<String>,
}

impl ValidationIssue {
    /// Build an error-severity issue for a record.
    pub fn error(category: IssueCategory, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Error,
            message: message.into(),
            key: Some(key.into()),
            field: None,
        }
    }

    /// Build a warning-severity issue.
    pub fn warning(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Warning,
            message: message.into(),
            key: None,
            field: None,
        }
    }

    /// Attach the affected key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach the affected canonical field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_strings() {
        assert_eq!(Severity::Error.as_str(), "error");
        assert_eq!(Severity::Warning.as_str(), "warning");
        assert_eq!(Severity::Info.as_str(), "info");
    }

    #[test]
    fn category_codes_are_stable() {
        assert_eq!(IssueCategory::UnmappedHeader.as_str(), "unmapped_header");
        assert_eq!(IssueCategory::DuplicateKey.as_str(), "duplicate_key");
        assert_eq!(IssueCategory::MissingKey.as_str(), "missing_key");
        assert_eq!(IssueCategory::InvalidTaxId.as_str(), "invalid_tax_id");
        assert_eq!(
            IssueCategory::MissingRequiredField.as_str(),
            "missing_required_field"
        );
        assert_eq!(IssueCategory::DanglingReference.as_str(), "dangling_reference");
        assert_eq!(IssueCategory::ChunkFailed.as_str(), "chunk_failed");
    }

    #[test]
    fn builder_attaches_key_and_field() {
        let issue = ValidationIssue::warning(IssueCategory::MissingRequiredField, "missing")
            .with_key("30712345678")
            .with_field("legal_name");
        assert_eq!(issue.key.as_deref(), Some("30712345678"));
        assert_eq!(issue.field.as_deref(), Some("legal_name"));
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        let json = serde_json::to_string(&IssueCategory::DanglingReference).unwrap();
        assert_eq!(json, "\"dangling_reference\"");
    }
}
