//! Structured, SKU-attributed warnings
//!
//! Every pipeline stage returns its result together with the diagnostics it
//! raised. A diagnostic never stops a batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a data-quality condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Fewer observations than a stage needs; the stage was skipped
    InsufficientHistory,
    /// Standard deviation or IQR of zero
    ZeroVariance,
    /// CV above the intermittent threshold; Z-threshold overridden
    IntermittentDemand,
    /// More than the tolerated share of observations flagged
    HighAnomalyRate,
    /// No usable PO/receipt history; default lead time applied
    MissingLeadTimeHistory,
    /// Average daily demand of zero
    ZeroDemand,
    /// Malformed input row
    InvalidRecord,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::InsufficientHistory => "insufficient history",
            DiagnosticKind::ZeroVariance => "zero variance",
            DiagnosticKind::IntermittentDemand => "intermittent demand",
            DiagnosticKind::HighAnomalyRate => "high anomaly rate",
            DiagnosticKind::MissingLeadTimeHistory => "missing lead time history",
            DiagnosticKind::ZeroDemand => "zero demand",
            DiagnosticKind::InvalidRecord => "invalid record",
        };
        f.write_str(label)
    }
}

/// A warning attached to one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// SKU the condition was observed on
    pub sku: String,
    /// Category of the condition
    pub kind: DiagnosticKind,
    /// Human readable detail
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(sku: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.sku, self.kind, self.message)
    }
}

/// True if any diagnostic in `diagnostics` has the given kind
pub fn has_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> bool {
    diagnostics.iter().any(|d| d.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_lookup() {
        let diagnostics = vec![Diagnostic::new(
            "SKU-1",
            DiagnosticKind::ZeroDemand,
            "no demand in history",
        )];
        assert_eq!(
            diagnostics[0].to_string(),
            "[SKU-1] zero demand: no demand in history"
        );
        assert!(has_kind(&diagnostics, DiagnosticKind::ZeroDemand));
        assert!(!has_kind(&diagnostics, DiagnosticKind::ZeroVariance));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&DiagnosticKind::MissingLeadTimeHistory).unwrap();
        assert_eq!(json, "\"missing_lead_time_history\"");
    }
}
