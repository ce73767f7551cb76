use crate::model::{FieldBinding, GeometricElement};
use serde::Serialize;

/// Why a detected field received no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnboundField {
    pub field: GeometricElement,
    /// Caption chosen for the field, if one qualified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,
    pub reason: String,
}

/// Result of binding every fillable field on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingReport {
    /// Fields that received a value, in field order.
    pub bindings: Vec<FieldBinding>,
    /// Fields left empty, in field order.
    pub unbound: Vec<UnboundField>,
}

impl BindingReport {
    pub fn total_fields(&self) -> usize {
        self.bindings.len() + self.unbound.len()
    }

    /// Share of fields that were bound; 0 when there were no fields.
    pub fn confidence_score(&self) -> f32 {
        confidence_score(self.bindings.len(), self.total_fields())
    }
}

/// Per-field result of template filling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldOutcome {
    Filled { value: String, rule: String },
    Unfilled { reason: String },
}

impl FieldOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, FieldOutcome::Filled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    pub label: String,
    pub outcome: FieldOutcome,
}

/// Summary of one `fill_form` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub fields: Vec<FieldResult>,
    pub total_fields: usize,
    pub filled_count: usize,
    /// `filled_count / total_fields`, 0 for an empty form.
    pub confidence_score: f32,
}

impl FillReport {
    pub fn from_results(fields: Vec<FieldResult>) -> Self {
        let total_fields = fields.len();
        let filled_count = fields.iter().filter(|f| f.outcome.is_filled()).count();
        Self {
            fields,
            total_fields,
            filled_count,
            confidence_score: confidence_score(filled_count, total_fields),
        }
    }

    pub fn unfilled_labels(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.outcome.is_filled())
            .map(|f| f.label.as_str())
            .collect()
    }
}

fn confidence_score(filled: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        filled as f32 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, filled: bool) -> FieldResult {
        FieldResult {
            label: label.into(),
            outcome: if filled {
                FieldOutcome::Filled {
                    value: "x".into(),
                    rule: "name".into(),
                }
            } else {
                FieldOutcome::Unfilled {
                    reason: "no match".into(),
                }
            },
        }
    }

    #[test]
    fn test_confidence_is_filled_over_total() {
        let report = FillReport::from_results(vec![
            result("Name", true),
            result("Date", false),
            result("Email", true),
            result("Phone", false),
        ]);
        assert_eq!(report.total_fields, 4);
        assert_eq!(report.filled_count, 2);
        assert_eq!(report.confidence_score, 0.5);
        assert_eq!(report.unfilled_labels(), vec!["Date", "Phone"]);
    }

    #[test]
    fn test_zero_fields_zero_confidence() {
        let report = FillReport::from_results(Vec::new());
        assert_eq!(report.confidence_score, 0.0);
        assert_eq!(BindingReport::default().confidence_score(), 0.0);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(FieldOutcome::Unfilled {
            reason: "no match".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "unfilled");
        assert_eq!(json["reason"], "no match");
    }
}
