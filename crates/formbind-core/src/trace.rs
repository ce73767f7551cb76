use crate::matching::outcome::BindingReport;
use crate::model::GeometricElement;
use crate::structure::FormStructure;
use crate::text::TextClassification;
use crate::transcript::TranscriptEntities;
use serde::Serialize;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Important,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    SelectLabel,
    SemanticLookup,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceDecisionTarget {
    Field,
    Page,
}

/// Why a field got (or did not get) its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceDecision {
    pub decision_id: String,
    pub target: TraceDecisionTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<GeometricElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub confidence: f32,
    pub reason: String,
    pub severity: TraceSeverity,
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceWarning {
    pub message: String,
    pub severity: TraceSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceBundle {
    pub trace_schema_version: String,
    pub decisions: Vec<TraceDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl Default for TraceBundle {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            decisions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Explain a binding run: one decision per fillable field plus a page summary.
pub fn build_binding_trace(
    structure: &FormStructure,
    classification: &TextClassification,
    entities: &TranscriptEntities,
    report: &BindingReport,
) -> TraceBundle {
    let mut trace = TraceBundle::default();

    trace.decisions.push(TraceDecision {
        decision_id: "dec_page".to_string(),
        target: TraceDecisionTarget::Page,
        field: None,
        label: None,
        value: None,
        rule: None,
        confidence: report.confidence_score(),
        reason: format!(
            "Bound {} of {} fillable fields",
            report.bindings.len(),
            report.total_fields()
        ),
        severity: TraceSeverity::Important,
        steps: vec![TraceStep {
            step_type: TraceStepType::Summary,
            message: format!(
                "{} elements detected, {} labels, {} transcript entities",
                structure.all_elements.len(),
                classification.labels.len(),
                entities.len()
            ),
        }],
    });

    for (idx, binding) in report.bindings.iter().enumerate() {
        trace.decisions.push(TraceDecision {
            decision_id: format!("dec_bound_{idx}"),
            target: TraceDecisionTarget::Field,
            field: Some(*binding.field()),
            label: Some(binding.label_text().to_string()),
            value: Some(binding.value().to_string()),
            rule: Some(binding.rule().to_string()),
            confidence: binding.confidence(),
            reason: format!("'{}' -> '{}'", binding.label_text(), binding.value()),
            severity: TraceSeverity::Info,
            steps: vec![
                TraceStep {
                    step_type: TraceStepType::SelectLabel,
                    message: format!(
                        "Nearest label for {} is '{}'",
                        binding.field(),
                        binding.label_text()
                    ),
                },
                TraceStep {
                    step_type: TraceStepType::SemanticLookup,
                    message: format!(
                        "Rule '{}' produced '{}' (confidence {:.2})",
                        binding.rule(),
                        binding.value(),
                        binding.confidence()
                    ),
                },
            ],
        });
    }

    for (idx, unbound) in report.unbound.iter().enumerate() {
        let mut steps = Vec::new();
        if let Some(label) = &unbound.label_text {
            steps.push(TraceStep {
                step_type: TraceStepType::SelectLabel,
                message: format!("Nearest label for {} is '{}'", unbound.field, label),
            });
        }
        steps.push(TraceStep {
            step_type: TraceStepType::SemanticLookup,
            message: unbound.reason.clone(),
        });

        trace.decisions.push(TraceDecision {
            decision_id: format!("dec_unbound_{idx}"),
            target: TraceDecisionTarget::Field,
            field: Some(unbound.field),
            label: unbound.label_text.clone(),
            value: None,
            rule: None,
            confidence: 0.0,
            reason: unbound.reason.clone(),
            severity: TraceSeverity::Important,
            steps,
        });
    }

    if structure.fields.is_empty() && structure.boxes.is_empty() {
        trace.warnings.push(TraceWarning {
            message: "No fillable fields were detected on the page".into(),
            severity: TraceSeverity::Critical,
        });
    }
    if classification.labels.is_empty() {
        trace.warnings.push(TraceWarning {
            message: "No OCR block was recognized as a label".into(),
            severity: TraceSeverity::Important,
        });
    }
    if entities.is_empty() {
        trace.warnings.push(TraceWarning {
            message: "The transcript yielded no entities".into(),
            severity: TraceSeverity::Important,
        });
    }

    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::MatchConfig;
    use crate::matching::bind;
    use crate::model::{ElementKind, TextBlock};
    use crate::transcript::{parse, parse_domain_conversation};

    #[test]
    fn test_trace_covers_every_field() {
        let field_a = GeometricElement::new(ElementKind::TextField, 150, 100, 150, 25, 0.9).unwrap();
        let field_b = GeometricElement::new(ElementKind::TextField, 150, 200, 150, 25, 0.9).unwrap();
        let structure = FormStructure {
            fields: vec![field_a, field_b],
            all_elements: vec![field_a, field_b],
            ..Default::default()
        };
        let labels = vec![
            TextBlock::new("Badge:", 20, 100, 50, 12, 90.0).unwrap(),
            TextBlock::new("Plate:", 20, 200, 50, 12, 90.0).unwrap(),
        ];
        let classification = TextClassification {
            labels: labels.clone(),
            values: Vec::new(),
        };
        let transcript = "badge number 5847";
        let entities = parse(transcript);
        let domain = parse_domain_conversation(transcript);
        let report = bind(
            &structure.fields,
            &labels,
            &entities,
            &domain,
            transcript,
            &MatchConfig::default(),
        );

        let trace = build_binding_trace(&structure, &classification, &entities, &report);

        assert_eq!(trace.trace_schema_version, "1.0");
        assert_eq!(trace.decisions.len(), 3);
        assert_eq!(trace.decisions[0].target, TraceDecisionTarget::Page);
        assert_eq!(trace.decisions[0].confidence, 0.5);
        assert_eq!(trace.decisions[1].value.as_deref(), Some("5847"));
        assert_eq!(trace.decisions[1].steps.len(), 2);
        assert_eq!(trace.decisions[2].label.as_deref(), Some("Plate:"));
        assert_eq!(trace.decisions[2].severity, TraceSeverity::Important);
        assert!(trace.warnings.is_empty());
    }

    #[test]
    fn test_warnings_for_empty_inputs() {
        let trace = build_binding_trace(
            &FormStructure::default(),
            &TextClassification::default(),
            &TranscriptEntities::default(),
            &BindingReport::default(),
        );
        assert_eq!(trace.decisions.len(), 1);
        assert_eq!(trace.warnings.len(), 3);
        assert_eq!(trace.warnings[0].severity, TraceSeverity::Critical);

        let json = serde_json::to_value(&trace).unwrap();
        assert!(json["decisions"][0].get("field").is_none());
    }
}
