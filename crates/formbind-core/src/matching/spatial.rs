use super::outcome::{BindingReport, UnboundField};
use super::semantic::SemanticMatcher;
use crate::config::schema::MatchConfig;
use crate::model::{FieldBinding, GeometricElement, TextBlock};
use crate::transcript::{DomainFields, TranscriptEntities};
use std::cmp::Ordering;
use tracing::debug;

/// Whether `label` may caption `field`: it starts no further right than the
/// field's right edge and no more than `tolerance` below its top.
pub fn label_qualifies(label: &TextBlock, field: &GeometricElement, tolerance: u32) -> bool {
    label.x() <= field.right() && label.y() <= field.y().saturating_add(tolerance)
}

/// Nearest qualifying label by top-left corner distance.
///
/// Ties go to the smaller vertical offset, then the smaller horizontal
/// offset, then the earlier label.
pub fn nearest_label<'a>(
    field: &GeometricElement,
    labels: &'a [TextBlock],
    tolerance: u32,
) -> Option<&'a TextBlock> {
    let mut best: Option<(&TextBlock, f64, u32, u32)> = None;

    for label in labels.iter().filter(|l| label_qualifies(l, field, tolerance)) {
        let dx = field.x().abs_diff(label.x());
        let dy = field.y().abs_diff(label.y());
        let dist = (dx as f64).hypot(dy as f64);

        let closer = match best {
            None => true,
            Some((_, best_dist, best_dy, best_dx)) => dist
                .total_cmp(&best_dist)
                .then(dy.cmp(&best_dy))
                .then(dx.cmp(&best_dx))
                == Ordering::Less,
        };
        if closer {
            best = Some((label, dist, dy, dx));
        }
    }

    best.map(|(label, ..)| label)
}

/// Bind every fillable field to a value from the conversation.
///
/// Each box or text field takes its nearest caption, and the caption text is
/// looked up against citation facts, then the field-type keyword table, then
/// the transcript context. Lines and checkboxes are never bound.
pub fn bind(
    fields: &[GeometricElement],
    labels: &[TextBlock],
    entities: &TranscriptEntities,
    domain: &DomainFields,
    transcript: &str,
    config: &MatchConfig,
) -> BindingReport {
    let matcher = SemanticMatcher::new(entities, transcript).with_domain(domain);
    let mut report = BindingReport::default();

    for field in fields.iter().filter(|f| f.kind().is_fillable()) {
        let Some(label) = nearest_label(field, labels, config.label_tolerance) else {
            report.unbound.push(UnboundField {
                field: *field,
                label_text: None,
                reason: "no label above or left of the field".into(),
            });
            continue;
        };

        match matcher.lookup(label.text()) {
            Some(found) => {
                debug!(field = %field, label = label.text(), value = %found.value, rule = %found.rule, "field bound");
                report.bindings.push(FieldBinding::new(
                    *field,
                    label.text(),
                    found.value,
                    found.source.confidence(config),
                    found.rule,
                ));
            }
            None => report.unbound.push(UnboundField {
                field: *field,
                label_text: Some(label.text().to_string()),
                reason: format!("nothing in the conversation matches '{}'", label.text()),
            }),
        }
    }

    debug!(
        bound = report.bindings.len(),
        unbound = report.unbound.len(),
        "binding complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;
    use crate::transcript::{parse, parse_domain_conversation};

    fn label(text: &str, x: u32, y: u32) -> TextBlock {
        TextBlock::new(text, x, y, 60, 12, 90.0).unwrap()
    }

    fn field(kind: ElementKind, x: u32, y: u32) -> GeometricElement {
        GeometricElement::new(kind, x, y, 150, 25, 0.9).unwrap()
    }

    #[test]
    fn test_never_picks_label_below_or_right() {
        let f = field(ElementKind::TextField, 100, 100);
        // Below the tolerance band: very close but 21px under the top edge.
        let below = label("Below", 100, 121);
        // Starts past the right edge.
        let right = label("Right", 251, 100);
        let far_left = label("Far", 0, 0);

        let labels = vec![below.clone(), right.clone()];
        assert!(nearest_label(&f, &labels, 20).is_none());

        let labels = vec![below, right, far_left];
        assert_eq!(nearest_label(&f, &labels, 20).unwrap().text(), "Far");
    }

    #[test]
    fn test_label_at_tolerance_edge_qualifies() {
        let f = field(ElementKind::TextField, 100, 100);
        assert!(label_qualifies(&label("Edge", 250, 120), &f, 20));
    }

    #[test]
    fn test_nearest_label_wins() {
        let f = field(ElementKind::FieldBox, 200, 200);
        let labels = vec![label("Far", 0, 0), label("Near", 120, 195)];
        assert_eq!(nearest_label(&f, &labels, 20).unwrap().text(), "Near");
    }

    #[test]
    fn test_tie_prefers_smaller_vertical_offset() {
        let f = field(ElementKind::FieldBox, 100, 100);
        // Both exactly 50px away.
        let labels = vec![label("Above", 100, 50), label("Left", 50, 100)];
        assert_eq!(nearest_label(&f, &labels, 20).unwrap().text(), "Left");
    }

    #[test]
    fn test_exact_tie_keeps_first_label() {
        let f = field(ElementKind::FieldBox, 100, 100);
        let labels = vec![label("First", 60, 70), label("Second", 60, 70)];
        assert_eq!(nearest_label(&f, &labels, 20).unwrap().text(), "First");
    }

    #[test]
    fn test_bind_traffic_stop() {
        let transcript = "I'm Officer Martinez, badge number 5847. You were doing 45 in a 25 zone.";
        let entities = parse(transcript);
        let fields = vec![
            field(ElementKind::TextField, 150, 100),
            field(ElementKind::FieldBox, 150, 200),
            field(ElementKind::TextField, 150, 300),
        ];
        let labels = vec![
            label("Officer:", 20, 100),
            label("Badge:", 20, 200),
            label("Vehicle Color:", 20, 300),
        ];

        let domain = parse_domain_conversation(transcript);
        let report = bind(&fields, &labels, &entities, &domain, transcript, &MatchConfig::default());

        assert_eq!(report.bindings.len(), 2);
        assert_eq!(report.bindings[0].value(), "Martinez");
        assert_eq!(report.bindings[0].rule(), "officer");
        assert_eq!(report.bindings[0].confidence(), 0.8);
        assert_eq!(report.bindings[1].value(), "5847");
        assert_eq!(report.bindings[1].label_text(), "Badge:");

        assert_eq!(report.unbound.len(), 1);
        assert_eq!(report.unbound[0].label_text.as_deref(), Some("Vehicle Color:"));
        assert!((report.confidence_score() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_context_binding_has_lower_confidence() {
        let transcript = "The vehicle is a red truck.";
        let entities = parse(transcript);
        let fields = vec![field(ElementKind::TextField, 150, 100)];
        let labels = vec![label("Vehicle", 20, 100)];
        let domain = parse_domain_conversation(transcript);
        let report = bind(&fields, &labels, &entities, &domain, transcript, &MatchConfig::default());
        assert_eq!(report.bindings[0].value(), "a red truck");
        assert_eq!(report.bindings[0].confidence(), 0.5);
    }

    #[test]
    fn test_checkboxes_and_lines_are_not_bound() {
        let transcript = "badge number 5847";
        let entities = parse(transcript);
        let fields = vec![
            GeometricElement::new(ElementKind::Checkbox, 150, 100, 20, 20, 0.8).unwrap(),
            GeometricElement::new(ElementKind::HLine, 150, 130, 200, 2, 1.0).unwrap(),
        ];
        let labels = vec![label("Badge:", 20, 100)];
        let domain = parse_domain_conversation(transcript);
        let report = bind(&fields, &labels, &entities, &domain, transcript, &MatchConfig::default());
        assert_eq!(report.total_fields(), 0);
    }

    #[test]
    fn test_field_without_label_is_unbound() {
        let entities = TranscriptEntities::default();
        let fields = vec![field(ElementKind::FieldBox, 10, 10)];
        let labels = vec![label("Name:", 500, 500)];
        let domain = DomainFields::default();
        let report = bind(&fields, &labels, &entities, &domain, "", &MatchConfig::default());
        assert!(report.bindings.is_empty());
        assert!(report.unbound[0].label_text.is_none());
    }

    #[test]
    fn test_bind_uses_given_domain_facts() {
        // The facts come from the caller, not from re-reading the transcript.
        let transcript = "badge number 5847";
        let entities = parse(transcript);
        let domain = DomainFields {
            badge_number: Some("1200".into()),
            ..Default::default()
        };
        let fields = vec![field(ElementKind::FieldBox, 150, 100)];
        let labels = vec![label("Badge:", 20, 100)];

        let report = bind(&fields, &labels, &entities, &domain, transcript, &MatchConfig::default());
        assert_eq!(report.bindings[0].value(), "1200");
        assert_eq!(report.bindings[0].rule(), "badge");
    }
}
