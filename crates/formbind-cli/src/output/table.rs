use formbind_core::jobs::JobRecord;
use formbind_core::matching::{FieldOutcome, FillReport};
use formbind_core::model::{ElementKind, GeometricElement};
use formbind_core::structure::FormStructure;
use formbind_core::text::{group_into_lines, TextClassification};
use formbind_core::trace::TraceSeverity;
use formbind_core::transcript::{DomainFields, TranscriptEntities};
use formbind_core::FormResult;

const KINDS: &[(ElementKind, &str)] = &[
    (ElementKind::HLine, "Horizontal lines"),
    (ElementKind::VLine, "Vertical lines"),
    (ElementKind::FieldBox, "Boxes"),
    (ElementKind::Checkbox, "Checkboxes"),
    (ElementKind::TextField, "Text fields"),
];

fn element_row(el: &GeometricElement) -> String {
    format!(
        "({:>5}, {:>5})  {:>5} x {:<5}  {:.2}",
        el.x(),
        el.y(),
        el.width(),
        el.height(),
        el.confidence()
    )
}

pub fn print_structure(structure: &FormStructure) {
    println!(
        "=== Form structure ({} x {}) ===\n",
        structure.image_width, structure.image_height
    );
    for (kind, title) in KINDS {
        println!("  {:<18} {}", title, structure.count(*kind));
    }
    println!();

    let fillable: Vec<_> = structure.fillable().collect();
    if fillable.is_empty() {
        println!("  No fillable fields detected.");
        return;
    }
    println!("Fillable fields:");
    for el in fillable {
        println!("  {:<11} {}", el.kind().to_string(), element_row(el));
    }
}

pub fn print_classification(classification: &TextClassification, line_gap: u32) {
    println!("=== Labels ({}) ===\n", classification.labels.len());
    for line in group_into_lines(&classification.labels, line_gap) {
        println!("  y={:<5} {}", line.anchor_y, line.text());
    }
    println!();

    println!("=== Values ({}) ===\n", classification.values.len());
    for line in group_into_lines(&classification.values, line_gap) {
        println!("  y={:<5} {}", line.anchor_y, line.text());
    }
}

pub fn print_entities(entities: &TranscriptEntities, domain: &DomainFields) {
    println!("=== Entities ({}) ===\n", entities.len());
    if entities.is_empty() {
        println!("  (none)");
    }
    for entity in entities.entities() {
        println!("  {:<16} {}", entity.kind.to_string(), entity.value);
    }
    println!();

    let present = domain.present();
    if present.is_empty() {
        return;
    }
    println!("=== Citation ===\n");
    let width = present.iter().map(|(name, _)| name.len()).max().unwrap_or(10);
    for (name, value) in present {
        println!("  {:<width$}  {}", name, value, width = width);
    }
}

pub fn print_result(result: &FormResult, verbose: bool) {
    let report = &result.report;
    println!(
        "=== Bound {} of {} field(s), confidence {:.2} ===\n",
        report.bindings.len(),
        report.total_fields(),
        report.confidence_score()
    );

    if !report.bindings.is_empty() {
        let width = report
            .bindings
            .iter()
            .map(|b| b.label_text().len())
            .max()
            .unwrap_or(10);
        for b in &report.bindings {
            println!(
                "  {:<width$}  {}  ({}, {:.2})",
                b.label_text(),
                b.value(),
                b.rule(),
                b.confidence(),
                width = width
            );
        }
        println!();
    }

    if !report.unbound.is_empty() {
        println!("Unfilled:");
        for u in &report.unbound {
            let label = u.label_text.as_deref().unwrap_or("-");
            println!("  {} at {}  {}", label, u.field, u.reason);
        }
        println!();
    }

    if verbose {
        println!("Decisions:");
        for d in &result.trace.decisions {
            println!("  [{}] {}", d.decision_id, d.reason);
            for step in &d.steps {
                println!("      {}", step.message);
            }
        }
        println!();
    }

    for w in &result.trace.warnings {
        let marker = match w.severity {
            TraceSeverity::Critical => "!!",
            TraceSeverity::Important => "! ",
            TraceSeverity::Info => "  ",
        };
        println!("{marker} {}", w.message);
    }
}

pub fn print_fill(report: &FillReport) {
    println!(
        "=== Filled {} of {} field(s), confidence {:.2} ===\n",
        report.filled_count, report.total_fields, report.confidence_score
    );
    let width = report.fields.iter().map(|f| f.label.len()).max().unwrap_or(10);
    for field in &report.fields {
        match &field.outcome {
            FieldOutcome::Filled { value, rule } => {
                println!("  {:<width$}  {}  ({})", field.label, value, rule, width = width)
            }
            FieldOutcome::Unfilled { reason } => {
                println!("  {:<width$}  --  {}", field.label, reason, width = width)
            }
        }
    }
}

pub fn print_jobs(records: &[JobRecord]) {
    for record in records {
        match (&record.outcome, &record.error) {
            (Some(outcome), _) => println!(
                "  {}  {:<10} {}/{} field(s) -> {}",
                record.id,
                record.status.to_string(),
                outcome.bound_fields,
                outcome.total_fields,
                outcome.output.display()
            ),
            (None, Some(error)) => {
                println!("  {}  {:<10} {}", record.id, record.status.to_string(), error)
            }
            (None, None) => println!("  {}  {}", record.id, record.status),
        }
    }
}
