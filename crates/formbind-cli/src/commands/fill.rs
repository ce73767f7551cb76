use formbind_core::error::FormBindError;
use formbind_core::matching::{FormFiller, TemplateDocument, TemplateField};
use formbind_core::transcript;
use std::path::{Path, PathBuf};

use super::read_transcript;
use crate::output;

pub fn run(
    template_file: &Path,
    fields_file: Option<&Path>,
    transcript_file: &Path,
    out: Option<PathBuf>,
    output_format: &str,
) -> Result<(), FormBindError> {
    let mut document: TemplateDocument =
        serde_json::from_str(&std::fs::read_to_string(template_file)?)?;
    let fields: Vec<TemplateField> = match fields_file {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => document.detect_fields(),
    };
    if fields.is_empty() {
        eprintln!("No fillable fields found in {}", template_file.display());
    }

    let text = read_transcript(transcript_file)?.text;
    let entities = transcript::parse(&text);
    let report = FormFiller::new().fill_form(&mut document, &fields, &entities, &text);

    if let Some(path) = &out {
        std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
        eprintln!(
            "Filled {} of {} field(s), written to {}",
            report.filled_count,
            report.total_fields,
            path.display()
        );
    }

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_fill(&report),
    }
    Ok(())
}
