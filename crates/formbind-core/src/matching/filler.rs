use super::outcome::{FieldOutcome, FieldResult, FillReport};
use super::semantic::{SemanticMatch, SemanticMatcher};
use crate::error::FormBindError;
use crate::transcript::TranscriptEntities;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

static UNDERSCORE_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{3,}").expect("valid underscore pattern"));
static BRACKET_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\]").expect("valid bracket pattern"));

/// Where a field's text lives in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldLocation {
    Paragraph { index: usize },
    TableCell { table: usize, row: usize, cell: usize },
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocation::Paragraph { index } => write!(f, "paragraph {index}"),
            FieldLocation::TableCell { table, row, cell } => {
                write!(f, "table {table} row {row} cell {cell}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFieldKind {
    #[default]
    Text,
    Checkbox,
}

/// A labelled blank in a form template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    pub label: String,
    #[serde(default)]
    pub kind: TemplateFieldKind,
    pub location: FieldLocation,
}

/// A document the filler can read and write text in.
pub trait FormDocument {
    fn text_at(&self, location: &FieldLocation) -> Result<&str, FormBindError>;

    fn set_text(&mut self, location: &FieldLocation, text: String) -> Result<(), FormBindError>;
}

/// In-memory form made of paragraphs and tables of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDocument {
    #[serde(default)]
    pub paragraphs: Vec<String>,
    /// `tables[t][row][cell]`
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,
}

impl TemplateDocument {
    fn slot(&mut self, location: &FieldLocation) -> Option<&mut String> {
        match *location {
            FieldLocation::Paragraph { index } => self.paragraphs.get_mut(index),
            FieldLocation::TableCell { table, row, cell } => self
                .tables
                .get_mut(table)
                .and_then(|t| t.get_mut(row))
                .and_then(|r| r.get_mut(cell)),
        }
    }

    /// Find blanks written as underscores or `[ ]` and the caption next to them.
    ///
    /// A paragraph's caption is its own text without the blank. A table cell
    /// holding only a blank takes the caption from the cell to its left.
    pub fn detect_fields(&self) -> Vec<TemplateField> {
        let mut fields = Vec::new();

        for (index, text) in self.paragraphs.iter().enumerate() {
            if let Some((label, kind)) = blank_in(text) {
                if !label.is_empty() {
                    fields.push(TemplateField {
                        label,
                        kind,
                        location: FieldLocation::Paragraph { index },
                    });
                }
            }
        }

        for (table, rows) in self.tables.iter().enumerate() {
            for (row, cells) in rows.iter().enumerate() {
                for (cell, text) in cells.iter().enumerate() {
                    let Some((mut label, kind)) = blank_in(text) else {
                        continue;
                    };
                    if label.is_empty() && cell > 0 {
                        label = cells[cell - 1].trim().to_string();
                    }
                    if !label.is_empty() {
                        fields.push(TemplateField {
                            label,
                            kind,
                            location: FieldLocation::TableCell { table, row, cell },
                        });
                    }
                }
            }
        }

        fields
    }
}

fn blank_in(text: &str) -> Option<(String, TemplateFieldKind)> {
    let kind = if UNDERSCORE_BLANK.is_match(text) {
        TemplateFieldKind::Text
    } else if BRACKET_BLANK.is_match(text) {
        TemplateFieldKind::Checkbox
    } else {
        return None;
    };
    let stripped = UNDERSCORE_BLANK.replace_all(text, "");
    let stripped = BRACKET_BLANK.replace_all(&stripped, "");
    Some((stripped.trim().to_string(), kind))
}

impl FormDocument for TemplateDocument {
    fn text_at(&self, location: &FieldLocation) -> Result<&str, FormBindError> {
        let text = match *location {
            FieldLocation::Paragraph { index } => self.paragraphs.get(index),
            FieldLocation::TableCell { table, row, cell } => self
                .tables
                .get(table)
                .and_then(|t| t.get(row))
                .and_then(|r| r.get(cell)),
        };
        text.map(String::as_str)
            .ok_or_else(|| FormBindError::InvalidInput(format!("{location} does not exist")))
    }

    fn set_text(&mut self, location: &FieldLocation, text: String) -> Result<(), FormBindError> {
        let slot = self
            .slot(location)
            .ok_or_else(|| FormBindError::InvalidInput(format!("{location} does not exist")))?;
        *slot = text;
        Ok(())
    }
}

/// Text of a slot after writing `value` into it.
///
/// The first underscore run is replaced; otherwise a `[ ]` is ticked for
/// checkboxes or replaced by the value for other fields; otherwise the value
/// is appended after the existing text.
pub fn fill_text(original: &str, value: &str, kind: TemplateFieldKind) -> String {
    if UNDERSCORE_BLANK.is_match(original) {
        return UNDERSCORE_BLANK.replacen(original, 1, NoExpand(value)).into_owned();
    }
    if BRACKET_BLANK.is_match(original) {
        let replacement = match kind {
            TemplateFieldKind::Checkbox => "[X]",
            TemplateFieldKind::Text => value,
        };
        return BRACKET_BLANK.replacen(original, 1, NoExpand(replacement)).into_owned();
    }
    if original.is_empty() {
        value.to_string()
    } else {
        format!("{original} {value}")
    }
}

/// Fills form templates from a conversation using label semantics only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormFiller;

impl FormFiller {
    pub fn new() -> Self {
        Self
    }

    /// Value for one label, from the keyword table or the transcript context.
    pub fn match_field(
        &self,
        label: &str,
        entities: &TranscriptEntities,
        transcript: &str,
    ) -> Option<SemanticMatch> {
        SemanticMatcher::new(entities, transcript).lookup(label)
    }

    /// Write a value into every field that has one.
    ///
    /// A field whose location does not exist in the document is reported as
    /// unfilled and the remaining fields are still processed.
    pub fn fill_form<D: FormDocument + ?Sized>(
        &self,
        document: &mut D,
        fields: &[TemplateField],
        entities: &TranscriptEntities,
        transcript: &str,
    ) -> FillReport {
        let matcher = SemanticMatcher::new(entities, transcript);
        let mut results = Vec::with_capacity(fields.len());

        for field in fields {
            let outcome = match matcher.lookup(&field.label) {
                None => FieldOutcome::Unfilled {
                    reason: "no matching value in the conversation".into(),
                },
                Some(found) => match apply(document, field, &found.value) {
                    Ok(()) => FieldOutcome::Filled {
                        value: found.value,
                        rule: found.rule,
                    },
                    Err(e) => {
                        warn!(label = %field.label, error = %e, "field not filled");
                        FieldOutcome::Unfilled {
                            reason: e.to_string(),
                        }
                    }
                },
            };
            results.push(FieldResult {
                label: field.label.clone(),
                outcome,
            });
        }

        let report = FillReport::from_results(results);
        debug!(
            filled = report.filled_count,
            total = report.total_fields,
            "form filled"
        );
        report
    }
}

fn apply<D: FormDocument + ?Sized>(
    document: &mut D,
    field: &TemplateField,
    value: &str,
) -> Result<(), FormBindError> {
    let to_field_error = |e: FormBindError| FormBindError::FieldApply {
        label: field.label.clone(),
        reason: e.to_string(),
    };
    let original = document.text_at(&field.location).map_err(to_field_error)?;
    let updated = fill_text(original, value, field.kind);
    document
        .set_text(&field.location, updated)
        .map_err(to_field_error)
}
