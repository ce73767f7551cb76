use formbind_core::collaborators::{filter_by_confidence, Binarizer, GlobalThreshold, JsonBlocksOcr};
use formbind_core::error::FormBindError;
use formbind_core::structure::StructureDetector;
use formbind_core::text;
use std::path::Path;

use super::engine_config;
use crate::output;

pub fn run(
    image: &Path,
    preset: &str,
    config_file: Option<&Path>,
    output_format: &str,
) -> Result<(), FormBindError> {
    let config = engine_config(preset, config_file)?;
    let binary = GlobalThreshold::default().binarize(&image::open(image)?);
    let structure = StructureDetector::new(config.structure).analyze(&binary)?;

    match output_format {
        "json" => output::json::print(&structure)?,
        _ => output::table::print_structure(&structure),
    }
    Ok(())
}

pub fn classify(
    image: &Path,
    blocks_file: &Path,
    preset: &str,
    config_file: Option<&Path>,
    output_format: &str,
) -> Result<(), FormBindError> {
    let config = engine_config(preset, config_file)?;
    let binary = GlobalThreshold::default().binarize(&image::open(image)?);
    let structure = StructureDetector::new(config.structure.clone()).analyze(&binary)?;

    let blocks = JsonBlocksOcr::new(blocks_file).load()?;
    let total = blocks.len();
    let blocks = filter_by_confidence(blocks, config.layout.min_ocr_confidence);
    if blocks.len() < total {
        eprintln!(
            "{} block(s) below OCR confidence {} dropped",
            total - blocks.len(),
            config.layout.min_ocr_confidence
        );
    }
    let classification = text::classify(&blocks, &structure.all_elements, &config.layout);

    match output_format {
        "json" => output::json::print(&classification)?,
        _ => output::table::print_classification(&classification, config.layout.line_gap),
    }
    Ok(())
}
