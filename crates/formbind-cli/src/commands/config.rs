use formbind_core::config::builtin::{self, PRESETS};
use formbind_core::config::load_config;
use formbind_core::error::FormBindError;
use std::path::Path;

use crate::output;

pub fn list() -> Result<(), FormBindError> {
    println!("Available predefined configurations:\n");
    for name in PRESETS {
        let config = builtin::load_preset(name)?;
        println!("  {:<8} {}", name, config.name);
        if let Some(ref desc) = config.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), FormBindError> {
    let config = builtin::load_preset(preset)?;
    output::json::print(&config)
}

pub fn validate(file: &Path) -> Result<(), FormBindError> {
    let config = load_config(file)?;
    println!("Valid configuration: {}", config.name);
    let s = &config.structure;
    println!(
        "  checkboxes {}-{} px, boxes wider than {} px and {}-{} px tall",
        s.checkbox_min_size, s.checkbox_max_size, s.box_min_width, s.box_min_height, s.box_max_height
    );
    println!(
        "  OCR confidence floor {}, label tolerance {} px",
        config.layout.min_ocr_confidence, config.matching.label_tolerance
    );
    Ok(())
}
