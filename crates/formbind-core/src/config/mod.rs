pub mod builtin;
pub mod schema;

use crate::error::FormBindError;
use schema::EngineConfig;
use std::path::Path;

/// Load an engine configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, FormBindError> {
    let content = std::fs::read_to_string(path).map_err(|e| FormBindError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an engine configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<EngineConfig, FormBindError> {
    let config: EngineConfig = serde_json::from_str(json).map_err(|e| FormBindError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an engine configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, FormBindError> {
    let config: EngineConfig = serde_json::from_str(json).map_err(FormBindError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is internally consistent.
pub fn validate_config(config: &EngineConfig) -> Result<(), FormBindError> {
    let s = &config.structure;

    if s.checkbox_min_size >= s.checkbox_max_size {
        return Err(FormBindError::ConfigInvalid(format!(
            "checkbox size band is empty ({}..{})",
            s.checkbox_min_size, s.checkbox_max_size
        )));
    }

    if !(s.checkbox_aspect_min > 0.0 && s.checkbox_aspect_min < s.checkbox_aspect_max) {
        return Err(FormBindError::ConfigInvalid(format!(
            "checkbox aspect range is invalid ({}..{})",
            s.checkbox_aspect_min, s.checkbox_aspect_max
        )));
    }

    if s.box_min_height >= s.box_max_height {
        return Err(FormBindError::ConfigInvalid(format!(
            "box height range is empty ({}..{})",
            s.box_min_height, s.box_max_height
        )));
    }

    if s.canny_low > s.canny_high {
        return Err(FormBindError::ConfigInvalid(
            "canny_low must not exceed canny_high".into(),
        ));
    }

    if !(s.angle_tolerance_deg > 0.0 && s.angle_tolerance_deg < 45.0) {
        return Err(FormBindError::ConfigInvalid(format!(
            "angle tolerance {} must be in (0, 45) degrees",
            s.angle_tolerance_deg
        )));
    }

    if s.min_line_length == 0 || s.field_height == 0 || s.text_strip_height == 0 {
        return Err(FormBindError::ConfigInvalid(
            "min_line_length, field_height and text_strip_height must be positive".into(),
        ));
    }

    for (name, value) in [
        ("checkbox_confidence", s.checkbox_confidence),
        ("box_confidence", s.box_confidence),
        ("text_field_confidence", s.text_field_confidence),
        ("keyword_confidence", config.matching.keyword_confidence),
        ("context_confidence", config.matching.context_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(FormBindError::ConfigInvalid(format!(
                "{name} {value} is outside [0, 1]"
            )));
        }
    }

    if config.matching.context_confidence > config.matching.keyword_confidence {
        return Err(FormBindError::ConfigInvalid(
            "context_confidence must not exceed keyword_confidence".into(),
        ));
    }

    if !(0.0..=100.0).contains(&config.layout.min_ocr_confidence) {
        return Err(FormBindError::ConfigInvalid(format!(
            "min_ocr_confidence {} is outside [0, 100]",
            config.layout.min_ocr_confidence
        )));
    }

    Ok(())
}
