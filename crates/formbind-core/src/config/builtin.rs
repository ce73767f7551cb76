use crate::config::schema::EngineConfig;
use crate::config::validate_config;
use crate::error::FormBindError;

const DEFAULT_JSON: &str = include_str!("../../../../presets/default.json");
const HIRES_JSON: &str = include_str!("../../../../presets/hires.json");

/// Available predefined engine configurations.
pub const PRESETS: &[&str] = &["default", "hires"];

/// Load a predefined configuration by name.
pub fn load_preset(name: &str) -> Result<EngineConfig, FormBindError> {
    let json = match name {
        "default" => DEFAULT_JSON,
        "hires" => HIRES_JSON,
        _ => {
            return Err(FormBindError::ConfigInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_preset_matches_defaults() {
        let cfg = load_preset("default").unwrap();
        let defaults = EngineConfig::default();
        assert_eq!(cfg.structure, defaults.structure);
        assert_eq!(cfg.layout, defaults.layout);
        assert_eq!(cfg.matching, defaults.matching);
    }

    #[test]
    fn test_hires_scales_checkbox_band() {
        let cfg = load_preset("hires").unwrap();
        assert_eq!(cfg.structure.checkbox_min_size, 30);
        assert_eq!(cfg.structure.checkbox_max_size, 80);
        assert_eq!(cfg.layout.line_gap, 20);
    }

    #[test]
    fn test_all_presets_load() {
        for name in PRESETS {
            assert!(load_preset(name).is_ok(), "preset {name} failed");
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}
