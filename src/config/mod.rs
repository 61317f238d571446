// * Extraction configuration
// * Thresholds and site-specific keyword data, swappable at runtime via JSON.

pub mod constants;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown segment mode \"{0}\" (expected gap, card or auto)")]
    UnknownMode(String),
}

/// Block segmentation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Split normalized text on blank-line runs
    Gap,
    /// Detect repeating DOM cards
    Card,
    /// Card detection unless the blank-line split finds more blocks
    #[default]
    Auto,
}

impl SegmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentMode::Gap => "gap",
            SegmentMode::Card => "card",
            SegmentMode::Auto => "auto",
        }
    }
}

impl fmt::Display for SegmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gap" | "text" => Ok(SegmentMode::Gap),
            "card" | "dom" => Ok(SegmentMode::Card),
            "auto" => Ok(SegmentMode::Auto),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// One topical label and the keywords that select it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl FitRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Configuration for one extraction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: SegmentMode,
    /// Path segment preceding the category in the source URL
    pub category_marker: String,
    pub cta_labels: Vec<String>,
    pub generic_domains: Vec<String>,
    /// Checked in order; first hit wins
    pub fit_rules: Vec<FitRule>,
    pub default_fit_label: String,
    pub min_card_text_chars: usize,
    pub max_products: usize,
    pub gap_address_lines: usize,
    pub card_address_lines: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: SegmentMode::default(),
            category_marker: DEFAULT_CATEGORY_MARKER.to_string(),
            cta_labels: DEFAULT_CTA_LABELS.iter().map(|s| s.to_string()).collect(),
            generic_domains: GENERIC_MAILBOX_DOMAINS.iter().map(|s| s.to_string()).collect(),
            fit_rules: vec![
                FitRule::new(MEMBRANE_LABEL, MEMBRANE_KEYWORDS),
                FitRule::new(TUBING_LABEL, TUBING_KEYWORDS),
            ],
            default_fit_label: DEFAULT_FIT_LABEL.to_string(),
            min_card_text_chars: MIN_CARD_TEXT_CHARS,
            max_products: MAX_PRODUCTS,
            gap_address_lines: GAP_ADDRESS_TAIL_LINES,
            card_address_lines: CARD_ADDRESS_TAIL_LINES,
        }
    }
}

impl ExtractionConfig {
    /// Parses a JSON document; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn with_mode(mut self, mode: SegmentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_cta_label(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        self.cta_labels.iter().any(|label| label.to_lowercase() == text)
    }

    pub fn is_generic_domain(&self, label: &str) -> bool {
        self.generic_domains.iter().any(|g| g.eq_ignore_ascii_case(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_order() {
        let config = ExtractionConfig::default();
        assert_eq!(config.fit_rules[0].label, MEMBRANE_LABEL);
        assert_eq!(config.fit_rules[1].label, TUBING_LABEL);
        assert_eq!(config.mode, SegmentMode::Auto);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExtractionConfig::from_json_str(r#"{"mode": "gap", "category_marker": "dir"}"#).unwrap();
        assert_eq!(config.mode, SegmentMode::Gap);
        assert_eq!(config.category_marker, "dir");
        assert_eq!(config.max_products, MAX_PRODUCTS);
        assert!(config.is_generic_domain("gmail"));
    }

    #[test]
    fn test_invalid_json() {
        let result = ExtractionConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ExtractionConfig::from_json_file("/nonexistent/listing-config.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Card".parse::<SegmentMode>().unwrap(), SegmentMode::Card);
        assert_eq!("gap".parse::<SegmentMode>().unwrap(), SegmentMode::Gap);
        assert!("grid".parse::<SegmentMode>().is_err());
    }

    #[test]
    fn test_cta_label_match() {
        let config = ExtractionConfig::default();
        assert!(config.is_cta_label("  COTIZAR "));
        assert!(config.is_cta_label("Solicitar Cotización"));
        assert!(!config.is_cta_label("Cotizar ahora"));
    }
}
