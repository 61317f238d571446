// * Classifier
// * Page category from the source URL, language guess and topical fit label.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

use super::patterns;
use crate::config::constants::DEFAULT_CATEGORY;
use crate::config::{ExtractionConfig, FitRule};

// * Keywords this short ("uf", "ro") would hit inside unrelated words
const WHOLE_WORD_MAX_CHARS: usize = 3;

/// Binary language guess for a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Es,
    #[default]
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Es => "es",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns category, language, and fit labels
pub struct Classifier {
    category_pattern: Option<Regex>,
    fit_rules: Vec<FitRule>,
    default_fit_label: String,
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_config(&ExtractionConfig::default())
    }

    pub fn with_config(config: &ExtractionConfig) -> Self {
        let source = format!(
            r"(?i)/{}/([^/?#]+?)\d*\.html",
            regex::escape(config.category_marker.trim_matches('/'))
        );
        let category_pattern = match Regex::new(&source) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(marker = %config.category_marker, error = %e, "Category pattern rejected; every page is uncategorized");
                None
            }
        };

        Self {
            category_pattern,
            fit_rules: config.fit_rules.clone(),
            default_fit_label: config.default_fit_label.clone(),
        }
    }

    /// Path segment between the directory marker and `.html`, trailing digits dropped
    pub fn category(&self, url: &str) -> String {
        self.category_pattern
            .as_ref()
            .and_then(|pattern| pattern.captures(url))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }

    pub fn lang(&self, text: &str) -> Lang {
        if patterns::has_spanish_chars(text) {
            Lang::Es
        } else {
            Lang::En
        }
    }

    /// First rule with a keyword in the description (block text when the description is empty)
    pub fn fit_hint(&self, description: &str, block_text: &str) -> String {
        let source = if description.trim().is_empty() { block_text } else { description };
        let haystack = source.to_lowercase();
        let words: HashSet<&str> = haystack.unicode_words().collect();

        let matches = |keyword: &String| {
            let short = keyword.chars().count() <= WHOLE_WORD_MAX_CHARS && !keyword.contains(char::is_whitespace);
            if short {
                words.contains(keyword.as_str())
            } else {
                haystack.contains(keyword.as_str())
            }
        };

        self.fit_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(matches))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| self.default_fit_label.clone())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::{DEFAULT_FIT_LABEL, MEMBRANE_LABEL, TUBING_LABEL};

    #[test]
    fn test_category_drops_trailing_digits() {
        let classifier = Classifier::new();
        assert_eq!(classifier.category("https://directorio.mx/dap/filtracion3.html"), "filtracion");
        assert_eq!(classifier.category("https://directorio.mx/dap/bombas.html?p=2"), "bombas");
    }

    #[test]
    fn test_category_unknown() {
        let classifier = Classifier::new();
        assert_eq!(classifier.category("https://directorio.mx/empresas/filtros.html"), "unknown");
        assert_eq!(classifier.category("not a url"), "unknown");
    }

    #[test]
    fn test_category_custom_marker() {
        let config = ExtractionConfig {
            category_marker: "rubro".to_string(),
            ..Default::default()
        };
        let classifier = Classifier::with_config(&config);
        assert_eq!(classifier.category("http://x.com/rubro/tuberias12.html"), "tuberias");
    }

    #[test]
    fn test_spanish_osmosis_example() {
        let classifier = Classifier::new();
        let description = "Sistema de ósmosis inversa para agua potable";
        assert_eq!(classifier.lang(description), Lang::Es);
        assert_eq!(classifier.fit_hint(description, ""), MEMBRANE_LABEL);
    }

    #[test]
    fn test_english_without_accents() {
        assert_eq!(Classifier::new().lang("Purifies industrial water."), Lang::En);
    }

    #[test]
    fn test_membrane_wins_over_tubing() {
        let classifier = Classifier::new();
        let description = "Mangueras grado alimenticio y membranas de ultrafiltración";
        assert_eq!(classifier.fit_hint(description, ""), MEMBRANE_LABEL);
    }

    #[test]
    fn test_tubing_and_default() {
        let classifier = Classifier::new();
        assert_eq!(classifier.fit_hint("Food-grade PTFE hoses", ""), TUBING_LABEL);
        assert_eq!(classifier.fit_hint("Bombas centrífugas", ""), DEFAULT_FIT_LABEL);
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        let classifier = Classifier::new();
        // * "ro" inside "carro" and "uf" inside "bufete" must not count
        assert_eq!(classifier.fit_hint("Refacciones para carro y bufete", ""), DEFAULT_FIT_LABEL);
        assert_eq!(classifier.fit_hint("Equipos RO y UF", ""), MEMBRANE_LABEL);
    }

    #[test]
    fn test_empty_description_uses_block_text() {
        let classifier = Classifier::new();
        assert_eq!(classifier.fit_hint("  ", "ACME\nÓsmosis inversa\nTel: 555-1234"), MEMBRANE_LABEL);
    }

    #[test]
    fn test_lang_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Lang::Es).unwrap(), "\"es\"");
    }
}
