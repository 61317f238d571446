// * Field Extractor
// * Maps one candidate block onto listing fields using line position and the
// * pattern library. Never fails: a field that cannot be derived is empty.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use super::normalizer::normalize_fragment;
use super::patterns::{self, ContactKind};
use super::segmenter::{BlockKind, CandidateBlock};
use crate::config::constants::{
    CARD_DESCRIPTION_MIN_CHARS, CARD_DESCRIPTION_WINDOW, CARD_HEADER_SCAN_LINES, MAX_HEADER_CHARS,
    MIN_NAME_CHARS, MIN_PRODUCT_CHARS,
};
use crate::config::ExtractionConfig;

// * "Productos:" label up to the next block boundary in raw card markup
static PATTERN_PRODUCTS_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:productos|products)\s*:(.*?)(?:</div\s*>|</table\s*>|<hr\b[^>]*>|<br\s*/?>\s*<br\s*/?>|\z)",
    )
    .expect("Invalid products fragment regex")
});

// * Bullets, newlines, and " - " dash bullets separate product entries
static PATTERN_PRODUCT_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)[\n•·▪●]|(?:^|\s)-\s+").expect("Invalid product split regex")
});

// * Public suffix labels that sit between the company label and a ccTLD (acme.com.mx)
const SECOND_LEVEL_SUFFIXES: &[&str] = &["com", "org", "net", "gob", "gov", "edu", "co", "ac"];

/// Fields derived from one block, before classification and assembly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub company_name: String,
    pub description: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub websites: Vec<String>,
    pub whatsapp: Vec<String>,
    pub address: String,
    pub products: Vec<String>,
}

/// Header line located inside a block
struct Header {
    index: Option<usize>,
    name: String,
}

/// Extracts listing fields from candidate blocks
pub struct FieldExtractor {
    config: ExtractionConfig,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extracts every field of `block`
    pub fn extract(&self, block: &CandidateBlock) -> ExtractedFields {
        let emails = patterns::extract_unique(ContactKind::Email, &block.text);
        let phones = patterns::extract_unique(ContactKind::Phone, &block.text);
        let websites = patterns::extract_unique(ContactKind::Website, &block.text);

        let header = match block.kind {
            BlockKind::Text => self.text_header(&block.lines),
            BlockKind::Card => self.card_header(block),
        };

        let description_range = match block.kind {
            BlockKind::Text => text_description_range(&block.lines, header.index),
            BlockKind::Card => card_description_range(&block.lines, header.index),
        };
        let description = join_lines(&block.lines, description_range.clone(), block.kind);

        let company_name = if header.name.is_empty() {
            self.name_from_domains(&websites, &emails, &block.text)
        } else {
            header.name
        };

        let mut consumed = description_range;
        if let Some(index) = header.index {
            consumed.start = consumed.start.min(index);
        }

        let tail_lines = match block.kind {
            BlockKind::Text => self.config.gap_address_lines,
            BlockKind::Card => self.config.card_address_lines,
        };
        let address = self.address(&block.lines, &consumed, header.index, tail_lines);

        let products = match (block.kind, block.markup.as_deref()) {
            (BlockKind::Card, Some(markup)) => self.products(markup),
            _ => Vec::new(),
        };

        ExtractedFields {
            company_name,
            description,
            whatsapp: patterns::whatsapp_numbers(&block.lines),
            emails,
            phones,
            websites,
            address,
            products,
        }
    }

    // * Text blocks: first line that is not a label and carries no contact data
    fn text_header(&self, lines: &[String]) -> Header {
        let found = lines.iter().enumerate().find(|(_, line)| {
            !patterns::is_strict_label(line)
                && !patterns::contains_email(line)
                && !patterns::contains_url(line)
                && line.chars().any(char::is_alphabetic)
                && line.chars().count() > MIN_NAME_CHARS
        });

        match found {
            Some((index, line)) => Header {
                index: Some(index),
                name: title_case(line),
            },
            None => Header { index: None, name: String::new() },
        }
    }

    // * Cards: the line just before the first label, else the first plausible line,
    // * else the first emphasized text. A card that opens with a label has no
    // * header line; whatever follows the labels is contact data.
    fn card_header(&self, block: &CandidateBlock) -> Header {
        let lines = &block.lines;
        let scan = &lines[..lines.len().min(CARD_HEADER_SCAN_LINES)];
        let boundary = scan.iter().position(|line| patterns::is_broad_label(line));

        let index = match boundary {
            Some(b) if b > 0 => {
                let before = (0..b).rev();
                before
                    .clone()
                    .find(|&i| self.is_plausible_header(&lines[i]) && lines[i].chars().count() <= CARD_DESCRIPTION_MIN_CHARS)
                    .or_else(|| before.clone().find(|&i| self.is_plausible_header(&lines[i])))
            }
            Some(_) => None,
            None => scan.iter().position(|line| self.is_plausible_header(line)),
        };

        if let Some(i) = index {
            let name = self.strip_cta_suffix(&lines[i]);
            if !name.is_empty() {
                return Header { index: Some(i), name: title_case(&name) };
            }
        }

        let emphasized = block
            .emphasis
            .as_deref()
            .map(|text| self.strip_cta_suffix(text))
            .filter(|text| !text.is_empty() && !patterns::contains_email(text) && !patterns::contains_url(text));

        match emphasized {
            Some(text) => Header {
                index: lines.iter().position(|line| *line == text),
                name: title_case(&text),
            },
            None => Header { index: None, name: String::new() },
        }
    }

    fn is_plausible_header(&self, line: &str) -> bool {
        let len = line.chars().count();
        len > MIN_NAME_CHARS
            && len <= MAX_HEADER_CHARS
            && !self.config.is_cta_label(line)
            && !patterns::is_broad_label(line)
            && !patterns::contains_email(line)
            && !patterns::contains_url(line)
            && line.chars().any(char::is_alphabetic)
    }

    /// Removes a trailing call-to-action ("ACME WATER Cotizar" -> "ACME WATER").
    /// The label must start on a word boundary, so "Misquote" is left alone.
    fn strip_cta_suffix(&self, text: &str) -> String {
        let mut name = text.trim().to_string();
        for label in &self.config.cta_labels {
            let label = label.to_lowercase();
            let label_chars = label.chars().count();
            if label_chars == 0 {
                continue;
            }
            let Some((cut, _)) = name.char_indices().rev().nth(label_chars - 1) else {
                continue;
            };
            let at_word_start = !name[..cut].chars().last().is_some_and(char::is_alphanumeric);
            if at_word_start && name[cut..].to_lowercase() == label {
                name.truncate(cut);
                name = name.trim_end_matches([' ', '|', '-', '·']).trim().to_string();
            }
        }
        name
    }

    // * Name fallback chain: website host, then email domain, then any domain-like text
    fn name_from_domains(&self, websites: &[String], emails: &[String], text: &str) -> String {
        let from_site = websites.first().and_then(|site| host_of(site));
        let from_email = emails
            .first()
            .and_then(|email| email.split('@').nth(1))
            .map(str::to_string);
        let from_text = patterns::first_domain_like(text).map(str::to_string);

        [from_site, from_email, from_text]
            .into_iter()
            .flatten()
            .find_map(|domain| self.company_from_domain(&domain))
            .unwrap_or_default()
    }

    /// Title-cased second-level label of `domain`; None for generic mailbox providers
    pub fn company_from_domain(&self, domain: &str) -> Option<String> {
        let label = second_level_label(domain)?;
        if self.config.is_generic_domain(&label) {
            return None;
        }
        let name = title_case(&label.replace(['-', '_'], " "));
        (!name.is_empty()).then_some(name)
    }

    fn address(&self, lines: &[String], consumed: &Range<usize>, header: Option<usize>, tail: usize) -> String {
        let start = lines.len().saturating_sub(tail);
        let parts: Vec<&str> = lines
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(i, _)| !consumed.contains(i) && Some(*i) != header)
            .map(|(_, line)| line.as_str())
            .filter(|line| {
                !patterns::is_broad_label(line)
                    && !patterns::contains_email(line)
                    && !patterns::contains_url(line)
                    && !self.config.is_cta_label(line)
            })
            .map(patterns::strip_address_label)
            .filter(|line| !line.is_empty())
            .collect();

        let joined = parts.join(" ");
        if is_address(&joined) {
            joined
        } else {
            String::new()
        }
    }

    /// Product entries listed after a "Productos:" label in card markup
    pub fn products(&self, markup: &str) -> Vec<String> {
        let Some(fragment) = PATTERN_PRODUCTS_FRAGMENT.captures(markup).and_then(|c| c.get(1)) else {
            return Vec::new();
        };

        let text = normalize_fragment(fragment.as_str());
        let entries = PATTERN_PRODUCT_SPLIT
            .split(&text)
            .map(|entry| entry.trim().trim_matches(['-', '*', ',', ';', ' ']).trim().to_string())
            .filter(|entry| entry.chars().count() >= MIN_PRODUCT_CHARS)
            .filter(|entry| !self.config.is_cta_label(entry));

        let mut products = patterns::dedup_preserving_order(entries);
        products.truncate(self.config.max_products);
        products
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn text_description_range(lines: &[String], header: Option<usize>) -> Range<usize> {
    let start = header.map_or(0, |i| i + 1);
    let end = lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| patterns::is_strict_label(line))
        .map_or(lines.len(), |(i, _)| i);
    start..end.max(start)
}

fn card_description_range(lines: &[String], header: Option<usize>) -> Range<usize> {
    let start = header.map_or(0, |i| i + 1).min(lines.len());
    let window_end = (start + CARD_DESCRIPTION_WINDOW).min(lines.len());
    let end = lines[start..window_end]
        .iter()
        .position(|line| patterns::is_broad_label(line))
        .map_or(window_end, |offset| start + offset);
    start..end
}

fn join_lines(lines: &[String], range: Range<usize>, kind: BlockKind) -> String {
    lines[range]
        .iter()
        .filter(|line| kind == BlockKind::Text || line.chars().count() > CARD_DESCRIPTION_MIN_CHARS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn is_address(text: &str) -> bool {
    !text.is_empty()
        && !text.contains('@')
        && (text.chars().any(|c| c.is_ascii_digit()) || patterns::has_postal_cue(text))
        && patterns::has_place_cue(text)
}

/// Lowercases, then capitalizes the first letter of every word
pub fn title_case(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_lowercase()
        .split_word_bounds()
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphanumeric() => first.to_uppercase().chain(chars).collect(),
                _ => segment.to_string(),
            }
        })
        .collect()
}

/// Hostname of a URL or bare "www." address, without the www prefix
fn host_of(site: &str) -> Option<String> {
    let with_scheme = if site.to_lowercase().starts_with("http") {
        site.to_string()
    } else {
        format!("http://{site}")
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.trim_start_matches("www.").to_string())
}

/// The label left of the registrable suffix: acme.com -> acme, ventas.acme.com.mx -> acme
pub fn second_level_label(domain: &str) -> Option<String> {
    let domain = domain.trim().to_lowercase();
    let domain = domain.trim_start_matches("www.");
    let parts: Vec<&str> = domain.split('.').filter(|p| !p.is_empty()).collect();

    let label = match parts.len() {
        0 => return None,
        1 | 2 => parts[0],
        n => {
            let tld = parts[n - 1];
            let sld = parts[n - 2];
            if tld.len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&sld) {
                parts[n - 3]
            } else {
                sld
            }
        }
    };
    (!label.is_empty()).then(|| label.to_string())
}
