// * Block Segmenter
// * Splits a page into candidate listing blocks. Two detection strategies sit
// * behind one trait: blank-line gaps in normalized text, and repeating DOM
// * cards found through CTA markers and telephone labels.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use super::normalizer::{normalize_element, normalize_html, to_lines};
use super::patterns;
use crate::config::{ExtractionConfig, SegmentMode};

static PATTERN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid gap regex"));

static SELECTOR_BODY_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body *").expect("Invalid body selector"));

static SELECTOR_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table, tr, div, li, article, section").expect("Invalid container selector")
});

static SELECTOR_EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b, strong").expect("Invalid emphasis selector"));

const CONTAINER_TAGS: &[&str] = &["table", "tr", "div", "li", "article", "section"];

/// Which strategy produced a block; the extractor reads the two differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Card,
}

/// One region of the page hypothesized to hold a single listing
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBlock {
    pub kind: BlockKind,
    /// Trimmed, non-empty lines in document order
    pub lines: Vec<String>,
    /// Full block text (lines joined with newlines)
    pub text: String,
    /// Raw inner markup of the card container
    pub markup: Option<String>,
    /// First bold/strong text inside the card
    pub emphasis: Option<String>,
}

impl CandidateBlock {
    pub fn from_text(text: &str) -> Self {
        let lines = to_lines(text);
        Self {
            kind: BlockKind::Text,
            text: lines.join("\n"),
            lines,
            markup: None,
            emphasis: None,
        }
    }
}

/// A block segmentation strategy
pub trait Segmenter: Send + Sync {
    fn mode(&self) -> SegmentMode;

    fn segment(&self, html: &str) -> Vec<CandidateBlock>;
}

/// Builds the segmenter selected by `config.mode`
pub fn segmenter_for(config: &ExtractionConfig) -> Box<dyn Segmenter> {
    match config.mode {
        SegmentMode::Gap => Box::new(GapSegmenter),
        SegmentMode::Card => Box::new(CardSegmenter::with_config(config)),
        SegmentMode::Auto => Box::new(AutoSegmenter::with_config(config)),
    }
}

// * Gap-based

/// Splits normalized text on runs of two or more newlines
#[derive(Debug, Clone, Copy, Default)]
pub struct GapSegmenter;

impl GapSegmenter {
    /// Splits already-normalized text; keeps blocks with a contact-label cue
    pub fn split_text(&self, normalized: &str) -> Vec<CandidateBlock> {
        let mut skipped = 0usize;
        let blocks: Vec<CandidateBlock> = PATTERN_GAP
            .split(normalized)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .filter(|chunk| {
                let keep = patterns::has_contact_cue(chunk);
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .map(CandidateBlock::from_text)
            .collect();

        debug!(blocks = blocks.len(), skipped, "Gap segmentation complete");
        blocks
    }
}

impl Segmenter for GapSegmenter {
    fn mode(&self) -> SegmentMode {
        SegmentMode::Gap
    }

    fn segment(&self, html: &str) -> Vec<CandidateBlock> {
        self.split_text(&normalize_html(html))
    }
}

// * Card-based

/// Finds repeating listing containers in the DOM
#[derive(Debug, Clone)]
pub struct CardSegmenter {
    cta_labels: Vec<String>,
    min_card_chars: usize,
}

impl CardSegmenter {
    pub fn with_config(config: &ExtractionConfig) -> Self {
        Self {
            cta_labels: config.cta_labels.iter().map(|l| l.to_lowercase()).collect(),
            min_card_chars: config.min_card_text_chars,
        }
    }

    /// Returns the card containers of `document` in document order
    pub fn detect_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut candidates: Vec<ElementRef<'a>> = Vec::new();

        let markers = self.cta_markers(document);
        let cta_cards = self.cta_candidates(&markers);
        let tel_cards = self.tel_candidates(document, &markers, &cta_cards);
        debug!(cta = cta_cards.len(), tel = tel_cards.len(), "Card detectors finished");

        for card in cta_cards.into_iter().chain(tel_cards) {
            if !candidates.contains(&card) {
                candidates.push(card);
            }
        }

        let outermost = keep_outermost(&candidates);
        in_document_order(document, &outermost)
    }

    fn cta_markers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .select(&SELECTOR_BODY_ELEMENTS)
            .filter(|el| self.is_cta(&flat_text(*el)))
            .collect()
    }

    // * Detector 1: CTA markers ("Cotizar") ascend to their enclosing card
    fn cta_candidates<'a>(&self, markers: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
        markers
            .iter()
            .filter_map(|el| {
                el.ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|a| is_container(a) && self.is_card_sized(&flat_text(*a)))
            })
            .collect()
    }

    // * Detector 2: innermost containers holding a telephone label, widened
    // * toward their card without swallowing a neighbouring listing
    fn tel_candidates<'a>(
        &self,
        document: &'a Html,
        markers: &[ElementRef<'a>],
        cta_cards: &[ElementRef<'a>],
    ) -> Vec<ElementRef<'a>> {
        let matching: Vec<ElementRef<'a>> = document
            .select(&SELECTOR_CONTAINERS)
            .filter(|el| {
                let text = flat_text(*el);
                patterns::has_tel_label(&text) && self.is_card_sized(&text)
            })
            .collect();

        let innermost = matching
            .iter()
            .filter(|el| !matching.iter().any(|other| other != *el && is_strict_ancestor(el, other)));

        innermost
            .map(|el| widen_to_card(*el, markers, cta_cards))
            .collect()
    }

    fn is_cta(&self, text: &str) -> bool {
        let text = collapse_whitespace(text).to_lowercase();
        !text.is_empty() && self.cta_labels.iter().any(|label| *label == text)
    }

    fn is_card_sized(&self, text: &str) -> bool {
        text.chars().filter(|c| !c.is_whitespace()).count() > self.min_card_chars
    }

    fn to_block(&self, card: ElementRef) -> CandidateBlock {
        let normalized = normalize_element(card);
        let lines = to_lines(&normalized);
        let emphasis = card
            .select(&SELECTOR_EMPHASIS)
            .map(flat_text)
            .find(|text| !text.is_empty() && !self.is_cta(text));

        CandidateBlock {
            kind: BlockKind::Card,
            text: lines.join("\n"),
            lines,
            markup: Some(card.inner_html()),
            emphasis,
        }
    }
}

impl Segmenter for CardSegmenter {
    fn mode(&self) -> SegmentMode {
        SegmentMode::Card
    }

    fn segment(&self, html: &str) -> Vec<CandidateBlock> {
        let document = Html::parse_document(html);
        self.detect_cards(&document)
            .into_iter()
            .map(|card| self.to_block(card))
            .collect()
    }
}

// * Auto

/// Runs both strategies and keeps the card result unless the gap split found
/// more blocks (a single wrapper matched as one card)
#[derive(Debug, Clone)]
pub struct AutoSegmenter {
    card: CardSegmenter,
    gap: GapSegmenter,
}

impl AutoSegmenter {
    pub fn with_config(config: &ExtractionConfig) -> Self {
        Self {
            card: CardSegmenter::with_config(config),
            gap: GapSegmenter,
        }
    }
}

impl Segmenter for AutoSegmenter {
    fn mode(&self) -> SegmentMode {
        SegmentMode::Auto
    }

    fn segment(&self, html: &str) -> Vec<CandidateBlock> {
        let cards = self.card.segment(html);
        let gaps = self.gap.segment(html);
        if !cards.is_empty() && cards.len() >= gaps.len() {
            return cards;
        }
        debug!(cards = cards.len(), gaps = gaps.len(), "Falling back to gap segmentation");
        gaps
    }
}

// * DOM helpers

// * Text nodes are joined with a space so `<b>NAME</b>Tel:` keeps its label boundary
fn flat_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_container(el: &ElementRef) -> bool {
    CONTAINER_TAGS.contains(&el.value().name())
}

/// True when `ancestor` strictly contains `node`
fn is_strict_ancestor(ancestor: &ElementRef, node: &ElementRef) -> bool {
    node.ancestors().any(|a| a.id() == ancestor.id())
}

/// True when `a` and `b` are the same element or one contains the other
fn is_related(a: &ElementRef, b: &ElementRef) -> bool {
    a == b || is_strict_ancestor(a, b) || is_strict_ancestor(b, a)
}

/// Ascends from an innermost telephone container, then prefers the nearest table.
///
/// Widening stops at the first container ancestor that:
/// - carries more telephone labels than the start
/// - holds a CTA card that is neither inside nor around the start
/// - holds more CTA markers than a single card would
fn widen_to_card<'a>(
    start: ElementRef<'a>,
    markers: &[ElementRef<'a>],
    cta_cards: &[ElementRef<'a>],
) -> ElementRef<'a> {
    let own_labels = patterns::tel_label_count(&flat_text(start));
    let own_markers = markers.iter().filter(|m| is_strict_ancestor(&start, m)).count();
    let mut chain = vec![start];

    for ancestor in start.ancestors().filter_map(ElementRef::wrap) {
        if !is_container(&ancestor) {
            continue;
        }
        if patterns::tel_label_count(&flat_text(ancestor)) != own_labels {
            break;
        }
        let holds_other_card = cta_cards
            .iter()
            .any(|card| !is_related(card, &start) && is_strict_ancestor(&ancestor, card));
        let held_markers = markers.iter().filter(|m| is_strict_ancestor(&ancestor, m)).count();
        if holds_other_card || held_markers > own_markers.max(1) {
            break;
        }
        chain.push(ancestor);
    }

    chain
        .iter()
        .find(|el| el.value().name() == "table")
        .or_else(|| chain.last())
        .copied()
        .unwrap_or(start)
}

/// Drops every candidate that has another candidate as a strict ancestor.
/// Checking against the full set (not just survivors) collapses any nesting
/// depth to the outermost container in one pass.
fn keep_outermost<'a>(candidates: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    candidates
        .iter()
        .filter(|el| !candidates.iter().any(|other| other != *el && is_strict_ancestor(other, el)))
        .copied()
        .collect()
}

fn in_document_order<'a>(document: &'a Html, kept: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| kept.contains(el))
        .collect()
}
