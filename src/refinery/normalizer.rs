// * HTML Normalizer
// * Flattens markup to visible text while keeping line and paragraph structure:
// * <br> forces a newline, paragraph closes leave a blank line, other block
// * closes end the current line, table cells are separated by a space.

use scraper::{ElementRef, Html, Node};

// * Elements whose content is never visible text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title", "iframe", "svg"];

// * Closing one of these leaves a paragraph boundary (blank line)
const PARAGRAPH_TAGS: &[&str] = &["p"];

// * Closing one of these ends the current line
const BLOCK_TAGS: &[&str] = &[
    "div", "li", "ul", "ol", "tr", "table", "tbody", "thead", "tfoot", "h1", "h2", "h3", "h4", "h5",
    "h6", "section", "article", "header", "footer", "nav", "aside", "main", "blockquote", "pre",
    "dl", "dt", "dd", "address", "form", "fieldset", "figure", "figcaption", "caption",
];

const CELL_TAGS: &[&str] = &["td", "th"];

/// Accumulates visible text with non-stacking block breaks
#[derive(Default)]
struct TextSink {
    out: String,
    pending_space: bool,
}

impl TextSink {
    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                self.pending_space = true;
                continue;
            }
            if self.pending_space && !self.out.is_empty() && !self.out.ends_with('\n') {
                self.out.push(' ');
            }
            self.pending_space = false;
            self.out.push(ch);
        }
    }

    fn push_space(&mut self) {
        self.pending_space = true;
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
        self.pending_space = false;
    }

    // * Explicit <br>: always a newline, so two in a row make a paragraph gap
    fn hard_break(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
    }

    fn soft_break(&mut self) {
        self.trim_trailing_spaces();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn paragraph_break(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() {
            return;
        }
        let trailing = self.out.len() - self.out.trim_end_matches('\n').len();
        for _ in trailing..2 {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out
            .split('\n')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

fn walk(element: ElementRef, sink: &mut TextSink) {
    let name = element.value().name();

    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    match name {
        "br" => return sink.hard_break(),
        "hr" => return sink.paragraph_break(),
        _ => {}
    }

    let is_paragraph = PARAGRAPH_TAGS.contains(&name);
    let is_block = BLOCK_TAGS.contains(&name);
    if is_paragraph || is_block {
        sink.soft_break();
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => sink.push_text(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, sink);
                }
            }
            _ => {}
        }
    }

    if is_paragraph {
        sink.paragraph_break();
    } else if is_block {
        sink.soft_break();
    } else if CELL_TAGS.contains(&name) {
        sink.push_space();
    }
}

/// Normalizes a full HTML document into structured plain text
pub fn normalize_html(html: &str) -> String {
    let document = Html::parse_document(html);
    normalize_element(document.root_element())
}

/// Normalizes a markup fragment (e.g. a slice of a card's inner HTML)
pub fn normalize_fragment(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    normalize_element(fragment.root_element())
}

/// Normalizes the subtree rooted at `element`
pub fn normalize_element(element: ElementRef) -> String {
    let mut sink = TextSink::default();
    walk(element, &mut sink);
    sink.finish()
}

/// Splits normalized text into trimmed, non-empty lines
pub fn to_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_br_and_paragraphs() {
        let html = "<p>ACME WATER<br>Tel: 555-1234</p><p>OTRA EMPRESA<br/>Email: a@b.com</p>";
        assert_eq!(
            normalize_html(html),
            "ACME WATER\nTel: 555-1234\n\nOTRA EMPRESA\nEmail: a@b.com"
        );
    }

    #[test]
    fn test_double_br_is_paragraph_gap() {
        let html = "<div>Uno<br><br>Dos</div>";
        assert_eq!(normalize_html(html), "Uno\n\nDos");
    }

    #[test]
    fn test_nested_blocks_do_not_stack() {
        let html = "<div><div><div>Uno</div></div></div><div>Dos</div>";
        assert_eq!(normalize_html(html), "Uno\nDos");
    }

    #[test]
    fn test_source_whitespace_collapses() {
        let html = "<div>\n    Tel:\n     555-1234\n\n\n   </div>";
        assert_eq!(normalize_html(html), "Tel: 555-1234");
    }

    #[test]
    fn test_scripts_and_head_removed() {
        let html = "<html><head><title>Directorio</title><style>p{}</style></head><body><script>var x = 1;</script><p>Visible</p></body></html>";
        assert_eq!(normalize_html(html), "Visible");
    }

    #[test]
    fn test_table_cells_share_a_line() {
        let html = "<table><tr><td>Tel:</td><td>555-1234</td></tr><tr><td>Email:</td><td>a@b.com</td></tr></table>";
        assert_eq!(normalize_html(html), "Tel: 555-1234\nEmail: a@b.com");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<p>Filtros &amp; Membranas&nbsp;S.A.</p>";
        assert_eq!(normalize_html(html), "Filtros & Membranas S.A.");
    }

    #[test]
    fn test_malformed_markup() {
        let html = "<div><p>Sin cerrar<div>Otro <b>bloque";
        let text = normalize_html(html);
        assert!(text.contains("Sin cerrar"));
        assert!(text.contains("Otro bloque"));
    }

    #[test]
    fn test_fragment_with_stray_close() {
        let text = normalize_fragment("</b><ul><li>Filtro A</li><li>Filtro B</li></ul>");
        assert_eq!(to_lines(&text), vec!["Filtro A", "Filtro B"]);
    }
}
