// * Pattern Library
// * Reusable matchers for contact data, field labels, and place cues.
// * Every later refinery stage reads text through these.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

// * Precompiled regex patterns

static PATTERN_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("Invalid email regex")
});

// * Local formats: "(55) 1234-5678", "555-1234", "8123 4567". Never spans lines.
static PATTERN_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\d{2,3}\)[ \t]?\d{3,4}[ \t-]?\d{4}|\b\d{3,4}[ \t-]?\d{4}\b")
        .expect("Invalid phone regex")
});

static PATTERN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://\S+|\bwww\.\S+").expect("Invalid URL regex")
});

// * Hostname-looking text ending in an alphabetic TLD
static PATTERN_DOMAIN_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}\b").expect("Invalid domain regex")
});

// * Field labels that end the header area of a text block
static PATTERN_STRICT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:tel|tel[ée]fono|email|e-mail|correo|web)\s*:").expect("Invalid label regex")
});

// * Wider label set used by card layouts (no colon required)
static PATTERN_BROAD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:tel|tel[ée]fonos?|whatsapp|email|e-mail|correo|web|website|sitio web|productos|products)\b",
    )
    .expect("Invalid broad label regex")
});

// * A text block is a listing candidate only when it carries one of these
static PATTERN_CONTACT_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:email|e-mail|correo(?:\s+electr[óo]nico)?|tel|tel[ée]fonos?)\s*:")
        .expect("Invalid contact cue regex")
});

static PATTERN_TEL_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btel(?:[ée]fono)?s?\s*[.:]").expect("Invalid telephone label regex")
});

static PATTERN_WHATSAPP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^whatsapp\s*:\s*(.+)$").expect("Invalid WhatsApp regex")
});

static PATTERN_ADDRESS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:direcci[óo]n|domicilio|address)\s*:\s*").expect("Invalid address label regex")
});

// * Street, colony, and city tokens (Mexican directory pages, plus English street words)
static PATTERN_PLACE_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:colonia|calle|avenida|boulevard|blvd|carretera|km|cp|cdmx|nl|quer[ée]taro|monterrey|guadalajara|m[ée]xico|street|avenue|road|suite|parque industrial|zona industrial)\b|\b(?:col|av|ave|st|jal|n\.l|c\.p)\.",
    )
    .expect("Invalid place cue regex")
});

static PATTERN_POSTAL_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bc\.?\s?p\.?\s*\d{4,5}\b|\b\d{5}\b").expect("Invalid postal cue regex")
});

static PATTERN_SPANISH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[áéíóúñÁÉÍÓÚÑ]").expect("Invalid language regex"));

/// Contact data kinds pulled from block text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactKind {
    Email,
    Phone,
    Website,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Email => "email",
            ContactKind::Phone => "phone",
            ContactKind::Website => "website",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ContactKind::Email => &*PATTERN_EMAIL,
            ContactKind::Phone => &*PATTERN_PHONE,
            ContactKind::Website => &*PATTERN_URL,
        }
    }
}

/// Extracts all matches of `kind`, deduplicated case-insensitively in first-seen order
pub fn extract_unique(kind: ContactKind, text: &str) -> Vec<String> {
    let matches = kind.pattern().find_iter(text).map(|m| match kind {
        ContactKind::Website => m.as_str().trim_end_matches([',', ';', '.']).to_string(),
        _ => m.as_str().to_string(),
    });
    dedup_preserving_order(matches)
}

/// Drops empty values and case-insensitive repeats, keeping the first spelling
pub fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

/// Joins field values the way every multi-valued record field is stored
pub fn join_values(values: &[String]) -> String {
    values.join("; ")
}

pub fn contains_email(text: &str) -> bool {
    PATTERN_EMAIL.is_match(text)
}

pub fn contains_url(text: &str) -> bool {
    PATTERN_URL.is_match(text)
}

pub fn is_strict_label(line: &str) -> bool {
    PATTERN_STRICT_LABEL.is_match(line.trim())
}

pub fn is_broad_label(line: &str) -> bool {
    PATTERN_BROAD_LABEL.is_match(line.trim())
}

pub fn has_contact_cue(text: &str) -> bool {
    PATTERN_CONTACT_CUE.is_match(text)
}

pub fn has_tel_label(text: &str) -> bool {
    PATTERN_TEL_LABEL.is_match(text)
}

pub fn tel_label_count(text: &str) -> usize {
    PATTERN_TEL_LABEL.find_iter(text).count()
}

pub fn has_place_cue(text: &str) -> bool {
    PATTERN_PLACE_CUE.is_match(text)
}

pub fn has_postal_cue(text: &str) -> bool {
    PATTERN_POSTAL_CUE.is_match(text)
}

pub fn has_spanish_chars(text: &str) -> bool {
    PATTERN_SPANISH_CHARS.is_match(text)
}

/// Removes a leading "Dirección:" style label
pub fn strip_address_label(line: &str) -> &str {
    match PATTERN_ADDRESS_LABEL.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Phone numbers found on explicit "WhatsApp:" lines
pub fn whatsapp_numbers<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let numbers = lines.iter().filter_map(|line| {
        PATTERN_WHATSAPP_LINE
            .captures(line.as_ref().trim())
            .and_then(|c| c.get(1))
    });
    dedup_preserving_order(
        numbers.flat_map(|content| {
            PATTERN_PHONE
                .find_iter(content.as_str())
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        }),
    )
}

/// First hostname-looking substring in free text
pub fn first_domain_like(text: &str) -> Option<&str> {
    PATTERN_DOMAIN_LIKE.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails_dedup_case_insensitive() {
        let text = "Email: Info@Acme.com\nventas@acme.com; info@acme.com";
        let emails = extract_unique(ContactKind::Email, text);
        assert_eq!(emails, vec!["Info@Acme.com", "ventas@acme.com"]);
    }

    #[test]
    fn test_phone_formats() {
        let text = "Tel: (55) 1234-5678, 555-1234\nFax: 8123 4567";
        let phones = extract_unique(ContactKind::Phone, text);
        assert_eq!(phones, vec!["(55) 1234-5678", "555-1234", "8123 4567"]);
    }

    #[test]
    fn test_phone_does_not_span_lines() {
        let phones = extract_unique(ContactKind::Phone, "Ref 555\n1234");
        assert!(phones.is_empty());
    }

    #[test]
    fn test_websites_strip_trailing_punctuation() {
        let text = "Web: www.acme.com.mx, http://acme.com/contacto; www.acme.com.mx.";
        let sites = extract_unique(ContactKind::Website, text);
        assert_eq!(sites, vec!["www.acme.com.mx", "http://acme.com/contacto"]);
    }

    #[test]
    fn test_labels() {
        assert!(is_strict_label("Teléfono: 555-1234"));
        assert!(is_strict_label("E-mail : x@y.com"));
        assert!(!is_strict_label("WhatsApp: 555-1234"));
        assert!(is_broad_label("WhatsApp: 555-1234"));
        assert!(is_broad_label("Productos: filtros"));
        assert!(!is_broad_label("Telas industriales"));
    }

    #[test]
    fn test_contact_cue() {
        assert!(has_contact_cue("ACME\nCorreo: a@b.com"));
        assert!(has_contact_cue("ACME\nTel: 555-1234"));
        assert!(!has_contact_cue("Nuestros servicios de filtración"));
    }

    #[test]
    fn test_tel_label_count() {
        assert_eq!(tel_label_count("Tel: 1 Teléfono. 2 Hotel: none"), 2);
        assert!(!has_tel_label("Hotel: Plaza"));
    }

    #[test]
    fn test_place_and_postal_cues() {
        assert!(has_place_cue("Av. Reforma 123, Col. Centro"));
        assert!(has_place_cue("Monterrey, N.L."));
        assert!(!has_place_cue("Purifies industrial water"));
        assert!(has_postal_cue("C.P. 44100"));
        assert!(has_postal_cue("64000 Monterrey"));
    }

    #[test]
    fn test_whatsapp_numbers() {
        let lines = ["Tel: 555-1234", "WhatsApp: (33) 1234-5678 / 555-9876"];
        assert_eq!(whatsapp_numbers(&lines), vec!["(33) 1234-5678", "555-9876"]);
        assert!(whatsapp_numbers(&["Síguenos en WhatsApp"]).is_empty());
    }

    #[test]
    fn test_first_domain_like() {
        assert_eq!(first_domain_like("Visítanos en filtros-mx.com hoy"), Some("filtros-mx.com"));
        assert_eq!(first_domain_like("ACME S.A. de C.V."), None);
    }

    #[test]
    fn test_strip_address_label() {
        assert_eq!(strip_address_label("Dirección: Calle 5 #10"), "Calle 5 #10");
        assert_eq!(strip_address_label("Calle 5 #10"), "Calle 5 #10");
    }
}
