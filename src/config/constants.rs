// * Configuration Constants
// * Central location for all thresholds, limits, and site defaults

// * Page fetch timeout in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 30;

// * Fixed user agent sent with the single page GET
pub const USER_AGENT: &str = "Mozilla/5.0";

// * Advisory caching directive for anything serving the JSON envelope
pub const CACHE_CONTROL: &str = "no-store";

// * Category used when the source URL carries no directory segment
pub const DEFAULT_CATEGORY: &str = "unknown";

// * Path marker preceding the category segment (/dap/filtracion3.html)
pub const DEFAULT_CATEGORY_MARKER: &str = "dap";

// * Label assigned when no fit rule matches
pub const DEFAULT_FIT_LABEL: &str = "General filtration";

// * Minimum flattened text length (chars, exclusive) for a DOM container to count as a card
pub const MIN_CARD_TEXT_CHARS: usize = 40;

// * A text line must be longer than this to be read as a company name
pub const MIN_NAME_CHARS: usize = 3;

// * Upper bound for a card header line to still be read as a name
pub const MAX_HEADER_CHARS: usize = 80;

// * Card header scan window (lines)
pub const CARD_HEADER_SCAN_LINES: usize = 8;

// * Card description scan window after the header (lines)
pub const CARD_DESCRIPTION_WINDOW: usize = 5;

// * A card description line must be longer than this (chars)
pub const CARD_DESCRIPTION_MIN_CHARS: usize = 40;

// * Trailing lines examined for address text
pub const GAP_ADDRESS_TAIL_LINES: usize = 4;
pub const CARD_ADDRESS_TAIL_LINES: usize = 10;

// * Maximum product entries kept per card
pub const MAX_PRODUCTS: usize = 20;

// * Product entries shorter than this (chars) are dropped
pub const MIN_PRODUCT_CHARS: usize = 2;

// * Call-to-action labels marking a listing card
pub const DEFAULT_CTA_LABELS: &[&str] = &["cotizar", "solicitar cotización", "quote", "request a quote"];

// * Public mailbox providers that never identify an organization
pub const GENERIC_MAILBOX_DOMAINS: &[&str] = &[
    "gmail", "hotmail", "outlook", "live", "icloud", "aol", "yahoo", "gmx", "msn", "yopmail",
    "prodigy", "telmex", "att", "me",
];

// * Fit keywords, checked in order (membrane terms first)
pub const MEMBRANE_LABEL: &str = "Membrane filtration";
pub const MEMBRANE_KEYWORDS: &[&str] = &[
    "microfiltra",
    "ultrafiltra",
    "nanofiltra",
    "ósmosis",
    "osmosis",
    "membrana",
    "membrane",
    "uf",
    "nf",
    "ro",
    "cartucho",
    "bolsa filtrante",
    "portafiltro",
    "filtración líquid",
];

pub const TUBING_LABEL: &str = "Food-grade tubing/hoses";
pub const TUBING_KEYWORDS: &[&str] = &[
    "manguera",
    "tubería",
    "grado alimenticio",
    "sanitaria",
    "ptfe",
    "fep",
    "liner",
    "tubing",
    "food grade",
    "food-grade",
];
