// * Listing record and the JSON envelopes around it

use serde::{Deserialize, Serialize};

use super::classifier::Lang;
use crate::config::constants::CACHE_CONTROL;
use super::extractor::ExtractedFields;
use super::patterns::join_values;

/// One business listing, every field a string except `lang`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub company_name: String,
    pub description: String,
    pub emails: String,
    pub phones: String,
    pub websites: String,
    pub whatsapp: String,
    pub address: String,
    pub products: String,
    pub category: String,
    pub category_url: String,
    pub lang: Lang,
    pub fit_hint: String,
    /// Reserved; always empty at creation
    pub notes: String,
}

/// Page-level data copied onto every record
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub category: String,
    pub category_url: String,
}

impl ListingRecord {
    pub fn from_fields(fields: ExtractedFields, page: &PageContext, lang: Lang, fit_hint: String) -> Self {
        Self {
            company_name: fields.company_name,
            description: fields.description,
            emails: join_values(&fields.emails),
            phones: join_values(&fields.phones),
            websites: join_values(&fields.websites),
            whatsapp: join_values(&fields.whatsapp),
            address: fields.address,
            products: join_values(&fields.products),
            category: page.category.clone(),
            category_url: page.category_url.clone(),
            lang,
            fit_hint,
            notes: String::new(),
        }
    }

    /// First address of the joined `emails` field, if any
    pub fn first_email(&self) -> &str {
        self.emails.split(';').next().map(str::trim).unwrap_or_default()
    }
}

/// Headers a serving shell attaches to either envelope; responses are never cached
pub fn response_headers() -> [(&'static str, &'static str); 2] {
    [("content-type", "application/json"), ("cache-control", CACHE_CONTROL)]
}

/// Successful response body: `{ "items": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub items: Vec<ListingRecord>,
}

impl ScrapeResponse {
    pub fn new(items: Vec<ListingRecord>) -> Self {
        Self { items }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"items":[]}"#.to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| r#"{"items":[]}"#.to_string())
    }

    pub fn headers(&self) -> [(&'static str, &'static str); 2] {
        response_headers()
    }
}

/// Failure response body: `{ "error": "..." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self { error: error.to_string() }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "error": self.error }).to_string()
    }

    pub fn headers(&self) -> [(&'static str, &'static str); 2] {
        response_headers()
    }
}
