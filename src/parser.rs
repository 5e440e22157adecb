//! Field extractors.
//!
//! Every field is resolved by walking a literal, ordered table of strategies
//! and keeping the first one that produces a value. The tables are public so
//! the order itself can be inspected and tested.

use crate::models::PropertyCategory;
use crate::page::{element_text, DetailPage};
use crate::utils::{self, first_int, normalize_space, parse_money};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

pub type Strategy<T> = fn(&DetailPage) -> Option<T>;

/// Runs `strategies` in order and returns the first hit.
pub fn cascade<T>(page: &DetailPage, field: &str, strategies: &[(&str, Strategy<T>)]) -> Option<T> {
    for (name, strategy) in strategies {
        if let Some(value) = strategy(page) {
            debug!("{} resolved by {} on {}", field, name, page.url);
            return Some(value);
        }
    }
    debug!("{} unresolved on {}", field, page.url);
    None
}

fn money_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bR\s?(?:\d{1,3}(?:[\s,.'’]\d{3})+|\d+)").expect("valid regex")
    })
}

fn ref_labelled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:Web\s*Ref(?:erence)?|Ref(?:erence)?(?:\s*No\.?)?)\s*[:#\-\u{00A0}]?\s*([A-Za-z]{0,3}\d{5,}|\d{5,})",
        )
        .expect("valid regex")
    })
}

fn ref_window_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:web\s*ref(?:erence)?|ref(?:erence)?(?:\s*no\.?)?)\s*[:#-]?\s*([A-Za-z]{0,3}\d{5,}|\d{5,})",
        )
        .expect("valid regex")
    })
}

fn ref_prefixed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(RL\d{3,})\b").expect("valid regex"))
}

fn ref_numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{5,})\b").expect("valid regex"))
}

fn beds_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:Bedrooms?|Beds?)\s*[:\-]?\s*(\d+)").expect("valid regex"))
}

fn beds_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*bed(?:room)?s?\b").expect("valid regex"))
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------- reference

pub const REF_STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("labelled", ref_labelled),
    ("ref_block", ref_in_block),
    ("prefixed_code", ref_prefixed_code),
    ("label_window", ref_label_window),
    ("bare_number", ref_bare_number),
    ("url_segment", ref_from_url),
];

const REF_BLOCK_SELECTORS: &[&str] = &["[class*='ref']", ".property-ref", ".web-ref"];

fn ref_labelled(page: &DetailPage) -> Option<String> {
    capture(ref_labelled_re(), &page.text)
}

fn ref_in_block(page: &DetailPage) -> Option<String> {
    for css in REF_BLOCK_SELECTORS {
        let Some(block) = page.select_first(css) else {
            continue;
        };
        let text = element_text(&block);
        let found = capture(ref_labelled_re(), &text)
            .or_else(|| capture(ref_prefixed_re(), &text))
            .or_else(|| capture(ref_numeric_re(), &text));
        if found.is_some() {
            return found;
        }
    }
    None
}

fn ref_prefixed_code(page: &DetailPage) -> Option<String> {
    capture(ref_prefixed_re(), &page.text)
}

fn ref_label_window(page: &DetailPage) -> Option<String> {
    ref_window_re()
        .captures_iter(&page.text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .find(|code| !code.is_empty())
}

/// A standalone 5+ digit number that is not part of a money amount.
fn ref_bare_number(page: &DetailPage) -> Option<String> {
    let monies: Vec<&str> = money_re().find_iter(&page.text).map(|m| m.as_str()).collect();
    ref_numeric_re()
        .captures_iter(&page.text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|digits| !monies.iter().any(|money| money.contains(digits)))
        .map(str::to_string)
}

fn ref_from_url(page: &DetailPage) -> Option<String> {
    utils::last_numeric_segment(&page.url)
}

pub fn extract_ref(page: &DetailPage) -> Option<String> {
    cascade(page, "ref", REF_STRATEGIES)
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
}

// -------------------------------------------------------------------- price

pub const PRICE_STRATEGIES: &[(&str, Strategy<u64>)] = &[
    ("meta_price", price_from_meta),
    ("price_block", price_from_blocks),
    ("currency_text", price_from_text),
];

const PRICE_BLOCK_SELECTORS: &[&str] = &[".price", ".property-price", "[class*='price']"];

/// Zero is not a price.
fn positive(amount: Option<u64>) -> Option<u64> {
    amount.filter(|&value| value > 0)
}

fn price_from_meta(page: &DetailPage) -> Option<u64> {
    let content = page.attr_of_first("[itemprop='price'][content]", "content")?;
    positive(parse_money(&content))
}

fn price_from_blocks(page: &DetailPage) -> Option<u64> {
    PRICE_BLOCK_SELECTORS.iter().find_map(|css| {
        let block = page.select_first(css)?;
        let text = element_text(&block);
        // only the amount itself, not sizes or counts after it
        let amount = money_re().find(&text).map_or(text.as_str(), |m| m.as_str());
        positive(parse_money(amount))
    })
}

fn price_from_text(page: &DetailPage) -> Option<u64> {
    let amount = money_re().find(&page.text)?;
    positive(parse_money(amount.as_str()))
}

pub fn extract_price(page: &DetailPage) -> Option<u64> {
    cascade(page, "price", PRICE_STRATEGIES)
}

// ----------------------------------------------------------------- bedrooms

pub const BEDS_STRATEGIES: &[(&str, Strategy<u32>)] = &[
    ("structured", beds_from_structured),
    ("labelled", beds_from_label),
    ("bed_block", beds_from_blocks),
    ("phrase", beds_from_phrase),
];

const BED_BLOCK_SELECTORS: &[&str] = &["[class*='bed']", ".icon-bed", ".beds", ".property-beds"];

fn beds_from_structured(page: &DetailPage) -> Option<u32> {
    for node in page.structured_nodes() {
        for key in ["numberOfBedrooms", "numberOfRooms"] {
            let found = match node.get(key) {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
                    .map(|v| v as u32),
                Some(Value::String(s)) => first_int(s),
                // QuantitativeValue: {"@type": "QuantitativeValue", "value": 3}
                Some(Value::Object(inner)) => match inner.get("value") {
                    Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
                    Some(Value::String(s)) => first_int(s),
                    _ => None,
                },
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

fn beds_from_label(page: &DetailPage) -> Option<u32> {
    capture(beds_label_re(), &page.text)?.parse().ok()
}

fn beds_from_blocks(page: &DetailPage) -> Option<u32> {
    BED_BLOCK_SELECTORS.iter().find_map(|css| {
        let block = page.select_first(css)?;
        first_int(&element_text(&block))
    })
}

fn beds_from_phrase(page: &DetailPage) -> Option<u32> {
    capture(beds_phrase_re(), &page.text)?.parse().ok()
}

/// Bedroom count, with the type-aware fallback: land and commercial stock
/// resolves to 0 when the page carries no bedroom signal. Dwellings and
/// unrecognised types stay unresolved.
pub fn extract_beds(page: &DetailPage) -> Option<u32> {
    if let Some(beds) = cascade(page, "beds", BEDS_STRATEGIES) {
        return Some(beds);
    }
    let category = page
        .property_type()
        .map(PropertyCategory::from_slug)
        .unwrap_or(PropertyCategory::Unknown);
    if category.requires_beds() {
        None
    } else {
        Some(0)
    }
}

// -------------------------------------------------------------------- title

pub const TITLE_STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("heading", title_heading),
    ("property_title", title_property_class),
    ("title_class", title_class),
    ("og_title", title_og_meta),
    ("document_title", title_document),
];

fn title_heading(page: &DetailPage) -> Option<String> {
    title_from_selector(page, "h1")
}

fn title_property_class(page: &DetailPage) -> Option<String> {
    title_from_selector(page, ".property-title")
}

fn title_class(page: &DetailPage) -> Option<String> {
    title_from_selector(page, ".title")
}

fn title_og_meta(page: &DetailPage) -> Option<String> {
    page.attr_of_first("meta[property='og:title']", "content")
}

fn title_document(page: &DetailPage) -> Option<String> {
    title_from_selector(page, "title")
}

fn title_from_selector(page: &DetailPage, css: &str) -> Option<String> {
    let element = page.select_first(css)?;
    let text = element_text(&element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn extract_title(page: &DetailPage) -> Option<String> {
    cascade(page, "title", TITLE_STRATEGIES)
        .map(|title| normalize_space(&title))
        .filter(|title| !title.is_empty())
}

// --------------------------------------------------------------------- area

/// Area comes from the URL path only; page text is never consulted, so a
/// city or property type can not leak into it.
pub fn extract_area(page: &DetailPage) -> Option<String> {
    utils::area_from_url(&page.url)
}
