use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Resolves `href` against the page it was found on.
pub fn make_absolute(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Collapses whitespace runs into single spaces and trims the ends.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses formatted money text (`R 1 250 000`, `1,250,000.00`) into whole
/// currency units. Minor units are dropped along with anything after them.
pub fn parse_money(text: &str) -> Option<u64> {
    static CENTS: OnceLock<Regex> = OnceLock::new();
    let cents = CENTS.get_or_init(|| Regex::new(r"\d[.,]\d{2}(?:\D|$)").expect("valid regex"));

    let trimmed = text.trim();
    let whole = match cents.find(trimmed) {
        // keep the digit before the separator
        Some(m) => &trimmed[..m.start() + 1],
        None => trimmed,
    };

    let digits: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// First unsigned integer appearing in `text`.
pub fn first_int(text: &str) -> Option<u32> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));
    re.find(text)?.as_str().parse().ok()
}

/// Non-empty, percent-decoded path segments of `url`.
pub fn path_segments(url: &str) -> Vec<String> {
    static HOST_PREFIX: OnceLock<Regex> = OnceLock::new();

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let re = HOST_PREFIX
                .get_or_init(|| Regex::new(r"^(?i)https?://[^/]+").expect("valid regex"));
            re.replace(url, "").split(['?', '#']).next().unwrap_or_default().to_string()
        }
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect()
}

/// Index of the `for-sale` (preferred) or `to-let` segment.
fn listing_kind_index(segments: &[String]) -> Option<usize> {
    segments
        .iter()
        .position(|s| s == "for-sale")
        .or_else(|| segments.iter().position(|s| s == "to-let"))
}

/// `/for-sale/<city>/<area>/<type>/<id>/` -> title-cased `<area>`.
pub fn area_from_url(url: &str) -> Option<String> {
    let segments = path_segments(url);
    let index = listing_kind_index(&segments)?;
    let slug = segments.get(index + 2)?;
    let area = title_case(&slug.replace('-', " "));
    let area = normalize_space(&area);
    if area.is_empty() {
        None
    } else {
        Some(area)
    }
}

/// `/for-sale/<city>/<area>/<type>/<id>/` -> lower-cased `<type>`.
pub fn property_type_from_url(url: &str) -> Option<String> {
    let segments = path_segments(url);
    let index = listing_kind_index(&segments)?;
    segments.get(index + 3).map(|s| s.to_lowercase())
}

/// Last path segment made of five or more digits.
pub fn last_numeric_segment(url: &str) -> Option<String> {
    path_segments(url)
        .into_iter()
        .rev()
        .find(|s| s.len() >= 5 && s.chars().all(|c| c.is_ascii_digit()))
}

/// Upper-cases the first letter of every alphabetic run and lower-cases
/// the rest (`sandton central` -> `Sandton Central`, `o'neil` -> `O'Neil`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Drops repeated entries, keeping the first occurrence of each.
pub fn dedupe_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
