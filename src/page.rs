use crate::jsonld::{self, Nodes};
use crate::utils::{self, normalize_space};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A fetched detail page, parsed once and shared by every extractor.
pub struct DetailPage {
    pub url: String,
    pub document: Html,
    /// Visible text, whitespace-normalized.
    pub text: String,
    structured: Vec<Value>,
    property_type: Option<String>,
}

impl DetailPage {
    pub fn parse(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);
        let text = visible_text(&document);
        let structured = jsonld::parse_blocks(&document);
        let property_type = utils::property_type_from_url(url);
        debug!(
            "parsed {}: {} chars of text, {} ld+json blocks, type {:?}",
            url,
            text.len(),
            structured.len(),
            property_type
        );

        Self {
            url: url.to_string(),
            document,
            text,
            structured,
            property_type,
        }
    }

    /// Property-type slug from the URL, if the path has the listing shape.
    pub fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    pub fn structured_nodes(&self) -> Nodes<'_> {
        jsonld::nodes(&self.structured)
    }

    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.document.select(&selector).next()
    }

    pub fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// `content` attribute of the first element matching `css`.
    pub fn attr_of_first(&self, css: &str, attr: &str) -> Option<String> {
        self.select_first(css)?
            .value()
            .attr(attr)
            .map(normalize_space)
            .filter(|s| !s.is_empty())
    }
}

/// Joined text of an element, whitespace-normalized.
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_space(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text a reader would see: every text node outside script/style blocks.
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()))
            .map(|name| HIDDEN_ELEMENTS.contains(&name.as_str()))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    normalize_space(&parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>T</title><style>.a{}</style>
            <script type="application/ld+json">{"name": "hidden"}</script></head>
            <body><h1> Family   Home </h1><p>Price <b>R 1 000 000</b></p>
            <script>var x = 1;</script></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(visible_text(&document), "T Family Home Price R 1 000 000");
    }

    #[test]
    fn detail_page_helpers() {
        let html = r#"<html><head><meta property="og:title" content=" Nice  flat "></head>
            <body><div class="price">R 900 000</div></body></html>"#;
        let page = DetailPage::parse(
            "https://h.example/results/residential/to-let/durban/berea/flat/123456/",
            html,
        );
        assert_eq!(page.property_type(), Some("flat"));
        assert_eq!(
            page.attr_of_first("meta[property='og:title']", "content").as_deref(),
            Some("Nice flat")
        );
        let price = page.select_first(".price").unwrap();
        assert_eq!(element_text(&price), "R 900 000");
        assert!(page.select_first("!!bad").is_none());
        assert_eq!(page.structured_nodes().count(), 0);
    }
}
