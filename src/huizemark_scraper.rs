use crate::jsonld;
use crate::models::AgentIdentity;
use crate::page::element_text;
use crate::utils::{dedupe_preserving_order, make_absolute};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

pub const BASE_URL: &str = "https://www.huizemark.com";

/// Detail pages all live under this path:
/// `/results/residential/{for-sale|to-let}/{city}/{area}/{type}/{id}/`
pub const RESIDENTIAL_PATH: &str = "/results/residential/";

const NEXT_LINK_TEXTS: &[&str] = &["next", "»", "next page", "next »", "next page »"];

/// Where one agent's stock is published on the portal.
#[derive(Debug, Clone)]
pub struct HuizemarkPortal {
    base_url: String,
    agent: AgentIdentity,
}

impl HuizemarkPortal {
    pub fn new(base_url: &str, agent: AgentIdentity) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    pub fn profile_url(&self) -> String {
        format!("{}{}", self.base_url, self.agent.profile_path())
    }

    pub fn results_url(&self) -> String {
        format!("{}{}", self.base_url, self.agent.results_path())
    }

    /// The profile page only renders a handful of listings, so a profile
    /// URL given as the results start page is swapped for the real one.
    pub fn normalize_results_url(&self, url: &str) -> String {
        if url.contains("/agents/") {
            self.results_url()
        } else {
            url.to_string()
        }
    }
}

fn selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("valid selector"))
}

fn residential_anchor_urls(document: &Html, page_url: &str) -> Vec<String> {
    static ANCHORS: OnceLock<Selector> = OnceLock::new();
    let anchors = selector(&ANCHORS, "a[href*='/results/residential/']");

    document
        .select(anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| make_absolute(page_url, href))
        .filter(|url| url.contains(RESIDENTIAL_PATH))
        .collect()
}

/// Detail-page links on one page of the agent's results listing.
pub fn parse_results_for_detail_urls(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    dedupe_preserving_order(residential_anchor_urls(&document, page_url))
}

/// Detail-page links on the agent's profile page: anchors first, then any
/// linked-data node whose `url`/`@id` points at a residential listing.
pub fn parse_profile_for_detail_urls(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls = residential_anchor_urls(&document, page_url);

    let blocks = jsonld::parse_blocks(&document);
    for node in jsonld::nodes(&blocks) {
        let linked = ["url", "@id"]
            .iter()
            .find_map(|key| node.get(*key).and_then(Value::as_str));
        if let Some(link) = linked.filter(|link| link.contains(RESIDENTIAL_PATH)) {
            if let Some(url) = make_absolute(page_url, link) {
                urls.push(url);
            }
        }
    }

    dedupe_preserving_order(urls)
}

/// Absolute URL of the next results page, from a `rel="next"` link or an
/// anchor labelled "Next" / "»".
pub fn find_next_link(html: &str, page_url: &str) -> Option<String> {
    static REL_NEXT: OnceLock<Selector> = OnceLock::new();
    static ANCHORS: OnceLock<Selector> = OnceLock::new();

    let document = Html::parse_document(html);

    let rel_next = document
        .select(selector(&REL_NEXT, "a[rel~='next'][href], link[rel~='next'][href]"))
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| make_absolute(page_url, href));
    if rel_next.is_some() {
        return rel_next;
    }

    document
        .select(selector(&ANCHORS, "a[href]"))
        .filter(|a| {
            let label = element_text(a).to_lowercase();
            NEXT_LINK_TEXTS.contains(&label.as_str())
        })
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| make_absolute(page_url, href))
}
