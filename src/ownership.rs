use crate::models::AgentIdentity;
use crate::page::DetailPage;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

const URL_KEYS: &[&str] = &["url", "@id", "sameAs"];
const PERSON_KEYS: &[&str] = &["name", "agent", "seller", "brand", "author"];
const RESIDENTIAL_FRAGMENT: &str = "/results/residential/";

/// Decides whether a detail page is attributed to one agent.
///
/// Signals are checked from strongest to weakest and the first positive one
/// wins. Nothing is cross-checked: a single signal is enough.
pub struct OwnershipVerifier {
    snippets: Vec<String>,
    name_pattern: Option<Regex>,
}

impl OwnershipVerifier {
    pub fn new(agent: &AgentIdentity) -> Self {
        Self {
            snippets: agent.url_snippets(),
            name_pattern: name_pattern(&agent.name),
        }
    }

    pub fn verify(&self, page: &DetailPage) -> bool {
        let signals: [(&str, fn(&Self, &DetailPage) -> bool); 5] = [
            ("anchor", Self::anchors_point_to_agent),
            ("structured_data", Self::structured_data_names_agent),
            ("canonical_url", Self::canonical_points_to_agent),
            ("text_url", Self::text_mentions_agent_url),
            ("text_name", Self::text_names_agent),
        ];
        for (name, signal) in signals {
            if signal(self, page) {
                debug!("{} owned by agent ({} signal)", page.url, name);
                return true;
            }
        }
        false
    }

    fn points_to_agent(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.snippets.iter().any(|snippet| url.contains(snippet.as_str()))
    }

    fn names_agent(&self, name: &str) -> bool {
        self.name_pattern
            .as_ref()
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    }

    fn anchors_point_to_agent(&self, page: &DetailPage) -> bool {
        page.select_all("a[href]")
            .iter()
            .filter_map(|a| a.value().attr("href"))
            .any(|href| self.points_to_agent(href))
    }

    fn structured_data_names_agent(&self, page: &DetailPage) -> bool {
        page.structured_nodes().any(|node| self.node_names_agent(node))
    }

    fn node_names_agent(&self, node: &Map<String, Value>) -> bool {
        for key in URL_KEYS {
            match node.get(*key) {
                Some(Value::String(url)) if self.points_to_agent(url) => return true,
                Some(Value::Array(items)) => {
                    if items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|url| self.points_to_agent(url))
                    {
                        return true;
                    }
                }
                _ => {}
            }
        }
        for key in PERSON_KEYS {
            match node.get(*key) {
                Some(Value::String(name)) if self.names_agent(name) => return true,
                Some(Value::Object(inner)) => {
                    let named = inner
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|name| self.names_agent(name))
                        .unwrap_or(false);
                    let linked = inner
                        .get("url")
                        .and_then(Value::as_str)
                        .map(|url| self.points_to_agent(url))
                        .unwrap_or(false);
                    if named || linked {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn canonical_points_to_agent(&self, page: &DetailPage) -> bool {
        [
            page.attr_of_first("meta[property='og:url']", "content"),
            page.attr_of_first("link[rel='canonical']", "href"),
        ]
        .iter()
        .flatten()
        .any(|url| self.points_to_agent(url))
    }

    fn text_mentions_agent_url(&self, page: &DetailPage) -> bool {
        self.points_to_agent(&page.text)
    }

    fn text_names_agent(&self, page: &DetailPage) -> bool {
        self.names_agent(&page.text) && page.text.to_lowercase().contains(RESIDENTIAL_FRAGMENT)
    }
}

/// `first ... last` as whole words, case-insensitive, anything in between.
fn name_pattern(name: &str) -> Option<Regex> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let pattern = match words.as_slice() {
        [] => return None,
        [only] => format!(r"(?i)\b{}\b", regex::escape(only)),
        [first, .., last] => format!(
            r"(?i)\b{}\b.*\b{}\b",
            regex::escape(first),
            regex::escape(last)
        ),
    };
    Regex::new(&pattern).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "https://www.huizemark.com/results/residential/for-sale/johannesburg/sandton/house/12345678/";

    fn verifier() -> OwnershipVerifier {
        OwnershipVerifier::new(&AgentIdentity::new("75570", "blessing-nsibande"))
    }

    fn page(head: &str, body: &str) -> DetailPage {
        DetailPage::parse(URL, &format!("<html><head>{}</head><body>{}</body></html>", head, body))
    }

    #[test]
    fn anchor_to_profile_or_results_page() {
        let v = verifier();
        assert!(v.verify(&page("", r#"<a href="/agents/Blessing-Nsibande/75570/">Agent</a>"#)));
        assert!(v.verify(&page("", r#"<a href="https://www.huizemark.com/results/agent/75570/">All</a>"#)));
        assert!(!v.verify(&page("", r#"<a href="/results/agent/99999/">Other</a>"#)));
    }

    #[test]
    fn structured_data_identifiers_and_names() {
        let v = verifier();
        let by_url = page(
            r#"<script type="application/ld+json">{"@type": "Person", "sameAs": ["https://x", "https://www.huizemark.com/agents/blessing-nsibande/75570/"]}</script>"#,
            "",
        );
        assert!(v.verify(&by_url));

        let by_name = page(
            r#"<script type="application/ld+json">{"@graph": [{"@type": "Offer", "seller": {"@type": "RealEstateAgent", "name": "Blessing T. Nsibande"}}]}</script>"#,
            "",
        );
        assert!(v.verify(&by_name));

        let other = page(
            r#"<script type="application/ld+json">{"seller": {"name": "Someone Else"}}</script>"#,
            "",
        );
        assert!(!v.verify(&other));
    }

    #[test]
    fn canonical_metadata() {
        let v = verifier();
        let p = page(
            r#"<link rel="canonical" href="https://www.huizemark.com/results/agent/75570/listing">"#,
            "",
        );
        assert!(v.verify(&p));

        let og = page(
            r#"<meta property="og:url" content="https://www.huizemark.com/agents/blessing-nsibande/75570/listing/12345678/">"#,
            "",
        );
        assert!(!v.anchors_point_to_agent(&og));
        assert!(!v.structured_data_names_agent(&og));
        assert!(v.canonical_points_to_agent(&og));
        assert!(v.verify(&og));
    }

    #[test]
    fn agent_url_in_visible_text() {
        let v = verifier();
        let p = page("", "<p>More stock at huizemark.com/agents/blessing-nsibande/75570/</p>");
        assert!(!v.anchors_point_to_agent(&p));
        assert!(!v.canonical_points_to_agent(&p));
        assert!(v.text_mentions_agent_url(&p));
        assert!(v.verify(&p));

        assert!(!v.text_mentions_agent_url(&page("", "<p>huizemark.com/agents/someone-else/11111/</p>")));
    }

    #[test]
    fn name_in_text_needs_residential_fragment() {
        let v = verifier();
        assert!(!v.verify(&page("", "<p>Contact Blessing Nsibande today</p>")));
        assert!(v.verify(&page(
            "",
            "<p>Contact BLESSING Nsibande, see /results/residential/ for more</p>"
        )));
    }

    #[test]
    fn name_pattern_tolerates_middle_words() {
        let re = name_pattern("blessing nsibande").unwrap();
        assert!(re.is_match("Blessing Thandi Nsibande"));
        assert!(!re.is_match("Nsibande Blessing"));
        assert!(!re.is_match("Blessingsnsibande"));
        assert!(name_pattern("   ").is_none());
    }
}
