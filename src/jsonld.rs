//! Linked-data (`application/ld+json`) blocks embedded in listing pages.
//!
//! Blocks are parsed into generic `serde_json::Value` trees and walked
//! depth-first so extractors can scan every mapping node without caring how
//! the publisher nested them (`@graph` wrappers, arrays of entities, offers
//! inside products, agents inside offers...).

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Parses every linked-data script in `document`. Blocks that fail to parse
/// are skipped.
pub fn parse_blocks(document: &Html) -> Vec<Value> {
    static SCRIPT: OnceLock<Selector> = OnceLock::new();
    let selector = SCRIPT.get_or_init(|| {
        Selector::parse("script[type='application/ld+json']").expect("valid selector")
    });

    let mut blocks = Vec::new();
    for script in document.select(selector) {
        let raw = script.text().collect::<String>();
        if raw.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => blocks.push(value),
            Err(e) => debug!("skipping malformed ld+json block: {}", e),
        }
    }
    blocks
}

/// Lazily yields every mapping node in `roots`, depth-first, parents before
/// children, siblings in document order.
pub fn nodes(roots: &[Value]) -> Nodes<'_> {
    Nodes {
        stack: roots.iter().rev().collect(),
    }
}

pub struct Nodes<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Map<String, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(value) = self.stack.pop() {
            match value {
                Value::Object(map) => {
                    self.stack.extend(map.values().rev());
                    return Some(map);
                }
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                _ => {}
            }
        }
        None
    }
}

/// String value of `key`, or of `key.name` when the value is a nested node.
pub fn string_field<'a>(node: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    match node.get(key)? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(inner) => inner.get("name").and_then(Value::as_str),
        _ => None,
    }
}
