//! Internal DTD entities (`<!ENTITY owl "http://www.w3.org/2002/07/owl#">`).
//!
//! Ontology editors routinely abbreviate IRIs this way, e.g.
//! `rdf:resource="&owl;Class"`. Only general entities with literal values are
//! collected; parameter entities and external ids are ignored.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_:][\w.:\-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities(HashMap<String, String>);

impl Entities {
    /// Collect declarations from the content of a `<!DOCTYPE ...>`.
    /// The first declaration of a name wins, as in XML.
    pub fn extend_from_doctype(&mut self, doctype: &str) {
        for caps in ENTITY_DECL.captures_iter(doctype) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            self.0
                .entry(caps[1].to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replacement text for `&name;`, predefined XML entities included.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let predefined = match name {
            "lt" => Some("<"),
            "gt" => Some(">"),
            "amp" => Some("&"),
            "apos" => Some("'"),
            "quot" => Some("\""),
            _ => None,
        };
        predefined.or_else(|| self.0.get(name).map(String::as_str))
    }
}
