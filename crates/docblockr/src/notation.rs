//! Language-agnostic type guessing from identifiers and values.
//!
//! Each candidate type carries a list of checks. A type matches when every
//! check passes, and a check passes when any one of its patterns does. The
//! first matching type, in declaration order, wins.

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Type name meaning "no type": documenting one would be noise.
pub const NONE: &str = "NONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Check {
    Regex,
    Prefix,
    Suffix,
    Equals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotationRule {
    pub check: Check,
    pub patterns: Vec<String>,
}

impl NotationRule {
    fn new(check: Check, patterns: &[&str]) -> Self {
        Self {
            check,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered type name → checks table, as written in configuration.
pub type NotationMap = IndexMap<String, Vec<NotationRule>>;

/// The built-in table.
pub fn default_map() -> NotationMap {
    let mut map = NotationMap::new();
    map.insert(NONE.into(), vec![NotationRule::new(Check::Prefix, &["set", "add"])]);
    map.insert(
        "ARRAY".into(),
        vec![
            NotationRule::new(Check::Prefix, &["["]),
            NotationRule::new(Check::Suffix, &["]"]),
        ],
    );
    map.insert(
        "OBJECT".into(),
        vec![
            NotationRule::new(Check::Prefix, &["{"]),
            NotationRule::new(Check::Suffix, &["}"]),
        ],
    );
    map.insert(
        "STRING".into(),
        vec![
            NotationRule::new(Check::Prefix, &["'", "\"", "`"]),
            NotationRule::new(Check::Suffix, &["'", "\"", "`"]),
        ],
    );
    map.insert("NUMBER".into(), vec![NotationRule::new(Check::Regex, &[r"^[\d.]+$"])]);
    map.insert(
        "BOOLEAN".into(),
        vec![NotationRule::new(
            Check::Regex,
            &[r"^(?:is|has)(?:$|[A-Z_])", r"^(?:true|false)$"],
        )],
    );
    map.insert(
        "FUNCTION".into(),
        vec![NotationRule::new(
            Check::Equals,
            &["cb", "callback", "done", "next", "fn"],
        )],
    );
    map
}

enum Compiled {
    Regex(Vec<Regex>),
    Prefix(Vec<String>),
    Suffix(Vec<String>),
    Equals(Vec<String>),
}

impl Compiled {
    fn passes(&self, text: &str) -> bool {
        match self {
            Compiled::Regex(res) => res.iter().any(|re| re.is_match(text)),
            Compiled::Prefix(ps) => ps.iter().any(|p| text.starts_with(p.as_str())),
            Compiled::Suffix(ps) => ps.iter().any(|p| text.ends_with(p.as_str())),
            Compiled::Equals(ps) => ps.iter().any(|p| text == p),
        }
    }
}

/// A compiled notation table, read-only once built.
pub struct Notations {
    types: Vec<(String, Vec<Compiled>)>,
}

impl Notations {
    pub fn compile(map: &NotationMap) -> Result<Self> {
        let mut types = Vec::with_capacity(map.len());
        for (type_name, rules) in map {
            let mut compiled = Vec::with_capacity(rules.len());
            for rule in rules {
                compiled.push(match rule.check {
                    Check::Regex => Compiled::Regex(
                        rule.patterns
                            .iter()
                            .map(|p| {
                                Regex::new(p).map_err(|source| Error::Notation {
                                    type_name: type_name.clone(),
                                    pattern: p.clone(),
                                    source,
                                })
                            })
                            .collect::<Result<_>>()?,
                    ),
                    Check::Prefix => Compiled::Prefix(rule.patterns.clone()),
                    Check::Suffix => Compiled::Suffix(rule.patterns.clone()),
                    Check::Equals => Compiled::Equals(rule.patterns.clone()),
                });
            }
            types.push((type_name.clone(), compiled));
        }
        Ok(Self { types })
    }

    /// First type whose checks all pass for `text`.
    pub fn guess(&self, text: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, checks)| !checks.is_empty() && checks.iter().all(|c| c.passes(text)))
            .map(|(name, _)| name.as_str())
    }
}

impl Default for Notations {
    fn default() -> Self {
        // the built-in patterns are known to compile
        Self::compile(&default_map()).unwrap_or(Self { types: Vec::new() })
    }
}
