//! Tag model: one documentable unit handed to the renderer.

use std::collections::HashMap;

use serde::Serialize;

/// Tag kinds produced by the matchers.
pub mod kind {
    pub const NAME: &str = "name";
    pub const VAR: &str = "var";
    pub const PARAM: &str = "param";
    pub const RETURNS: &str = "returns";
    pub const TYPE: &str = "type";
    pub const THROWS: &str = "throws";
    pub const CLASS: &str = "class";
    pub const HEADING: &str = "heading";
    /// Single-line variable block.
    pub const INLINE: &str = "inline";
}

/// A recognized semantic unit: the function name, one parameter, the
/// return value and so on.
///
/// `tag` is always present. The other fields render as the empty string
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn type_name(mut self, type_name: Option<String>) -> Self {
        self.type_name = type_name;
        self
    }

    /// Look up a field by its template section name.
    ///
    /// Unknown names and absent fields both yield `None`.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "tag" => Some(self.tag.as_str()),
            "identifier" => self.identifier.as_deref(),
            "value" => self.value.as_deref(),
            "type" => self.type_name.as_deref(),
            _ => None,
        }
    }
}

/// A partial tag as emitted by a tree-pattern leaf or declared on a
/// pattern level. Merging lets a narrow field set override broad ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFields {
    pub tag: Option<String>,
    pub identifier: Option<String>,
    pub value: Option<String>,
    pub type_name: Option<String>,
}

impl TagFields {
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Default::default()
        }
    }

    /// Fill every field `self` leaves unset from `base`.
    pub fn over(self, base: &TagFields) -> TagFields {
        TagFields {
            tag: self.tag.or_else(|| base.tag.clone()),
            identifier: self.identifier.or_else(|| base.identifier.clone()),
            value: self.value.or_else(|| base.value.clone()),
            type_name: self.type_name.or_else(|| base.type_name.clone()),
        }
    }

    /// Promote to a full tag. A field set that never received a tag kind
    /// cannot be rendered and is dropped.
    pub fn into_tag(self) -> Option<Tag> {
        Some(Tag {
            tag: self.tag?,
            identifier: self.identifier,
            value: self.value,
            type_name: self.type_name,
        })
    }
}

impl From<Tag> for TagFields {
    fn from(tag: Tag) -> Self {
        TagFields {
            tag: Some(tag.tag),
            identifier: tag.identifier,
            value: tag.value,
            type_name: tag.type_name,
        }
    }
}

/// Per-field value translation applied before rendering, e.g. raw syntax
/// node kinds to human type names.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    tag: HashMap<String, String>,
    identifier: HashMap<String, String>,
    value: HashMap<String, String>,
    type_name: HashMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, from: &str, to: &str) -> Self {
        self.tag.insert(from.to_string(), to.to_string());
        self
    }

    pub fn identifier(mut self, from: &str, to: &str) -> Self {
        self.identifier.insert(from.to_string(), to.to_string());
        self
    }

    pub fn value(mut self, from: &str, to: &str) -> Self {
        self.value.insert(from.to_string(), to.to_string());
        self
    }

    pub fn type_name(mut self, from: &str, to: &str) -> Self {
        self.type_name.insert(from.to_string(), to.to_string());
        self
    }

    /// Translate each field that has an entry; leave the rest unchanged.
    pub fn translate(&self, tag: Tag) -> Tag {
        let lookup = |map: &HashMap<String, String>, v: Option<String>| {
            v.map(|v| map.get(&v).cloned().unwrap_or(v))
        };
        Tag {
            tag: self.tag.get(&tag.tag).cloned().unwrap_or(tag.tag),
            identifier: lookup(&self.identifier, tag.identifier),
            value: lookup(&self.value, tag.value),
            type_name: lookup(&self.type_name, tag.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_none() {
        let tag = Tag::new("param").identifier("a");
        assert_eq!(tag.field("tag"), Some("param"));
        assert_eq!(tag.field("identifier"), Some("a"));
        assert_eq!(tag.field("type"), None);
        assert_eq!(tag.field("nonsense"), None);
    }

    #[test]
    fn narrow_fields_override_broad() {
        let broad = TagFields {
            tag: Some("param".into()),
            identifier: Some("ignored".into()),
            ..Default::default()
        };
        let tag = TagFields::identifier("x").over(&broad).into_tag().unwrap();
        assert_eq!(tag.tag, "param");
        assert_eq!(tag.identifier.as_deref(), Some("x"));
    }

    #[test]
    fn fields_without_kind_are_dropped() {
        assert!(TagFields::identifier("x").into_tag().is_none());
    }

    #[test]
    fn dictionary_translates_known_values_only() {
        let dict = Dictionary::new().type_name("number", "Number");
        let tag = dict.translate(Tag::new("param").type_name(Some("number".into())));
        assert_eq!(tag.type_name.as_deref(), Some("Number"));
        let tag = dict.translate(Tag::new("param").type_name(Some("call_expression".into())));
        assert_eq!(tag.type_name.as_deref(), Some("call_expression"));
    }
}
