//! Recursive template renderer and its closed rule set.
//!
//! Sections are walked left to right. A section naming a rule hands the
//! following sections to that rule as arguments and skips them; any other
//! name is a field lookup on the current tag. Nested templates render in
//! place. Missing fields render as the empty string.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};

use crate::tag::Tag;
use crate::template::{Section, Template};

/// Template rules, keyed by their section identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `date`: current date, `YYYY-MM-DD`.
    Date,
    /// `datetime`: current date-time, ISO-8601 without the trailing `Z`.
    DateTime,
    /// `=`: field if truthy, else the fallback argument.
    Equals,
    /// `&`: the argument if the field is truthy, else nothing.
    IsSet,
    /// `||`: field if present (even empty), else the fallback argument.
    Or,
    /// `&&`: the argument if the field is present, else nothing.
    And,
    /// `$`: numbered placeholder around the argument, or a bare `$n`.
    TabStop,
    /// `@`: render once per tag of the given kind.
    Each,
}

impl Rule {
    pub fn from_identifier(identifier: &str) -> Option<Rule> {
        Some(match identifier {
            "date" => Rule::Date,
            "datetime" => Rule::DateTime,
            "=" => Rule::Equals,
            "&" => Rule::IsSet,
            "||" => Rule::Or,
            "&&" => Rule::And,
            "$" => Rule::TabStop,
            "@" => Rule::Each,
            _ => return None,
        })
    }

    pub fn identifier(self) -> &'static str {
        match self {
            Rule::Date => "date",
            Rule::DateTime => "datetime",
            Rule::Equals => "=",
            Rule::IsSet => "&",
            Rule::Or => "||",
            Rule::And => "&&",
            Rule::TabStop => "$",
            Rule::Each => "@",
        }
    }

    pub(crate) fn min_arguments(self) -> usize {
        match self {
            Rule::Date | Rule::DateTime | Rule::TabStop => 0,
            Rule::Each => 1,
            Rule::Equals | Rule::IsSet | Rule::Or | Rule::And => 2,
        }
    }

    pub(crate) fn max_arguments(self) -> usize {
        match self {
            Rule::Date | Rule::DateTime => 0,
            Rule::TabStop => 1,
            Rule::Equals | Rule::IsSet | Rule::Or | Rule::And | Rule::Each => 2,
        }
    }

    /// Offset of the argument that must be a plain name (field or tag kind).
    pub(crate) fn field_argument(self) -> Option<usize> {
        match self {
            Rule::Equals | Rule::IsSet | Rule::Or | Rule::And | Rule::Each => Some(1),
            Rule::Date | Rule::DateTime | Rule::TabStop => None,
        }
    }
}

/// Renders templates against tags.
///
/// One renderer serves one docblock: the tab-stop counter lives here and
/// never carries over to the next generation.
pub struct Renderer<'a> {
    templates: &'a HashMap<String, Template>,
    tags: &'a [Tag],
    next_stop: usize,
}

impl<'a> Renderer<'a> {
    /// `templates` resolve `@ kind` sections without an inline template;
    /// `tags` are the candidates `@` iterates over.
    pub fn new(templates: &'a HashMap<String, Template>, tags: &'a [Tag]) -> Self {
        Self {
            templates,
            tags,
            next_stop: 1,
        }
    }

    pub fn render(&mut self, template: &Template, tag: &Tag) -> String {
        let sections = template.sections();
        let literals = template.literals();
        let mut out = String::new();
        out.push_str(&literals[0]);

        let mut i = 0;
        let mut skip_until = 0;
        while i < sections.len() {
            if i >= skip_until {
                let (consumed, value) = self.resolve(i, sections, tag);
                out.push_str(&value);
                skip_until = i + consumed + 1;
            }
            out.push_str(&literals[i + 1]);
            i += 1;
        }
        out
    }

    /// Resolve section `i`, returning how many following sections it
    /// consumed as arguments together with its text.
    fn resolve(&mut self, i: usize, sections: &[Section], tag: &Tag) -> (usize, String) {
        let name = match &sections[i] {
            Section::Template(nested) => return (0, self.render(nested, tag)),
            Section::Stop => return (0, format!("${}", self.take_stop())),
            Section::Name(name) => name.as_str(),
        };
        let Some(rule) = Rule::from_identifier(name) else {
            return (0, tag.field(name).map(escape).unwrap_or_default());
        };

        let field = || {
            sections
                .get(i + 1)
                .and_then(Section::as_name)
                .and_then(|f| tag.field(f))
        };
        match rule {
            Rule::Date => (0, Utc::now().format("%Y-%m-%d").to_string()),
            Rule::DateTime => {
                let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                (0, now.trim_end_matches('Z').to_string())
            }
            Rule::Equals => match field().filter(|v| !v.is_empty()) {
                Some(value) => (2, escape(value)),
                None => (2, self.argument(sections.get(i + 2), tag)),
            },
            Rule::IsSet => match field().filter(|v| !v.is_empty()) {
                Some(_) => (2, self.argument(sections.get(i + 2), tag)),
                None => (2, String::new()),
            },
            Rule::Or => match field() {
                Some(value) => (2, escape(value)),
                None => (2, self.argument(sections.get(i + 2), tag)),
            },
            Rule::And => match field() {
                Some(_) => (2, self.argument(sections.get(i + 2), tag)),
                None => (2, String::new()),
            },
            Rule::TabStop => {
                let stop = self.take_stop();
                match sections.get(i + 1) {
                    Some(arg) => {
                        let text = self.argument(Some(arg), tag);
                        (1, format!("${{{}:{}}}", stop, text))
                    }
                    None => (0, format!("${}", stop)),
                }
            }
            Rule::Each => {
                let kind = sections.get(i + 1).and_then(Section::as_name).unwrap_or_default();
                let (consumed, inline) = match sections.get(i + 2) {
                    Some(Section::Template(t)) => (2, Some(t)),
                    _ => (1, None),
                };
                let templates = self.templates;
                let Some(template) = inline.or_else(|| templates.get(kind)) else {
                    return (consumed, String::new());
                };
                let tags = self.tags;
                let out = tags
                    .iter()
                    .filter(|t| t.tag == kind)
                    .map(|t| self.render(template, t))
                    .collect::<String>();
                (consumed, out)
            }
        }
    }

    fn take_stop(&mut self) -> usize {
        let stop = self.next_stop;
        self.next_stop += 1;
        stop
    }

    /// A rule argument: nested templates render, names are literal text.
    fn argument(&mut self, section: Option<&Section>, tag: &Tag) -> String {
        match section {
            Some(Section::Template(t)) => self.render(t, tag),
            Some(Section::Name(text)) => text.clone(),
            Some(Section::Stop) => format!("${}", self.take_stop()),
            None => String::new(),
        }
    }
}

/// Render a template against a single tag with a fresh tab-stop counter.
pub fn render(template: &Template, tag: &Tag) -> String {
    let templates = HashMap::new();
    Renderer::new(&templates, &[]).render(template, tag)
}

/// Escape snippet metacharacters in text taken from source code.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(source: &str) -> Template {
        Template::parse(source).unwrap()
    }

    #[test]
    fn field_lookup_and_missing_field() {
        let tag = Tag::new("param").identifier("a");
        assert_eq!(render(&t("<{identifier}|{type}>"), &tag), "<a|>");
    }

    #[test]
    fn equals_falls_back_when_empty() {
        let tpl = t("{= type [type]}");
        let typed = Tag::new("param").type_name(Some("Number".into()));
        assert_eq!(render(&tpl, &typed), "Number");
        let empty = Tag::new("param").type_name(Some(String::new()));
        assert_eq!(render(&tpl, &empty), "[type]");
    }

    #[test]
    fn is_set_emits_argument_only_when_truthy() {
        let tpl = t("{identifier}{& value =}{value}");
        let tag = Tag::new("param").identifier("b").value(Some("1".into()));
        assert_eq!(render(&tpl, &tag), "b=1");
        assert_eq!(render(&tpl, &Tag::new("param").identifier("b")), "b");
    }

    #[test]
    fn or_and_distinguish_empty_from_absent() {
        let or = t("{|| value none}");
        let and = t("{&& value set}");
        let empty = Tag::new("param").value(Some(String::new()));
        let absent = Tag::new("param");
        assert_eq!(render(&or, &empty), "");
        assert_eq!(render(&or, &absent), "none");
        assert_eq!(render(&and, &empty), "set");
        assert_eq!(render(&and, &absent), "");
    }

    #[test]
    fn tab_stops_count_within_one_render() {
        let tpl = t("{$ first} {$ second} {$}");
        let tag = Tag::new("name");
        assert_eq!(render(&tpl, &tag), "${1:first} ${2:second} $3");
        // a new render starts over
        assert_eq!(render(&tpl, &tag), "${1:first} ${2:second} $3");
    }

    #[test]
    fn bare_tab_stop_leaves_next_field_alone() {
        let tag = Tag::new("param").identifier("x");
        assert_eq!(render(&t("{$} {identifier}"), &tag), "$1 x");
        assert_eq!(render(&t("{$}{$ [type]}"), &tag), "$1${2:[type]}");
    }

    #[test]
    fn tab_stop_wraps_nested_template() {
        let tpl = t("{$ {|| value [description]}}");
        let tag = Tag::new("name").value(Some("Adds".into()));
        assert_eq!(render(&tpl, &tag), "${1:Adds}");
        assert_eq!(render(&tpl, &Tag::new("name")), "${1:[description]}");
    }

    #[test]
    fn each_repeats_over_matching_tags() {
        let tags = vec![
            Tag::new("param").identifier("a"),
            Tag::new("returns"),
            Tag::new("param").identifier("b"),
        ];
        let mut templates = HashMap::new();
        templates.insert("param".to_string(), t("[{identifier}]"));
        let mut renderer = Renderer::new(&templates, &tags);
        let out = renderer.render(&t("{@ param}|{@ param <{identifier}>}"), &Tag::new("name"));
        assert_eq!(out, "[a][b]|<a><b>");
    }

    #[test]
    fn each_without_template_renders_nothing() {
        let tags = vec![Tag::new("param").identifier("a")];
        let templates = HashMap::new();
        let mut renderer = Renderer::new(&templates, &tags);
        assert_eq!(renderer.render(&t("x{@ param}y"), &Tag::new("name")), "xy");
    }

    #[test]
    fn date_rules_are_iso() {
        let tag = Tag::new("name");
        let date = render(&t("{date}"), &tag);
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        let datetime = render(&t("{datetime}"), &tag);
        assert!(datetime.starts_with(&date[..4]));
        assert!(datetime.contains('T'));
        assert!(!datetime.ends_with('Z'));
    }

    #[test]
    fn field_values_are_escaped() {
        let tag = Tag::new("param").identifier("$foo");
        assert_eq!(render(&t("{identifier}"), &tag), "\\$foo");
    }

    #[test]
    fn render_is_idempotent() {
        let tpl = t("@param {= type {$ [type]}} {identifier} {$ [description]}");
        let tag = Tag::new("param").identifier("a").type_name(Some("String".into()));
        assert_eq!(render(&tpl, &tag), render(&tpl, &tag));
    }
}
