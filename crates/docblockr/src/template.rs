//! Template model and the brace mini-language.
//!
//! A template is a `[literals, sections]` pair with one more literal than
//! sections. Rendering interleaves them: `lit0 sec0 lit1 sec1 ... litN`.
//! A section is a field name, a rule identifier, a rule argument, or a
//! nested template.
//!
//! The brace form compiles to the same pair:
//!
//! - `{type}`: field lookup (or an argument-less rule like `{date}`)
//! - `{$ [description]}`: tab stop around a default
//! - `{$}`: bare numbered tab stop
//! - `{= type [type]}`, `{& value =}`, `{|| value none}`, `{&& value set}`
//! - `{@ param}` / `{@ param ...nested...}`: repeat over matching tags
//! - `\{` and `\}`: literal braces
//!
//! A rule argument containing `{` is parsed as a nested template.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::render::Rule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Name(String),
    Template(Template),
    /// A tab stop with no default; never takes the next section as argument.
    Stop,
}

impl Section {
    pub fn name(name: impl Into<String>) -> Self {
        Section::Name(name.into())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Section::Name(name) => Some(name),
            Section::Template(_) | Section::Stop => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    literals: Vec<String>,
    sections: Vec<Section>,
}

impl Template {
    /// Build a template from its raw pair, rejecting mismatched lengths
    /// and rules that lack their arguments.
    pub fn new(literals: Vec<String>, sections: Vec<Section>) -> std::result::Result<Self, String> {
        if literals.len() != sections.len() + 1 {
            return Err(format!(
                "expected {} literal segments for {} sections, found {}",
                sections.len() + 1,
                sections.len(),
                literals.len()
            ));
        }
        validate_rules(&sections)?;
        Ok(Self { literals, sections })
    }

    /// A template with no sections.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            literals: vec![text.into()],
            sections: Vec::new(),
        }
    }

    /// Compile the brace form.
    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let mut literals = Vec::new();
        let mut sections = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '\\' if matches!(chars.peek(), Some((_, '{' | '}'))) => {
                    if let Some((_, escaped)) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '{' => {
                    let end = matching_brace(source, pos)
                        .ok_or_else(|| format!("unclosed '{{' at byte {}", pos))?;
                    let group = parse_group(&source[pos + 1..end])?;
                    for (i, section) in group.into_iter().enumerate() {
                        literals.push(if i == 0 {
                            std::mem::take(&mut literal)
                        } else {
                            String::new()
                        });
                        sections.push(section);
                    }
                    while chars.peek().is_some_and(|(p, _)| *p <= end) {
                        chars.next();
                    }
                }
                '}' => return Err(format!("unmatched '}}' at byte {}", pos)),
                _ => literal.push(c),
            }
        }
        literals.push(literal);
        Template::new(literals, sections)
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

/// Find the `}` closing the `{` at `open`, honoring nesting and escapes.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in source[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Compile the inside of one `{...}` group into its sections.
fn parse_group(content: &str) -> std::result::Result<Vec<Section>, String> {
    let content = content.trim_start();
    let (head, rest) = split_token(content);
    if head.is_empty() {
        return Err("empty section".to_string());
    }

    let mut out = vec![Section::name(head)];
    match Rule::from_identifier(head) {
        Some(Rule::TabStop) if rest.is_empty() => return Ok(vec![Section::Stop]),
        Some(Rule::TabStop) => out.push(argument(rest)?),
        Some(rule @ (Rule::Equals | Rule::IsSet | Rule::Or | Rule::And)) => {
            let (field, rest) = split_token(rest);
            if field.is_empty() {
                return Err(format!("rule '{}' needs a field name", rule.identifier()));
            }
            out.push(Section::name(field));
            out.push(argument(rest)?);
        }
        Some(Rule::Each) => {
            let (kind, rest) = split_token(rest);
            if kind.is_empty() {
                return Err("rule '@' needs a tag kind".to_string());
            }
            out.push(Section::name(kind));
            if !rest.is_empty() {
                out.push(Section::Template(Template::parse(rest)?));
            }
        }
        Some(Rule::Date | Rule::DateTime) | None => {
            if !rest.is_empty() {
                return Err(format!("unexpected text after '{}': {}", head, rest));
            }
        }
    }
    Ok(out)
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(pos) => {
            let rest = &s[pos..];
            // drop exactly the separating whitespace character
            let skip = rest.chars().next().map_or(0, char::len_utf8);
            (&s[..pos], &rest[skip..])
        }
        None => (s, ""),
    }
}

/// A rule argument: nested template when it has sections, plain text otherwise.
fn argument(text: &str) -> std::result::Result<Section, String> {
    let template = Template::parse(text)?;
    if template.sections.is_empty() {
        Ok(Section::Name(template.literals.into_iter().next().unwrap_or_default()))
    } else {
        Ok(Section::Template(template))
    }
}

fn validate_rules(sections: &[Section]) -> std::result::Result<(), String> {
    let mut i = 0;
    while i < sections.len() {
        if let Some(rule) = sections[i].as_name().and_then(Rule::from_identifier) {
            let needed = rule.min_arguments();
            if i + needed >= sections.len() {
                return Err(format!(
                    "rule '{}' at section {} needs {} argument(s)",
                    rule.identifier(),
                    i,
                    needed
                ));
            }
            if let Some(kind) = rule.field_argument() {
                if sections.get(i + kind).and_then(Section::as_name).is_none() {
                    return Err(format!(
                        "rule '{}' at section {} needs a name, not a template",
                        rule.identifier(),
                        i
                    ));
                }
            }
            i += rule.max_arguments().min(sections.len() - i - 1);
        }
        i += 1;
    }
    Ok(())
}

// -- Configuration form -------------------------------------------------------

/// A template as written in configuration: brace form or raw pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateSource {
    Brace(String),
    Raw(RawTemplate),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTemplate(Vec<String>, Vec<RawSection>);

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSection {
    Name(String),
    Nested(RawTemplate),
}

impl TemplateSource {
    /// Compile and validate; `name` identifies the template in errors.
    pub fn compile(&self, name: &str) -> Result<Template> {
        let compiled = match self {
            TemplateSource::Brace(source) => Template::parse(source),
            TemplateSource::Raw(raw) => raw.compile(),
        };
        compiled.map_err(|reason| Error::template(name, reason))
    }
}

impl RawTemplate {
    fn compile(&self) -> std::result::Result<Template, String> {
        let sections = self
            .1
            .iter()
            .map(|section| match section {
                RawSection::Name(name) => Ok(Section::name(name.clone())),
                RawSection::Nested(raw) => raw.compile().map(Section::Template),
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;
        Template::new(self.0.clone(), sections)
    }
}
