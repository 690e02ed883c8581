use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, TypeStyle};
use crate::tag::kind;

use super::{default_templates, enclosed, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType, VarDecl};

const NAME: &str = r"[a-zA-Z_-][a-zA-Z0-9_-]*";

// @mixin name(   /   @function name(   /   @mixin name {
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*@(?P<kind>mixin|function)\s+(?P<name>{NAME})\s*")).unwrap()
});

static RE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*\$(?P<name>{NAME})\s*:\s*(?P<val>.*?)\s*(?:!default|!global)*\s*;?\s*$"
    ))
    .unwrap()
});

static RE_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})\b|(?:rgba?|hsla?)\()").unwrap());

static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-+]?\.?\d").unwrap());

static RE_DOC_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*///").unwrap());

pub struct Sass {
    settings: LanguageSettings,
    style: TypeStyle,
}

impl Sass {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            settings: LanguageSettings {
                // declarations are one line; indented syntax has no terminator to scan for
                fn_opener: None,
                prefix: "///",
                closer: None,
                type_tag: Some("type"),
                curly_types: true,
                type_info: true,
                primitives: Primitives::capitalized(style, ("Boolean", "Bool"), "Function"),
            },
            style,
        }
    }

    fn styled(&self, name: &str) -> String {
        if self.style.lower_case_primitives {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

impl Language for Sass {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let open = caps.get(0)?.end();
        let args = line[open..].starts_with('(').then(|| enclosed(line, open).0);
        let mut decl = FunctionDecl::new(&caps["name"], args);
        decl.procedure = &caps["kind"] == "mixin";
        Some(decl)
    }

    fn parse_var(&self, line: &str) -> Option<VarDecl> {
        let caps = RE_VAR.captures(line)?;
        Some(VarDecl {
            name: format!("${}", &caps["name"]),
            value: Some(caps["val"].to_string()).filter(|v| !v.is_empty()),
            type_name: None,
        })
    }

    /// `$name: default` and `$args...`
    fn get_arg_name(&self, arg: &str) -> Option<String> {
        let name = arg.split(':').next().unwrap_or(arg).trim();
        let name = name.strip_suffix("...").unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    }

    fn get_arg_value(&self, arg: &str) -> Option<String> {
        arg.split_once(':')
            .map(|(_, value)| value.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn guess_type_from_value(&self, value: &str) -> Option<String> {
        let value = value.trim();
        let primitives = &self.settings.primitives;
        let first = value.chars().next()?;
        if first == '(' {
            let name = if value.contains(':') { "Map" } else { "List" };
            return Some(self.styled(name));
        }
        if RE_COLOR.is_match(value) {
            return Some(self.styled("Color"));
        }
        if RE_NUMBER.is_match(value) {
            return Some(primitives.number.clone());
        }
        if first == '"' || first == '\'' {
            return Some(primitives.string.clone());
        }
        match value {
            "null" => Some(self.styled("Null")),
            "true" | "false" => Some(primitives.boolean.clone()),
            _ if value.contains(',') => Some(self.styled("List")),
            _ => None,
        }
    }

    fn function_return_type(&self, _name: &str, return_type: Option<&str>) -> ReturnType {
        match return_type {
            Some(declared) => ReturnType::Declared(declared.to_string()),
            None => ReturnType::Infer,
        }
    }

    fn is_existing_comment(&self, line: &str) -> bool {
        RE_DOC_COMMENT.is_match(line)
    }

    /// Parameters show their default as `$name [default]`.
    fn templates(&self, config: &Config) -> Vec<(&'static str, String)> {
        let mut templates = default_templates(self.settings(), config);
        for (tag, template) in &mut templates {
            if *tag == kind::PARAM {
                *template = template.replacen("{identifier}", "{identifier}{& value  [{value}]}", 1);
            }
        }
        templates
    }
}
