use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, TypeStyle};
use crate::tag::{kind, Tag};

use super::{
    enclosed, scan_definition, split_args, Argument, ClassDecl, FunctionDecl, Language, LanguageSettings,
    LineSource, Primitives, ReturnType, VarDecl,
};

const IDENT: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";
const PREAMBLE: &str = r#"^\s*(?:pub(?:\s*\([^)]*\))?\s+)?(?:(?:const|async|unsafe|default|extern(?:\s+"[^"]*")?)\s+)*"#;

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"{PREAMBLE}fn\s")).unwrap());

static RE_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{PREAMBLE}fn\s+(?P<name>{IDENT})\s*")).unwrap());

static RE_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*->\s*(?P<ret>.+?)\s*(?:\bwhere\b.*|\{.*)?$").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:pub(?:\s*\([^)]*\))?\s+)?(?:unsafe\s+)?(?:struct|trait|enum|union|type)\s+(?P<name>{IDENT})"
    ))
    .unwrap()
});

static RE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:let(?:\s+mut)?|(?:pub(?:\s*\([^)]*\))?\s+)?(?:const|static(?:\s+mut)?))\s+(?P<name>{IDENT})\s*(?::\s*(?P<type>[^=]+?))?\s*(?:=\s*(?P<val>.*?))?\s*;?\s*$"
    ))
    .unwrap()
});

static RE_DOC_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*///").unwrap());

pub struct Rust {
    settings: LanguageSettings,
}

impl Rust {
    pub fn new(style: TypeStyle) -> Self {
        let mut primitives = Primitives::capitalized(style, ("bool", "bool"), "fn");
        primitives.boolean = "bool".to_string();
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: "///",
                closer: None,
                type_tag: None,
                curly_types: false,
                type_info: false,
                primitives,
            },
        }
    }
}

fn is_receiver(arg: &str) -> bool {
    let name = arg.split(':').next().unwrap_or(arg);
    let name = name.trim().trim_start_matches('&').trim_start();
    let name = name.strip_prefix("mut ").unwrap_or(name).trim();
    // `&'a self`, `&'a mut self`
    name == "self" || name.ends_with(" self")
}

impl Language for Rust {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let mut open = caps.get(0)?.end();
        if line[open..].starts_with('<') {
            open = enclosed(line, open).1;
            open += line[open..].len() - line[open..].trim_start().len();
        }
        if !line[open..].starts_with('(') {
            return None;
        }
        let (args, end) = enclosed(line, open);
        let return_type = RE_RETURN.captures(&line[end..]).map(|c| c["ret"].to_string());
        Some(FunctionDecl::new(&caps["name"], Some(args)).returning(return_type.as_deref()))
    }

    fn parse_var(&self, line: &str) -> Option<VarDecl> {
        let caps = RE_VAR.captures(line)?;
        Some(VarDecl {
            name: caps["name"].to_string(),
            value: caps.name("val").map(|m| m.as_str().to_string()).filter(|v| !v.is_empty()),
            type_name: caps.name("type").map(|m| m.as_str().trim().to_string()),
        })
    }

    fn parse_class(&self, line: &str) -> Option<ClassDecl> {
        let caps = RE_CLASS.captures(line)?;
        Some(ClassDecl {
            name: caps["name"].to_string(),
        })
    }

    /// Typed parameters only; the receiver is not documented.
    fn parse_args(&self, args: &str) -> Vec<Argument> {
        split_args(args)
            .into_iter()
            .filter(|a| a.contains(':') && !is_receiver(a))
            .map(|raw| Argument {
                name: self.get_arg_name(&raw).unwrap_or_default(),
                type_name: self.get_arg_type(&raw),
                value: None,
                raw,
            })
            .collect()
    }

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        let (name, _) = arg.split_once(':')?;
        let name = name.trim();
        Some(name.strip_prefix("mut ").unwrap_or(name).trim().to_string())
    }

    fn get_arg_type(&self, arg: &str) -> Option<String> {
        arg.split_once(':').map(|(_, ty)| ty.trim().to_string())
    }

    /// No `->` means unit.
    fn function_return_type(&self, _name: &str, return_type: Option<&str>) -> ReturnType {
        match return_type {
            Some(declared) => ReturnType::Declared(declared.to_string()),
            None => ReturnType::Omitted,
        }
    }

    fn get_definition(&self, source: &dyn LineSource, row: usize) -> String {
        scan_definition(self.settings(), source, row, |line| line.trim_start().starts_with("#["))
    }

    fn is_existing_comment(&self, line: &str) -> bool {
        RE_DOC_COMMENT.is_match(line)
    }

    fn templates(&self, _config: &Config) -> Vec<(&'static str, String)> {
        vec![
            (kind::NAME, "{$ {|| value [short description]}}\n\n{$ [long description]}".to_string()),
            (kind::VAR, "{$ describe {identifier}}".to_string()),
            (kind::CLASS, "{$ describe {identifier}}".to_string()),
            (kind::HEADING, "\n# {identifier}\n".to_string()),
            (kind::PARAM, "* `{identifier}` - {$ [description]}".to_string()),
            (kind::RETURNS, "\n# Returns\n\n{$ [returns description]}".to_string()),
            (kind::INLINE, "{$ [description]}".to_string()),
        ]
    }

    /// Parameters go under a heading. Description flags drop whole sections.
    fn arrange(&self, tags: Vec<Tag>, config: &Config) -> Vec<Tag> {
        let mut out = Vec::with_capacity(tags.len() + 1);
        let mut heading = false;
        for tag in tags {
            match tag.tag.as_str() {
                kind::PARAM if !config.param_description => continue,
                kind::RETURNS if !config.return_description => continue,
                kind::PARAM if !heading => {
                    out.push(Tag::new(kind::HEADING).identifier("Parameters"));
                    heading = true;
                }
                _ => {}
            }
            out.push(tag);
        }
        out
    }
}
