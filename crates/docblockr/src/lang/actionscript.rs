use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{enclosed, FunctionDecl, Language, LanguageSettings, Primitives};

const IDENT: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"function(?:\s+[gs]et)?(?:\s+{IDENT})?\s*\(")).unwrap()
});

// name = function(   /   name: function(   /   function get name(
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:(?P<assigned>{IDENT})(?::{IDENT})?\s*[:=]\s*)?function(?:\s+(?P<accessor>[gs]et))?(?:\s+(?P<name>{IDENT}))?\s*\("
    ))
    .unwrap()
});

static RE_ARG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*(?:\.\.\.)?({IDENT})(?::{IDENT}|:\*)?(?:\s*=.*)?")).unwrap());

pub struct ActionScript {
    settings: LanguageSettings,
}

impl ActionScript {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: None,
                curly_types: false,
                type_info: false,
                primitives: Primitives::capitalized(style, ("Boolean", "Bool"), "Function"),
            },
        }
    }
}

impl Language for ActionScript {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let name = caps
            .name("assigned")
            .or_else(|| caps.name("name"))
            .map_or("", |m| m.as_str());
        let open = caps.get(0)?.end() - 1;
        let mut decl = FunctionDecl::new(name, Some(enclosed(line, open).0));
        decl.procedure = caps.name("accessor").is_some_and(|m| m.as_str() == "set");
        Some(decl)
    }

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        RE_ARG_NAME
            .captures(arg)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Types are in the signature already.
    fn get_arg_type(&self, _arg: &str) -> Option<String> {
        None
    }
}
