use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{argument, enclosed, split_args, Argument, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType, VARARGS};

const NAME: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";

/// `name`, `ns::name`, `name<T>`, `Class::~Class`.
static IDENTIFIER: LazyLock<String> =
    LazyLock::new(|| format!(r"{NAME}(?:::~?{NAME})*(?:<[^<>()]*>)?"));

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{id}[&*\s]+[&*]?{id}\s*\(", id = *IDENTIFIER)).unwrap()
});

// optional qualifiers and return type, then name and open paren
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?:static|inline|extern|virtual|explicit|constexpr|const|unsigned|signed|long|short|struct|enum)\s+)*(?:(?P<retval>{id}(?:\s*[&*]+)?)[&*\s]+)?(?P<name>~?{id})\s*\(",
        id = *IDENTIFIER
    ))
    .unwrap()
});

// type (with pointer/reference marks) followed by whitespace
static RE_ARG_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<type>(?:(?:const|unsigned|signed|struct|enum|long|short)\s+)*{id}(?:\s*[&*]+\s*|\s+))",
        id = *IDENTIFIER
    ))
    .unwrap()
});

static RE_ARG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?P<name>{NAME})\s*(?P<array>(?:\[[^\]]*\])*)\s*(?:=.*)?$")).unwrap()
});

const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "return", "sizeof", "catch"];

pub struct C {
    settings: LanguageSettings,
}

impl C {
    pub fn new(style: TypeStyle) -> Self {
        let mut primitives = Primitives::capitalized(style, ("bool", "bool"), "function");
        primitives.number = "int".to_string();
        primitives.string = "char*".to_string();
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("param"),
                curly_types: false,
                type_info: false,
                primitives,
            },
        }
    }
}

impl Language for C {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let name = &caps["name"];
        if KEYWORDS.contains(&name) {
            return None;
        }
        let retval = caps.name("retval").map(|m| m.as_str());
        if retval.is_some_and(|r| r == "return" || r == "else") {
            return None;
        }
        let open = caps.get(0)?.end() - 1;
        Some(FunctionDecl::new(name, Some(enclosed(line, open).0)).returning(retval))
    }

    fn parse_args(&self, args: &str) -> Vec<Argument> {
        if args.trim() == "void" {
            return Vec::new();
        }
        split_args(args).iter().map(|raw| argument(self, raw)).collect()
    }

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        if arg.trim() == "..." {
            return Some(VARARGS.to_string());
        }
        RE_ARG_NAME.captures(arg).map(|c| c["name"].to_string())
    }

    fn get_arg_type(&self, arg: &str) -> Option<String> {
        if arg.trim() == "..." {
            return Some(VARARGS.to_string());
        }
        let ty: String = RE_ARG_TYPE
            .captures(arg)?
            .name("type")?
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let array = RE_ARG_NAME
            .captures(arg)
            .and_then(|c| c.name("array"))
            .map_or(0, |m| m.as_str().matches('[').count());
        Some(ty + &"[]".repeat(array))
    }

    fn guess_type_from_value(&self, _value: &str) -> Option<String> {
        None
    }

    fn function_return_type(&self, name: &str, return_type: Option<&str>) -> ReturnType {
        // destructors
        if name.contains('~') {
            return ReturnType::Omitted;
        }
        match return_type {
            Some("void") => ReturnType::Omitted,
            Some(declared) => ReturnType::Declared(declared.split_whitespace().collect()),
            None => ReturnType::Infer,
        }
    }
}
