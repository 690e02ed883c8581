use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{enclosed, is_numeric, ClassDecl, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType, VarDecl};

const NAME: &str = r"[a-zA-Z_\x7f-\xff][a-zA-Z0-9_\x7f-\xff]*";

static RE_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"function(?:\s+&?\s*{NAME})?\s*\(")).unwrap());

// modifiers, `function`, optional by-reference mark, name, open paren
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?:abstract|final|public|protected|private|static)\s+)*function\s+&?\s*(?P<name>{NAME})\s*\("
    ))
    .unwrap()
});

static RE_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:\s*(?P<ret>\??\s*[a-zA-Z_\\][a-zA-Z0-9_\\|]*)").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+(?P<name>{NAME})")).unwrap()
});

static RE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?:var|public|private|protected|static|readonly)\s+)*(?:\??[a-zA-Z_\\][a-zA-Z0-9_\\]*\s+)?\$(?P<name>{NAME})\s*(?:=\s*(?P<val>.*?))?\s*[;,]?\s*$"
    ))
    .unwrap()
});

static RE_ARG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?:&\s*)?(?:\.\.\.)?\s*(?P<name>\${NAME})")).unwrap());

pub struct Php {
    settings: LanguageSettings,
    style: TypeStyle,
}

impl Php {
    pub fn new(style: TypeStyle) -> Self {
        let (number, boolean) = if style.short_primitives {
            ("int", "bool")
        } else {
            ("integer", "boolean")
        };
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("var"),
                curly_types: false,
                type_info: true,
                primitives: Primitives {
                    array: "array".to_string(),
                    object: "object".to_string(),
                    string: "string".to_string(),
                    number: number.to_string(),
                    boolean: boolean.to_string(),
                    function: "callable".to_string(),
                },
            },
            style,
        }
    }
}

impl Language for Php {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let open = caps.get(0)?.end() - 1;
        let (args, end) = enclosed(line, open);
        let return_type = RE_RETURN
            .captures(&line[end..])
            .and_then(|c| c.name("ret"))
            .map(|m| m.as_str().split_whitespace().collect::<String>());
        Some(FunctionDecl::new(&caps["name"], Some(args)).returning(return_type.as_deref()))
    }

    fn parse_var(&self, line: &str) -> Option<VarDecl> {
        let caps = RE_VAR.captures(line)?;
        Some(VarDecl {
            name: format!("${}", &caps["name"]),
            value: caps.name("val").map(|m| m.as_str().to_string()).filter(|v| !v.is_empty()),
            type_name: None,
        })
    }

    fn parse_class(&self, line: &str) -> Option<ClassDecl> {
        let caps = RE_CLASS.captures(line)?;
        Some(ClassDecl {
            name: caps["name"].to_string(),
        })
    }

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        RE_ARG_NAME.captures(arg).map(|c| c["name"].to_string())
    }

    /// The declared type (`?Foo $x`), else a guess from the default.
    fn get_arg_type(&self, arg: &str) -> Option<String> {
        let head = arg.split('=').next().unwrap_or(arg).trim();
        match head.split_once(char::is_whitespace) {
            Some((ty, _)) if !ty.starts_with('$') && !ty.starts_with('&') => Some(ty.to_string()),
            _ => self.get_arg_value(arg).and_then(|v| self.guess_type_from_value(&v)),
        }
    }

    fn guess_type_from_value(&self, value: &str) -> Option<String> {
        let value = value.trim();
        let primitives = &self.settings.primitives;
        if is_numeric(value) {
            return Some(if value.contains('.') {
                "float".to_string()
            } else {
                primitives.number.clone()
            });
        }
        if value.starts_with('"') || value.starts_with('\'') {
            return Some(primitives.string.clone());
        }
        if value.starts_with('[') || value.to_lowercase().starts_with("array(") {
            return Some(primitives.array.clone());
        }
        if matches!(value.to_lowercase().as_str(), "true" | "false" | "filenotfound") {
            return Some(primitives.boolean.clone());
        }
        value
            .strip_prefix("new ")
            .map(|rest| rest.trim_start().split(['(', ' ', ';']).next().unwrap_or_default().to_string())
            .filter(|class| !class.is_empty())
    }

    fn function_return_type(&self, name: &str, return_type: Option<&str>) -> ReturnType {
        let boolean = if self.style.short_primitives { "bool" } else { "boolean" };
        match (name, return_type) {
            ("__construct" | "__destruct" | "__set" | "__unset" | "__wakeup", _) => ReturnType::Omitted,
            ("__sleep", _) => ReturnType::Declared("array".to_string()),
            ("__toString", _) => ReturnType::Declared("string".to_string()),
            ("__isset", _) => ReturnType::Declared(boolean.to_string()),
            (_, Some("void")) => ReturnType::Omitted,
            (_, Some(declared)) => ReturnType::Declared(declared.to_string()),
            (_, None) => ReturnType::Infer,
        }
    }
}
