use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{enclosed, guess_common, ClassDecl, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType, VarDecl};

const IDENT: &str = r"[a-zA-Z_$][a-zA-Z_$0-9]*";
const MODIFIERS: &str = r"(?:(?:export|default|declare|public|private|protected|static|readonly|abstract|async|override)\s+)*";

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:\bfunction\b|^\s*{MODIFIERS}{IDENT}\s*(?:<[^(]*>)?\s*\??\s*\()")).unwrap()
});

// modifiers, optional `function`, name, optional generics, open paren
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{MODIFIERS}(?:function\s*\*?\s*)?(?P<name>{IDENT})\s*(?:<[^(]*>)?\s*\??\s*\("
    ))
    .unwrap()
});

static RE_RETURN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:\s*(?P<ret>[^{;=]+?)\s*(?:[{;].*|=>.*)?$").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{MODIFIERS}(?:class|interface|enum|type)\s+(?P<name>{IDENT})"
    ))
    .unwrap()
});

static RE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{MODIFIERS}(?:(?:var|let|const)\s+)?(?P<name>{IDENT})\s*\??\s*(?::\s*(?P<type>[^=;]+?))?\s*(?:=\s*(?P<val>.*?))?\s*[;,]?\s*$"
    ))
    .unwrap()
});

static RE_ACCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:public|private|protected|readonly)\s+").unwrap());

const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "function", "new", "typeof"];

pub struct TypeScript {
    settings: LanguageSettings,
}

impl TypeScript {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("type"),
                curly_types: true,
                type_info: false,
                primitives: Primitives::capitalized(style, ("Boolean", "Bool"), "Function"),
            },
        }
    }
}

/// Split `name: Type = value` at its top-level colon.
fn annotation(arg: &str) -> (&str, Option<&str>) {
    let head = top_level(arg, b'=').map_or(arg, |eq| &arg[..eq]);
    match top_level(head, b':') {
        Some(colon) => (&head[..colon], Some(head[colon + 1..].trim()).filter(|t| !t.is_empty())),
        None => (head, None),
    }
}

/// Byte offset of the first `target` outside brackets, quotes and `=>`.
fn top_level(text: &str, target: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'=' if bytes.get(i + 1) == Some(&b'>') => i += 1,
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            _ if b == target && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

impl Language for TypeScript {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let name = &caps["name"];
        if KEYWORDS.contains(&name) {
            return None;
        }
        let open = caps.get(0)?.end() - 1;
        let (args, end) = enclosed(line, open);
        let rest = &line[end..];
        let return_type = RE_RETURN
            .captures(rest)
            .and_then(|c| c.name("ret"))
            .map(|m| m.as_str());
        Some(FunctionDecl::new(name, Some(args)).returning(return_type))
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

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        let (name, _) = annotation(arg);
        let name = RE_ACCESS.replace_all(name, "");
        let name: String = name.chars().filter(|c| !c.is_whitespace() && *c != '?').collect();
        let name = name.strip_prefix("...").map(str::to_string).unwrap_or(name);
        (!name.is_empty()).then_some(name)
    }

    fn get_arg_value(&self, arg: &str) -> Option<String> {
        let eq = top_level(arg, b'=')?;
        Some(arg[eq + 1..].trim().to_string()).filter(|v| !v.is_empty())
    }

    fn get_arg_type(&self, arg: &str) -> Option<String> {
        match annotation(arg) {
            (_, Some(ty)) => Some(ty.to_string()),
            (_, None) => self.get_arg_value(arg).and_then(|v| self.guess_type_from_value(&v)),
        }
    }

    fn guess_type_from_value(&self, value: &str) -> Option<String> {
        guess_common(&self.settings.primitives, value)
    }

    fn function_return_type(&self, name: &str, return_type: Option<&str>) -> ReturnType {
        match (name, return_type) {
            ("constructor", _) | (_, Some("void")) => ReturnType::Omitted,
            (_, Some(declared)) => ReturnType::Declared(declared.to_string()),
            (_, None) => ReturnType::Infer,
        }
    }
}
