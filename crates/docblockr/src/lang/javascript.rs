use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{enclosed, ClassDecl, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType, VarDecl};

const IDENT: &str = r"[a-zA-Z_$][a-zA-Z_$0-9]*";

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:\bfunction\b|=>|^\s*(?:(?:static|async|get|set)\s+)*\*?\s*{IDENT}\s*\()"
    ))
    .unwrap()
});

// function name(   /   export default async function* name(
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:export\s+(?:default\s+)?)?(?:async\s+)?function\s*\*?\s*(?P<name>{IDENT})?\s*\("
    ))
    .unwrap()
});

// name = function(   /   obj.name: async function* inner(
static RE_ASSIGNED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:export\s+)?(?:(?:var|let|const)\s+)?(?P<name>{IDENT}(?:\.{IDENT})*)\s*[:=]\s*(?:async\s+)?function\s*\*?\s*(?:{IDENT})?\s*\("
    ))
    .unwrap()
});

// name = (a, b) =>   /   name = a =>
static RE_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:export\s+)?(?:(?:var|let|const)\s+)?(?P<name>{IDENT}(?:\.{IDENT})*)\s*[:=]\s*(?:async\s+)?(?:(?P<paren>\()|(?P<single>{IDENT})\s*=>)"
    ))
    .unwrap()
});

// name(a, b) {   inside a class or object literal
static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?P<modifier>static|async|get|set)\s+)*\*?\s*(?P<name>{IDENT})\s*\("
    ))
    .unwrap()
});

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?:export\s+(?:default\s+)?)?class\s+(?P<name>{IDENT})")).unwrap()
});

static RE_DECLARED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:export\s+)?(?:var|let|const)\s+(?P<name>{IDENT})\s*(?:=\s*(?P<val>.*?))?\s*[;,]?\s*$"
    ))
    .unwrap()
});

static RE_ASSIGNED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<name>{IDENT}(?:\.{IDENT})*)\s*=\s*(?P<val>.*?)\s*[;,]?\s*$"
    ))
    .unwrap()
});

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "function", "typeof", "new",
];

pub struct JavaScript {
    settings: LanguageSettings,
}

impl JavaScript {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("type"),
                curly_types: true,
                type_info: true,
                primitives: Primitives::capitalized(style, ("Boolean", "Bool"), "Function"),
            },
        }
    }
}

impl Language for JavaScript {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        if let Some(caps) = RE_ASSIGNED.captures(line) {
            let open = caps.get(0)?.end() - 1;
            return Some(FunctionDecl::new(&caps["name"], Some(enclosed(line, open).0)));
        }
        if let Some(caps) = RE_ARROW.captures(line) {
            let args = match (caps.name("paren"), caps.name("single")) {
                (Some(paren), _) => {
                    let (args, end) = enclosed(line, paren.start());
                    if !line[end..].trim_start().starts_with("=>") {
                        return None;
                    }
                    args
                }
                (None, Some(single)) => single.as_str(),
                (None, None) => return None,
            };
            return Some(FunctionDecl::new(&caps["name"], Some(args)));
        }
        if let Some(caps) = RE_FUNCTION.captures(line) {
            let open = caps.get(0)?.end() - 1;
            let name = caps.name("name").map_or("", |m| m.as_str());
            return Some(FunctionDecl::new(name, Some(enclosed(line, open).0)));
        }
        let caps = RE_METHOD.captures(line)?;
        let name = &caps["name"];
        if KEYWORDS.contains(&name) {
            return None;
        }
        let open = caps.get(0)?.end() - 1;
        let (args, end) = enclosed(line, open);
        let rest = line[end..].trim();
        if !(rest.is_empty() || rest.starts_with('{')) {
            return None;
        }
        let mut decl = FunctionDecl::new(name, Some(args));
        decl.procedure = caps.name("modifier").is_some_and(|m| m.as_str() == "set");
        Some(decl)
    }

    fn parse_var(&self, line: &str) -> Option<VarDecl> {
        let caps = RE_DECLARED_VAR
            .captures(line)
            .or_else(|| RE_ASSIGNED_VAR.captures(line))?;
        Some(VarDecl {
            name: caps["name"].to_string(),
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
        let name = arg.split('=').next().unwrap_or(arg).trim();
        let name = name.strip_prefix("...").unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    }

    fn function_return_type(&self, name: &str, return_type: Option<&str>) -> ReturnType {
        match (name, return_type) {
            ("constructor", _) => ReturnType::Omitted,
            (_, Some(declared)) => ReturnType::Declared(declared.to_string()),
            (_, None) => ReturnType::Infer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js() -> JavaScript {
        JavaScript::new(TypeStyle::default())
    }

    #[test]
    fn function_declaration() {
        let decl = js().parse_function("function add(a, b = 1) { return a + b; }").unwrap();
        assert_eq!(decl.name, "add");
        assert_eq!(decl.args.as_deref(), Some("a, b = 1"));
        assert_eq!(decl.return_type, None);
    }

    #[test]
    fn default_with_call_does_not_cut_args() {
        let decl = js().parse_function("function f(a = g(1), b)").unwrap();
        assert_eq!(decl.args.as_deref(), Some("a = g(1), b"));
    }

    #[test]
    fn assigned_and_arrow_functions() {
        let decl = js().parse_function("foo.bar = function (x) {").unwrap();
        assert_eq!(decl.name, "foo.bar");
        assert_eq!(decl.args.as_deref(), Some("x"));

        let decl = js().parse_function("const sum = async (a, b) => a + b;").unwrap();
        assert_eq!(decl.name, "sum");
        assert_eq!(decl.args.as_deref(), Some("a, b"));

        let decl = js().parse_function("let twice = n => n * 2").unwrap();
        assert_eq!(decl.args.as_deref(), Some("n"));
    }

    #[test]
    fn parenthesized_value_is_not_an_arrow() {
        assert!(js().parse_function("const x = (a + b) * 2;").is_none());
    }

    #[test]
    fn methods_and_setters() {
        let decl = js().parse_function("  static async load(url, opts)").unwrap();
        assert_eq!(decl.name, "load");
        assert!(!decl.procedure);
        let decl = js().parse_function("set value(v)").unwrap();
        assert!(decl.procedure);
        assert!(js().parse_function("if (x) {").is_none());
        assert!(js().parse_function("foo(a).then(b)").is_none());
    }

    #[test]
    fn constructor_has_no_return() {
        assert_eq!(js().function_return_type("constructor", None), ReturnType::Omitted);
        assert_eq!(js().function_return_type("make", None), ReturnType::Infer);
    }

    #[test]
    fn variables_and_classes() {
        let var = js().parse_var("const answer = 42;").unwrap();
        assert_eq!(var.name, "answer");
        assert_eq!(var.value.as_deref(), Some("42"));
        let var = js().parse_var("this.items = [];").unwrap();
        assert_eq!(var.name, "this.items");
        assert_eq!(var.value.as_deref(), Some("[]"));
        assert_eq!(js().parse_var("let pending;").unwrap().value, None);
        assert_eq!(js().parse_class("export class Widget extends Base {").unwrap().name, "Widget");
    }

    #[test]
    fn rest_parameter_name() {
        let args = js().parse_args("first, ...rest");
        assert_eq!(args[1].name, "rest");
    }
}
