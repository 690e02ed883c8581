use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{
    enclosed, scan_definition, ClassDecl, FunctionDecl, Language, LanguageSettings, LineSource, Primitives,
    ReturnType, MAX_DEFINITION_LINES,
};

const IDENT: &str = r"[a-zA-Z_$][a-zA-Z_$0-9]*";
const MODIFIERS: &str =
    r"(?:(?:public|protected|private|static|abstract|final|transient|synchronized|native|strictfp|default)\s+)*";

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{MODIFIERS}(?:<[^>]*>\s*)?(?:[a-zA-Z_$][<>., a-zA-Z_$0-9\[\]]*\s+)?{IDENT}\s*\(")).unwrap()
});

// modifiers, optional generics, optional return type, name, open paren
static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{MODIFIERS}(?:<[^>]*>\s*)?(?:(?P<retval>[a-zA-Z_$][<>., a-zA-Z_$0-9\[\]]*?)\s+)?(?P<name>{IDENT})\s*\("
    ))
    .unwrap()
});

static RE_THROWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*throws\s+(?P<list>[a-zA-Z_$0-9.,\s]+)").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{MODIFIERS}(?:class|interface|enum|record|@interface)\s+(?P<name>{IDENT})")).unwrap()
});

static RE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*@[a-zA-Z_]").unwrap());

const KEYWORDS: &[&str] = &["if", "for", "while", "switch", "catch", "synchronized", "return", "new", "else"];

pub struct Java {
    settings: LanguageSettings,
}

impl Java {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("type"),
                curly_types: false,
                type_info: false,
                primitives: Primitives::capitalized(style, ("Boolean", "Bool"), "Function"),
            },
        }
    }
}

/// Row of the first line after any annotations starting at `row`.
/// Annotations with an argument list may span lines.
fn skip_annotations(source: &dyn LineSource, row: usize) -> usize {
    let end = row.saturating_add(MAX_DEFINITION_LINES);
    let mut depth = 0i32;
    for current in row..end {
        let Some(line) = source.line(current) else {
            return current;
        };
        if depth == 0 && !RE_ANNOTATION.is_match(line) && !line.trim().is_empty() {
            return current;
        }
        for c in line.chars() {
            match c {
                '(' | '{' => depth += 1,
                ')' | '}' => depth -= 1,
                _ => {}
            }
        }
        depth = depth.max(0);
    }
    end
}

impl Language for Java {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_FUNCTION.captures(line)?;
        let name = &caps["name"];
        let retval = caps.name("retval").map(|m| m.as_str());
        if KEYWORDS.contains(&name) || retval.is_some_and(|r| KEYWORDS.contains(&r)) {
            return None;
        }
        let open = caps.get(0)?.end() - 1;
        let (args, end) = enclosed(line, open);
        let mut decl = FunctionDecl::new(name, Some(args)).returning(retval);
        if let Some(list) = RE_THROWS.captures(&line[end..]) {
            decl.throws = list["list"]
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        Some(decl)
    }

    fn parse_class(&self, line: &str) -> Option<ClassDecl> {
        let caps = RE_CLASS.captures(line)?;
        Some(ClassDecl {
            name: caps["name"].to_string(),
        })
    }

    fn get_arg_name(&self, arg: &str) -> Option<String> {
        arg.split_whitespace().last().map(str::to_string)
    }

    fn get_arg_type(&self, arg: &str) -> Option<String> {
        let mut words: Vec<&str> = arg
            .split_whitespace()
            .filter(|w| *w != "final" && !w.starts_with('@'))
            .collect();
        words.pop()?;
        (!words.is_empty()).then(|| words.join(" "))
    }

    fn get_arg_value(&self, _arg: &str) -> Option<String> {
        None
    }

    /// Constructors have no return type.
    fn function_return_type(&self, _name: &str, return_type: Option<&str>) -> ReturnType {
        match return_type {
            Some("void") | None => ReturnType::Omitted,
            Some(declared) => ReturnType::Declared(declared.to_string()),
        }
    }

    fn get_definition(&self, source: &dyn LineSource, row: usize) -> String {
        let start = skip_annotations(source, row);
        scan_definition(self.settings(), source, start, |_| false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::TextBuffer;

    fn java() -> Java {
        Java::new(TypeStyle::default())
    }

    #[test]
    fn method_with_generic_return_and_throws() {
        let decl = java()
            .parse_function("public static Map<String, Integer> count(final List<String> words, int limit) throws IOException, ParseException")
            .unwrap();
        assert_eq!(decl.name, "count");
        assert_eq!(decl.return_type.as_deref(), Some("Map<String, Integer>"));
        assert_eq!(decl.throws, ["IOException", "ParseException"]);
        let args = java().parse_args(decl.args.as_deref().unwrap());
        assert_eq!(args[0].name, "words");
        assert_eq!(args[0].type_name.as_deref(), Some("List<String>"));
        assert_eq!(args[1].name, "limit");
        assert_eq!(args[1].type_name.as_deref(), Some("int"));
    }

    #[test]
    fn constructor_and_void() {
        let decl = java().parse_function("public Widget(String name)").unwrap();
        assert_eq!(decl.name, "Widget");
        assert_eq!(java().function_return_type(&decl.name, decl.return_type.as_deref()), ReturnType::Omitted);
        let decl = java().parse_function("protected void reset()").unwrap();
        assert_eq!(java().function_return_type(&decl.name, decl.return_type.as_deref()), ReturnType::Omitted);
    }

    #[test]
    fn control_flow_is_not_a_method() {
        assert!(java().parse_function("if (x) {").is_none());
        assert!(java().parse_function("return compute(x);").is_none());
        assert!(java().parse_function("synchronized (lock) {").is_none());
    }

    #[test]
    fn definition_skips_annotations() {
        let buf = TextBuffer::new(
            "@Override\n@SuppressWarnings({\n    \"unchecked\"\n})\npublic int size(\n    int a) {\n}",
        );
        assert_eq!(java().get_definition(&buf, 0), "public int size(     int a)");
    }

    #[test]
    fn definition_past_the_buffer_is_empty() {
        let buf = TextBuffer::new("@Override\npublic int size()");
        assert_eq!(java().get_definition(&buf, 9), "");
        assert_eq!(java().get_definition(&buf, usize::MAX - 1), "");
    }

    #[test]
    fn annotations_alone_stop_at_the_end() {
        let buf = TextBuffer::new("@Override\n@Deprecated");
        assert_eq!(skip_annotations(&buf, 0), 2);
    }
}
