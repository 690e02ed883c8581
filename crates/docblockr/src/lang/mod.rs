//! Per-language declaration matchers.
//!
//! Every language implements [`Language`]: it recognizes function, variable
//! and class declarations in a line of source, splits argument lists and
//! guesses types. Matchers are heuristic. A line they do not understand
//! yields `None`, never an error.

mod actionscript;
mod c;
mod java;
mod javascript;
mod objc;
mod php;
mod registry;
mod rust;
mod sass;
mod typescript;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::{Config, TypeStyle};
use crate::notation;
use crate::tag::{kind, Tag};

pub use registry::{LanguageId, Registry};

/// Name and type given to a bare `...` parameter in every language.
pub const VARARGS: &str = "VARARGS";

/// Lines a definition scan reads before giving up on a terminator.
pub const MAX_DEFINITION_LINES: usize = 25;

static RE_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$").unwrap());
static RE_REGEXP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:RegExp\b|/[^/*])").unwrap());
static RE_NEW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^new\s+([a-zA-Z_$][a-zA-Z_$0-9]*(?:\.[a-zA-Z_$][a-zA-Z_$0-9]*)*)").unwrap());
static RE_BLOCK_COMMENT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\*(?:[^/]|$)").unwrap());
static RE_TERMINATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[;{]\s*$").unwrap());

// -- Declarations -------------------------------------------------------------

/// A recognized function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    /// Raw parameter list, as written between the parentheses.
    pub args: Option<String>,
    pub return_type: Option<String>,
    pub throws: Vec<String>,
    /// Declared in a form that never returns a value (setters, mixins).
    pub procedure: bool,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, args: Option<&str>) -> Self {
        Self {
            name: name.into(),
            args: args.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
            ..Default::default()
        }
    }

    pub fn returning(mut self, return_type: Option<&str>) -> Self {
        self.return_type = return_type.map(str::trim).filter(|r| !r.is_empty()).map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub value: Option<String>,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
}

/// One parameter of a parsed argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argument {
    pub raw: String,
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<String>,
}

/// What to document as a function's return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Declared(String),
    /// No return tag at all.
    Omitted,
    /// Nothing declared; guess from the function name.
    Infer,
}

// -- Settings -----------------------------------------------------------------

/// Type names a language uses for the primitive notation types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitives {
    pub array: String,
    pub object: String,
    pub string: String,
    pub number: String,
    pub boolean: String,
    pub function: String,
}

impl Primitives {
    /// Capitalized names in the JavaScript tradition, adjusted to `style`.
    /// `boolean` is the long and short spelling of the boolean type.
    pub fn capitalized(style: TypeStyle, boolean: (&str, &str), function: &str) -> Self {
        let styled = |name: &str| {
            if style.lower_case_primitives {
                name.to_lowercase()
            } else {
                name.to_string()
            }
        };
        let bool_name = if style.short_primitives { boolean.1 } else { boolean.0 };
        Self {
            array: styled("Array"),
            object: styled("Object"),
            string: styled("String"),
            number: styled("Number"),
            boolean: styled(bool_name),
            function: styled(function),
        }
    }

    /// Map a notation type name to this language's spelling. `NONE` maps
    /// to no type.
    pub fn translate(&self, notation_type: &str) -> Option<String> {
        let name = match notation_type {
            notation::NONE => return None,
            "ARRAY" => &self.array,
            "OBJECT" => &self.object,
            "STRING" => &self.string,
            "NUMBER" => &self.number,
            "BOOLEAN" => &self.boolean,
            "FUNCTION" => &self.function,
            other => other,
        };
        Some(name.to_string())
    }
}

/// Static description of a language, read-only once built.
#[derive(Debug, Clone)]
pub struct LanguageSettings {
    /// Lines matching this start a declaration that may span lines.
    pub fn_opener: Option<&'static Regex>,
    pub prefix: &'static str,
    pub closer: Option<&'static str>,
    /// Tag used to document variable types, e.g. `type` or `var`.
    pub type_tag: Option<&'static str>,
    /// Types are written `{Type}`.
    pub curly_types: bool,
    /// Parameter and return lines carry a type column.
    pub type_info: bool,
    pub primitives: Primitives,
}

// -- Source access ------------------------------------------------------------

/// Read access to the lines of the buffer being documented.
pub trait LineSource {
    fn line(&self, row: usize) -> Option<&str>;
}

/// An in-memory buffer.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

impl LineSource for TextBuffer {
    fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }
}

// -- The Language trait -------------------------------------------------------

pub trait Language: Send + Sync {
    fn settings(&self) -> &LanguageSettings;

    fn parse_function(&self, line: &str) -> Option<FunctionDecl>;

    fn parse_var(&self, _line: &str) -> Option<VarDecl> {
        None
    }

    fn parse_class(&self, _line: &str) -> Option<ClassDecl> {
        None
    }

    /// Bare parameter name: no modifiers, defaults or annotations.
    fn get_arg_name(&self, arg: &str) -> Option<String> {
        let name = arg.split('=').next().unwrap_or(arg);
        let name = name.split(':').next().unwrap_or(name).trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Type of a parameter: its annotation, or a guess from its default.
    fn get_arg_type(&self, arg: &str) -> Option<String> {
        self.get_arg_value(arg).and_then(|v| self.guess_type_from_value(&v))
    }

    /// Default value of a parameter.
    fn get_arg_value(&self, arg: &str) -> Option<String> {
        arg.split_once('=')
            .map(|(_, value)| value.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn guess_type_from_value(&self, value: &str) -> Option<String> {
        guess_common(&self.settings().primitives, value)
    }

    fn function_return_type(&self, _name: &str, return_type: Option<&str>) -> ReturnType {
        match return_type {
            Some("void") => ReturnType::Omitted,
            Some(declared) => ReturnType::Declared(declared.to_string()),
            None => ReturnType::Infer,
        }
    }

    fn parse_args(&self, args: &str) -> Vec<Argument> {
        split_args(args).iter().map(|raw| argument(self, raw)).collect()
    }

    /// Gather the declaration starting at `row`, possibly across lines.
    fn get_definition(&self, source: &dyn LineSource, row: usize) -> String {
        scan_definition(self.settings(), source, row, |_| false)
    }

    /// Whether `line` continues a comment that is already open.
    fn is_existing_comment(&self, line: &str) -> bool {
        RE_BLOCK_COMMENT_LINE.is_match(line)
    }

    /// Templates per tag kind, in brace form.
    fn templates(&self, config: &Config) -> Vec<(&'static str, String)> {
        default_templates(self.settings(), config)
    }

    /// Final say over a function's tags before rendering.
    fn arrange(&self, tags: Vec<Tag>, _config: &Config) -> Vec<Tag> {
        tags
    }
}

// -- Shared helpers -----------------------------------------------------------

/// Build an [`Argument`] through the language's name/type/value hooks.
/// A bare `...` becomes the variadic sentinel.
pub fn argument<L: Language + ?Sized>(lang: &L, raw: &str) -> Argument {
    let raw = raw.trim();
    if raw == "..." {
        return Argument {
            raw: raw.to_string(),
            name: VARARGS.to_string(),
            type_name: Some(VARARGS.to_string()),
            value: None,
        };
    }
    Argument {
        raw: raw.to_string(),
        name: lang.get_arg_name(raw).unwrap_or_else(|| raw.to_string()),
        type_name: lang.get_arg_type(raw),
        value: lang.get_arg_value(raw),
    }
}

/// Split a parameter list on top-level commas.
///
/// Commas nested in `()`, `[]`, `{}`, `<>` or quotes do not split. Empty
/// fragments are dropped.
pub fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    let mut prev = '\0';
    for c in args.chars() {
        match quote {
            Some(q) => {
                if c == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' | '[' | '{' | '<' => depth += 1,
                // `=>` is an arrow, not a closing bracket
                '>' if prev == '=' => {}
                ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    out.push(std::mem::take(&mut current));
                    prev = c;
                    continue;
                }
                _ => {}
            },
        }
        current.push(c);
        prev = c;
    }
    out.push(current);
    out.into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Text inside the bracket pair opening at byte `open`, and the byte just
/// past its closer. An unclosed list runs to the end of the line.
pub fn enclosed(text: &str, open: usize) -> (&str, usize) {
    let Some(opener) = text[open..].chars().next() else {
        return ("", text.len());
    };
    let closer = match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        _ => return ("", open),
    };
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        if c == opener {
            depth += 1;
        } else if c == closer {
            depth -= 1;
            if depth == 0 {
                return (&text[open + 1..open + i], open + i + 1);
            }
        }
    }
    (&text[open + 1..], text.len())
}

pub fn is_numeric(value: &str) -> bool {
    RE_NUMERIC.is_match(value)
}

/// Value heuristics shared by the JavaScript family.
pub fn guess_common(primitives: &Primitives, value: &str) -> Option<String> {
    let value = value.trim();
    let first = value.chars().next()?;
    if is_numeric(value) {
        return Some(primitives.number.clone());
    }
    if matches!(first, '\'' | '"' | '`') {
        return Some(primitives.string.clone());
    }
    if first == '[' {
        return Some(primitives.array.clone());
    }
    if first == '{' {
        return Some(primitives.object.clone());
    }
    if value == "true" || value == "false" {
        return Some(primitives.boolean.clone());
    }
    if RE_REGEXP.is_match(value) {
        return Some("RegExp".to_string());
    }
    RE_NEW
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Remove `//` and `/* */` comments, tracking block comments across lines.
pub(crate) fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_block {
            match rest.find("*/") {
                Some(end) => {
                    *in_block = false;
                    rest = &rest[end + 2..];
                }
                None => return out,
            }
        }
        let line_comment = rest.find("//");
        let block_comment = rest.find("/*");
        match (line_comment, block_comment) {
            (Some(l), Some(b)) if l < b => {
                out.push_str(&rest[..l]);
                return out;
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                *in_block = true;
                rest = &rest[b + 2..];
            }
            (Some(l), None) => {
                out.push_str(&rest[..l]);
                return out;
            }
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Read forward from `row` until the declaration is complete.
///
/// Lines for which `skip` holds (attributes, annotations) are passed over
/// before the declaration starts. A first line that does not open a
/// multi-line declaration is returned alone. Otherwise lines are joined
/// until one contains `;` or `{`, whose trailing terminator is removed.
/// At most [`MAX_DEFINITION_LINES`] lines are read; when the budget runs
/// out whatever was gathered is returned.
pub(crate) fn scan_definition(
    settings: &LanguageSettings,
    source: &dyn LineSource,
    row: usize,
    skip: impl Fn(&str) -> bool,
) -> String {
    let mut definition = String::new();
    let mut in_block = false;
    for row in row..row.saturating_add(MAX_DEFINITION_LINES) {
        let Some(raw) = source.line(row) else {
            return definition;
        };
        let line = strip_comments(raw, &mut in_block);
        if definition.is_empty() {
            if line.trim().is_empty() || skip(&line) {
                continue;
            }
            if !settings.fn_opener.is_some_and(|re| re.is_match(&line)) {
                return line;
            }
        } else {
            definition.push(' ');
        }
        definition.push_str(line.trim_end());
        if line.contains(';') || line.contains('{') {
            return RE_TERMINATOR.replace(&definition, "").into_owned();
        }
    }
    debug!(row, lines = MAX_DEFINITION_LINES, "definition scan hit its line budget");
    definition
}

// -- Templates ----------------------------------------------------------------

/// Escape text for use as a literal inside a brace template.
pub(crate) fn literal(text: &str) -> String {
    text.replace('{', "\\{").replace('}', "\\}")
}

/// The type column: always a tab stop, around the known type or a
/// `[type]` placeholder.
fn type_column(curly: bool) -> &'static str {
    if curly {
        r"\{{$ {= type [type]}}\}"
    } else {
        "{$ {= type [type]}}"
    }
}

/// Column-structured templates shared by most languages. Columns are tab
/// separated for the aligner.
pub fn default_templates(settings: &LanguageSettings, config: &Config) -> Vec<(&'static str, String)> {
    let typed = settings.type_info.then(|| type_column(settings.curly_types));
    let description = "{$ [description]}";
    let summary = "{$ {|| value [description]}}".to_string();

    let mut param = String::from("@param");
    if let Some(col) = typed {
        param.push('\t');
        param.push_str(col);
    }
    param.push_str("\t{identifier}");
    if config.param_description {
        param.push('\t');
        param.push_str(description);
    }

    let mut returns = literal(&config.return_tag);
    if let Some(col) = typed {
        returns.push('\t');
        returns.push_str(col);
    }
    if config.return_description {
        // empty identifier column keeps descriptions in line with params
        returns.push_str("\t\t");
        returns.push_str(description);
    }

    let mut templates = vec![
        (kind::NAME, summary.clone()),
        (kind::VAR, summary.clone()),
        (kind::CLASS, summary),
        (kind::PARAM, param),
        (kind::RETURNS, returns),
        (kind::THROWS, format!("@throws\t{{identifier}}\t{}", description)),
    ];
    match settings.type_tag {
        Some(tag) => {
            let col = type_column(settings.curly_types);
            templates.push((kind::TYPE, format!("@{}\t{}", literal(tag), col)));
            templates.push((kind::INLINE, format!("@{} {} {}", literal(tag), col, description)));
        }
        None => templates.push((kind::INLINE, description.to_string())),
    }
    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        settings: LanguageSettings,
    }

    impl Language for Plain {
        fn settings(&self) -> &LanguageSettings {
            &self.settings
        }

        fn parse_function(&self, _line: &str) -> Option<FunctionDecl> {
            None
        }
    }

    static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"function\b").unwrap());

    fn plain() -> Plain {
        Plain {
            settings: LanguageSettings {
                fn_opener: Some(&RE_OPENER),
                prefix: " *",
                closer: Some(" */"),
                type_tag: Some("type"),
                curly_types: true,
                type_info: true,
                primitives: Primitives::capitalized(TypeStyle::default(), ("Boolean", "Bool"), "Function"),
            },
        }
    }

    #[test]
    fn split_respects_nesting() {
        assert_eq!(
            split_args("a, m: Map<string, number>, [x, y] = [1, 2], f = (p, q) => p"),
            ["a", "m: Map<string, number>", "[x, y] = [1, 2]", "f = (p, q) => p"]
        );
        assert_eq!(split_args("s = 'a, b', t"), ["s = 'a, b'", "t"]);
        assert!(split_args("  ").is_empty());
    }

    #[test]
    fn n_plain_args_give_n_arguments() {
        let lang = plain();
        assert_eq!(lang.parse_args("a, b, c, d").len(), 4);
    }

    #[test]
    fn variadic_sentinel() {
        let lang = plain();
        let args = lang.parse_args("a, ...");
        assert_eq!(args[1].name, VARARGS);
        assert_eq!(args[1].type_name.as_deref(), Some(VARARGS));
    }

    #[test]
    fn default_value_gives_type() {
        let lang = plain();
        let args = lang.parse_args("a, b = 1");
        assert_eq!(args[0].name, "a");
        assert_eq!(args[0].type_name, None);
        assert_eq!(args[1].name, "b");
        assert_eq!(args[1].value.as_deref(), Some("1"));
        assert_eq!(args[1].type_name.as_deref(), Some("Number"));
    }

    #[test]
    fn common_value_guesses() {
        let p = Primitives::capitalized(TypeStyle::default(), ("Boolean", "Bool"), "Function");
        assert_eq!(guess_common(&p, "42").as_deref(), Some("Number"));
        assert_eq!(guess_common(&p, "'x'").as_deref(), Some("String"));
        assert_eq!(guess_common(&p, "[1,2]").as_deref(), Some("Array"));
        assert_eq!(guess_common(&p, "{}").as_deref(), Some("Object"));
        assert_eq!(guess_common(&p, "true").as_deref(), Some("Boolean"));
        assert_eq!(guess_common(&p, "/ab+c/").as_deref(), Some("RegExp"));
        assert_eq!(guess_common(&p, "new Date()").as_deref(), Some("Date"));
        assert_eq!(guess_common(&p, "foo()"), None);
        assert_eq!(guess_common(&p, ""), None);
    }

    #[test]
    fn primitive_style() {
        let style = TypeStyle {
            lower_case_primitives: true,
            short_primitives: true,
        };
        let p = Primitives::capitalized(style, ("Boolean", "Bool"), "Function");
        assert_eq!(p.boolean, "bool");
        assert_eq!(p.translate("NUMBER").as_deref(), Some("number"));
        assert_eq!(p.translate(notation::NONE), None);
        assert_eq!(p.translate("Custom").as_deref(), Some("Custom"));
    }

    #[test]
    fn enclosed_finds_matching_paren() {
        let line = "f(a, g(b), c) rest";
        let (inner, end) = enclosed(line, 1);
        assert_eq!(inner, "a, g(b), c");
        assert_eq!(&line[end..], " rest");
        assert_eq!(enclosed("f(a, b", 1).0, "a, b");
    }

    #[test]
    fn comments_are_stripped_across_lines() {
        let mut in_block = false;
        assert_eq!(strip_comments("a /* b", &mut in_block), "a ");
        assert!(in_block);
        assert_eq!(strip_comments("c */ d // e", &mut in_block), " d ");
        assert!(!in_block);
    }

    #[test]
    fn definition_joins_until_terminator() {
        let buf = TextBuffer::new("function f(a, // first\n  b) {\n}");
        assert_eq!(plain().get_definition(&buf, 0), "function f(a,   b)");
    }

    #[test]
    fn single_line_definition_is_returned_as_is() {
        let buf = TextBuffer::new("\nvar x = 1;");
        assert_eq!(plain().get_definition(&buf, 0), "var x = 1;");
    }

    #[test]
    fn unterminated_definition_stops_at_budget() {
        let text = format!("function f(\n{}", "  a,\n".repeat(100));
        let buf = TextBuffer::new(&text);
        let definition = plain().get_definition(&buf, 0);
        assert_eq!(definition.matches("a,").count(), MAX_DEFINITION_LINES - 1);
    }

    #[test]
    fn rows_past_the_buffer_give_nothing() {
        let buf = TextBuffer::new("function f(a) {");
        assert_eq!(plain().get_definition(&buf, 5), "");
        assert_eq!(plain().get_definition(&buf, usize::MAX - 1), "");
        assert_eq!(plain().get_definition(&buf, usize::MAX), "");
    }

    #[test]
    fn templates_follow_settings() {
        let templates = default_templates(plain().settings(), &Config::default());
        let param = &templates.iter().find(|(k, _)| *k == kind::PARAM).unwrap().1;
        assert_eq!(param, "@param\t\\{{$ {= type [type]}}\\}\t{identifier}\t{$ [description]}");
    }
}
