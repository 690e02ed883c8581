use std::sync::LazyLock;

use regex::Regex;

use crate::config::TypeStyle;

use super::{Argument, FunctionDecl, Language, LanguageSettings, Primitives, ReturnType};

static RE_OPENER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-+]").unwrap());

// - (ReturnType *)name   optionally followed by `:args`
static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*[-+]\s*\(\s*(?P<retval>[a-zA-Z_$][a-zA-Z0-9_$]*(?:\s*<[^>]*>)?\s*\**)\s*\)\s*(?P<name>[a-zA-Z_$][a-zA-Z0-9_$]*)\s*(?::(?P<args>.*))?",
    )
    .unwrap()
});

static RE_PART_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*:\s*").unwrap());
static RE_TRAILING_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+(\S*)$").unwrap());

/// Separates selector arguments inside [`FunctionDecl::args`].
const ARG_SEPARATOR: char = '\n';

pub struct ObjectiveC {
    settings: LanguageSettings,
}

impl ObjectiveC {
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

impl Language for ObjectiveC {
    fn settings(&self) -> &LanguageSettings {
        &self.settings
    }

    /// Selector methods: `- (id)initWithName:(NSString *)name age:(int)age`
    /// is named `initWithName:age:` and takes `name` and `age`.
    fn parse_function(&self, line: &str) -> Option<FunctionDecl> {
        let caps = RE_METHOD.captures(line)?;
        let mut name = caps["name"].to_string();
        let retval = caps["retval"].split_whitespace().collect::<Vec<_>>().join(" ");

        let mut args = Vec::new();
        if let Some(list) = caps.name("args").map(|m| m.as_str().trim()) {
            let parts: Vec<&str> = RE_PART_SPLIT.split(list).collect();
            for (i, part) in parts.iter().enumerate() {
                let mut part = *part;
                if i + 1 < parts.len() {
                    if let Some(word) = RE_TRAILING_WORD.captures(part) {
                        name.push(':');
                        name.push_str(&word[1]);
                        part = &part[..word.get(0).map_or(part.len(), |m| m.start())];
                    }
                }
                args.push(part.trim());
            }
            name.push(':');
        }

        let joined = args.join(&ARG_SEPARATOR.to_string());
        Some(FunctionDecl::new(name, Some(&joined)).returning(Some(&retval)))
    }

    fn parse_args(&self, args: &str) -> Vec<Argument> {
        args.split(ARG_SEPARATOR)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|raw| match (raw.find('('), raw.rfind(')')) {
                (Some(open), Some(close)) if open < close => Argument {
                    raw: raw.to_string(),
                    name: raw[close + 1..].trim().to_string(),
                    type_name: Some(raw[open + 1..close].split_whitespace().collect::<Vec<_>>().join(" ")),
                    value: None,
                },
                _ => Argument {
                    raw: raw.to_string(),
                    name: raw.to_string(),
                    ..Default::default()
                },
            })
            .collect()
    }

    fn function_return_type(&self, _name: &str, return_type: Option<&str>) -> ReturnType {
        match return_type {
            Some("void") | Some("IBAction") => ReturnType::Omitted,
            Some(declared) => ReturnType::Declared(declared.to_string()),
            None => ReturnType::Infer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objc() -> ObjectiveC {
        ObjectiveC::new(TypeStyle::default())
    }

    #[test]
    fn selector_name_and_args() {
        let decl = objc()
            .parse_function("- (id)initWithName:(NSString *)name age:(int)age")
            .unwrap();
        assert_eq!(decl.name, "initWithName:age:");
        assert_eq!(decl.return_type.as_deref(), Some("id"));
        let args = objc().parse_args(decl.args.as_deref().unwrap());
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].name, "name");
        assert_eq!(args[0].type_name.as_deref(), Some("NSString *"));
        assert_eq!(args[1].name, "age");
        assert_eq!(args[1].type_name.as_deref(), Some("int"));
    }

    #[test]
    fn method_without_args() {
        let decl = objc().parse_function("+ (NSArray<NSString *> *)allNames").unwrap();
        assert_eq!(decl.name, "allNames");
        assert_eq!(decl.args, None);
        assert_eq!(decl.return_type.as_deref(), Some("NSArray<NSString *> *"));
    }

    #[test]
    fn void_and_ibaction_have_no_return() {
        for line in ["- (void)reset", "- (IBAction)tapped:(id)sender"] {
            let decl = objc().parse_function(line).unwrap();
            assert_eq!(
                objc().function_return_type(&decl.name, decl.return_type.as_deref()),
                ReturnType::Omitted
            );
        }
    }
}
