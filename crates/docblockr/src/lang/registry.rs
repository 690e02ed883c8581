use std::fmt;
use std::sync::OnceLock;

use crate::config::TypeStyle;

use super::{actionscript, c, java, javascript, objc, php, rust, sass, typescript, Language};

/// The supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageId {
    JavaScript,
    TypeScript,
    ActionScript,
    C,
    ObjectiveC,
    Java,
    Php,
    Rust,
    Sass,
}

impl LanguageId {
    pub const ALL: [LanguageId; 9] = [
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::ActionScript,
        LanguageId::C,
        LanguageId::ObjectiveC,
        LanguageId::Java,
        LanguageId::Php,
        LanguageId::Rust,
        LanguageId::Sass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::ActionScript => "actionscript",
            LanguageId::C => "c",
            LanguageId::ObjectiveC => "objc",
            LanguageId::Java => "java",
            LanguageId::Php => "php",
            LanguageId::Rust => "rust",
            LanguageId::Sass => "sass",
        }
    }

    /// Look up a language by name or common alias, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "jsx" | "node" => LanguageId::JavaScript,
            "typescript" | "ts" | "tsx" => LanguageId::TypeScript,
            "actionscript" | "as" | "haxe" => LanguageId::ActionScript,
            "c" | "cpp" | "c++" | "cxx" => LanguageId::C,
            "objc" | "objective-c" | "objectivec" | "objc++" => LanguageId::ObjectiveC,
            "java" | "groovy" => LanguageId::Java,
            "php" => LanguageId::Php,
            "rust" | "rs" => LanguageId::Rust,
            "sass" | "scss" => LanguageId::Sass,
            _ => return None,
        })
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => LanguageId::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => LanguageId::TypeScript,
            "as" | "hx" => LanguageId::ActionScript,
            "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" => LanguageId::C,
            "m" | "mm" => LanguageId::ObjectiveC,
            "java" | "groovy" => LanguageId::Java,
            "php" | "phtml" => LanguageId::Php,
            "rs" => LanguageId::Rust,
            "sass" | "scss" => LanguageId::Sass,
            _ => return None,
        })
    }

    /// Look up a language by editor grammar scope, e.g. `source.js`.
    pub fn from_scope(scope: &str) -> Option<Self> {
        let lang = scope.strip_prefix("source.").unwrap_or(scope);
        let lang = lang.strip_prefix("embedded.").unwrap_or(lang);
        match lang {
            "objc" | "objc++" => Some(LanguageId::ObjectiveC),
            "css.scss" | "css.sass" => Some(LanguageId::Sass),
            "js.jsx" => Some(LanguageId::JavaScript),
            other => Self::from_name(other),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memoizing language table. Each language is built on first request and
/// shared read-only afterwards.
pub struct Registry {
    style: TypeStyle,
    languages: [OnceLock<Box<dyn Language>>; 9],
}

impl Registry {
    pub fn new(style: TypeStyle) -> Self {
        Self {
            style,
            languages: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn get(&self, id: LanguageId) -> &dyn Language {
        self.languages[id.index()]
            .get_or_init(|| build(id, self.style))
            .as_ref()
    }
}

fn build(id: LanguageId, style: TypeStyle) -> Box<dyn Language> {
    match id {
        LanguageId::JavaScript => Box::new(javascript::JavaScript::new(style)),
        LanguageId::TypeScript => Box::new(typescript::TypeScript::new(style)),
        LanguageId::ActionScript => Box::new(actionscript::ActionScript::new(style)),
        LanguageId::C => Box::new(c::C::new(style)),
        LanguageId::ObjectiveC => Box::new(objc::ObjectiveC::new(style)),
        LanguageId::Java => Box::new(java::Java::new(style)),
        LanguageId::Php => Box::new(php::Php::new(style)),
        LanguageId::Rust => Box::new(rust::Rust::new(style)),
        LanguageId::Sass => Box::new(sass::Sass::new(style)),
    }
}
