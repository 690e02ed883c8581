//! Engine configuration.
//!
//! Every key is optional; absent keys take the defaults below. The host
//! loads a `Config` once and passes it to [`crate::Docblockr::new`]; nothing
//! reads configuration through ambient state.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::notation::{self, NotationMap, Notations};
use crate::template::TemplateSource;

/// Column alignment of tag lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignTags {
    None,
    /// Pad the tag column so the first column after it lines up.
    Shallow,
    /// Pad every column.
    #[default]
    Deep,
}

/// Blank-line insertion between docblock sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacer {
    Never,
    /// One blank line between the description and the first tag.
    #[default]
    AfterDescription,
    /// Also one blank line whenever the tag kind changes.
    Always,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indentation_spaces: usize,
    pub align_tags: AlignTags,
    pub min_spaces_between_columns: usize,
    pub spacer_between_sections: Spacer,
    pub return_tag: String,
    pub lower_case_primitives: bool,
    pub short_primitives: bool,
    pub param_description: bool,
    pub return_description: bool,
    pub wrap_width: usize,
    /// Per-line prefix; the language's own when absent.
    pub comment_prefix: Option<String>,
    /// Closing line; the language's own when absent.
    pub comment_closer: Option<String>,
    pub notations: NotationMap,
    pub newline_after_block: bool,
    /// Leave the return tag line out of column alignment.
    pub per_section_indent: bool,
    /// Per tag kind template overrides.
    pub templates: IndexMap<String, TemplateSource>,
    /// Whole-block template; tags render in declaration order when absent.
    pub layout: Option<TemplateSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indentation_spaces: 1,
            align_tags: AlignTags::Deep,
            min_spaces_between_columns: 1,
            spacer_between_sections: Spacer::AfterDescription,
            return_tag: "@return".to_string(),
            lower_case_primitives: false,
            short_primitives: false,
            param_description: true,
            return_description: true,
            wrap_width: 80,
            comment_prefix: None,
            comment_closer: None,
            notations: notation::default_map(),
            newline_after_block: false,
            per_section_indent: false,
            templates: IndexMap::new(),
            layout: None,
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject malformed templates and notation patterns up front so that
    /// rendering never meets them.
    pub fn validate(&self) -> Result<()> {
        for (kind, source) in &self.templates {
            source.compile(kind)?;
        }
        if let Some(layout) = &self.layout {
            layout.compile("layout")?;
        }
        Notations::compile(&self.notations)?;
        Ok(())
    }

    pub fn type_style(&self) -> TypeStyle {
        TypeStyle {
            lower_case_primitives: self.lower_case_primitives,
            short_primitives: self.short_primitives,
        }
    }
}

/// The primitive-name options languages need when naming types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeStyle {
    pub lower_case_primitives: bool,
    pub short_primitives: bool,
}

// -- Legacy-tolerant enum parsing ---------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrMode {
    Flag(bool),
    Mode(String),
}

impl<'de> Deserialize<'de> for AlignTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match FlagOrMode::deserialize(deserializer)? {
            FlagOrMode::Flag(flag) => {
                warn!(flag, "boolean align_tags is deprecated, use \"none\", \"shallow\" or \"deep\"");
                Ok(if flag { AlignTags::Shallow } else { AlignTags::None })
            }
            FlagOrMode::Mode(mode) => match mode.as_str() {
                "none" => Ok(AlignTags::None),
                "shallow" => Ok(AlignTags::Shallow),
                "deep" => Ok(AlignTags::Deep),
                other => Err(de::Error::unknown_variant(other, &["none", "shallow", "deep"])),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Spacer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        const MODES: &[&str] = &["never", "after_description", "always"];
        let legacy = |flag: bool| {
            warn!(flag, "boolean spacer_between_sections is deprecated, use \"never\", \"after_description\" or \"always\"");
            if flag {
                Spacer::Always
            } else {
                Spacer::Never
            }
        };
        match FlagOrMode::deserialize(deserializer)? {
            FlagOrMode::Flag(flag) => Ok(legacy(flag)),
            FlagOrMode::Mode(mode) => match mode.as_str() {
                "never" => Ok(Spacer::Never),
                "after_description" => Ok(Spacer::AfterDescription),
                "always" => Ok(Spacer::Always),
                "true" => Ok(legacy(true)),
                "false" => Ok(legacy(false)),
                other => Err(de::Error::unknown_variant(other, MODES)),
            },
        }
    }
}

impl fmt::Display for AlignTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlignTags::None => "none",
            AlignTags::Shallow => "shallow",
            AlignTags::Deep => "deep",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config.indentation_spaces, 1);
        assert_eq!(config.align_tags, AlignTags::Deep);
        assert_eq!(config.spacer_between_sections, Spacer::AfterDescription);
        assert_eq!(config.return_tag, "@return");
        assert_eq!(config.wrap_width, 80);
        assert!(config.notations.contains_key("BOOLEAN"));
    }

    #[test]
    fn legacy_align_tags_boolean() {
        let config = Config::from_json_str(r#"{"align_tags": true}"#).unwrap();
        assert_eq!(config.align_tags, AlignTags::Shallow);
        let config = Config::from_json_str(r#"{"align_tags": false}"#).unwrap();
        assert_eq!(config.align_tags, AlignTags::None);
    }

    #[test]
    fn legacy_spacer_strings() {
        let config = Config::from_json_str(r#"{"spacer_between_sections": "true"}"#).unwrap();
        assert_eq!(config.spacer_between_sections, Spacer::Always);
        let config = Config::from_json_str(r#"{"spacer_between_sections": "false"}"#).unwrap();
        assert_eq!(config.spacer_between_sections, Spacer::Never);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Config::from_json_str(r#"{"align_tags": "diagonal"}"#).is_err());
    }

    #[test]
    fn malformed_template_is_rejected_at_load() {
        let err = Config::from_json_str(r#"{"templates": {"param": "@param {type"}}"#).unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        let err = Config::from_json_str(r#"{"templates": {"param": [["a"], ["type"]]}}"#).unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docblockr.json");
        std::fs::write(&path, r#"{"indentation_spaces": 2, "short_primitives": true}"#).unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.indentation_spaces, 2);
        assert!(config.type_style().short_primitives);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_path(Path::new("/nonexistent/docblockr.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
