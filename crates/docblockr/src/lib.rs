//! docblockr: documentation comment generation.
//!
//! Recognizes the declaration below a cursor (function, class or
//! variable) with per-language matchers or a syntax-tree pattern walk,
//! turns it into tags, renders the tags through configurable templates
//! and lays the result out as an editor snippet with numbered tab stops.
//!
//! ```no_run
//! use docblockr::{Config, Docblockr, LanguageId, TextBuffer};
//!
//! let generator = Docblockr::new(Config::default())?;
//! let buffer = TextBuffer::new("function add(a, b = 1) {");
//! let snippet = generator.generate(LanguageId::JavaScript, &buffer, 0, "");
//! # Ok::<(), docblockr::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod lang;
pub mod layout;
pub mod notation;
pub mod render;
pub mod tag;
pub mod template;
pub mod tree;

pub use config::{AlignTags, Config, Spacer};
pub use error::{Error, Result};
pub use generator::Docblockr;
pub use lang::{LanguageId, LineSource, TextBuffer};
pub use tag::Tag;
pub use template::{Template, TemplateSource};
