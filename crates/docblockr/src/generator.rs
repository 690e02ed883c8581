//! The generation pipeline.
//!
//! Definition scan, declaration match, tags, rendering, layout. Every step
//! is synchronous and bounded; a line that matches nothing produces the
//! empty skeleton rather than an error.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lang::{ClassDecl, FunctionDecl, Language, LanguageId, LineSource, Registry, ReturnType, VarDecl};
use crate::layout::{self, Frame, WrapOptions};
use crate::notation::{Notations, NONE};
use crate::render::Renderer;
use crate::tag::{kind, Tag};
use crate::template::Template;
use crate::tree;

type Templates = HashMap<String, Template>;

/// A configured generator. Built once; every call is read-only.
pub struct Docblockr {
    config: Config,
    registry: Registry,
    notations: Notations,
    templates: HashMap<LanguageId, Templates>,
    layout: Option<Template>,
}

impl Docblockr {
    /// Compile templates and notations for every language. Configuration
    /// problems surface here and nowhere later.
    pub fn new(config: Config) -> Result<Self> {
        let registry = Registry::new(config.type_style());
        let notations = Notations::compile(&config.notations)?;

        let mut overrides = Templates::new();
        for (tag, source) in &config.templates {
            overrides.insert(tag.clone(), source.compile(tag)?);
        }

        let mut templates = HashMap::new();
        for id in LanguageId::ALL {
            let mut compiled = Templates::new();
            for (tag, source) in registry.get(id).templates(&config) {
                let template = Template::parse(&source)
                    .map_err(|reason| Error::template(format!("{}.{}", id, tag), reason))?;
                compiled.insert(tag.to_string(), template);
            }
            compiled.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
            templates.insert(id, compiled);
        }

        let layout = config.layout.as_ref().map(|l| l.compile("layout")).transpose()?;

        Ok(Self {
            config,
            registry,
            notations,
            templates,
            layout,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Docblock for the declaration at `row`. `trailing` is text the user
    /// typed after the comment opener; it becomes the description default.
    pub fn generate(&self, id: LanguageId, source: &dyn LineSource, row: usize, trailing: &str) -> String {
        let lang = self.registry.get(id);
        let frame = self.frame(lang);
        if source.line(row).is_some_and(|line| lang.is_existing_comment(line)) {
            return format!("\n{}{}", frame.prefix, " ".repeat(frame.indentation_spaces));
        }
        let definition = lang.get_definition(source, row);
        let tags = self.tags(id, &definition, trailing);
        self.block(id, &tags, &frame, trailing)
    }

    /// One-line block for a variable: ` @type {Number} description */`.
    pub fn generate_inline(&self, id: LanguageId, source: &dyn LineSource, row: usize) -> String {
        let lang = self.registry.get(id);
        let definition = lang.get_definition(source, row);
        let tags = match lang.parse_var(&definition) {
            Some(var) => self.var_tags(lang, var, ""),
            None => Vec::new(),
        };
        let subject = tags
            .iter()
            .find(|t| t.tag == kind::TYPE)
            .or_else(|| tags.iter().find(|t| t.tag == kind::VAR));
        let lines = match (subject, self.templates[&id].get(kind::INLINE)) {
            (Some(tag), Some(template)) => {
                let rendered = Renderer::new(&self.templates[&id], &tags).render(template, tag);
                layout::fix_tab_stops(&[rendered], 1)
            }
            _ => Vec::new(),
        };
        layout::create_inline(&lines)
    }

    /// Docblock for the first JavaScript declaration at or after `row`,
    /// found through the syntax tree instead of the line matchers.
    pub fn generate_from_tree(&self, source: &str, row: usize, trailing: &str) -> String {
        let id = LanguageId::JavaScript;
        let lang = self.registry.get(id);
        let primitives = &lang.settings().primitives;
        let tags: Vec<Tag> = tree::javascript::document_at(source, row, &tree::javascript::dictionary())
            .into_iter()
            .flat_map(|mut tag| {
                let type_name = tag.type_name.take().and_then(|t| primitives.translate(&t));
                if tag.tag == kind::VAR {
                    // the initializer feeds the type guess, never the description
                    let var = VarDecl {
                        name: tag.identifier.unwrap_or_default(),
                        value: tag.value,
                        type_name,
                    };
                    return self.var_tags(lang, var, trailing);
                }
                tag.type_name = match type_name {
                    None if tag.tag == kind::PARAM => tag.identifier.as_deref().and_then(|name| self.guess(lang, name)),
                    other => other,
                };
                if matches!(tag.tag.as_str(), kind::NAME | kind::CLASS) && !trailing.is_empty() {
                    tag.value = Some(trailing.to_string());
                }
                vec![tag]
            })
            .collect();
        self.block(id, &tags, &self.frame(lang), trailing)
    }

    /// Reflow an existing comment body to the configured width.
    pub fn wrap(&self, body: &str) -> String {
        layout::rewrap(
            body,
            &WrapOptions {
                width: self.config.wrap_width,
                indentation_spaces: self.config.indentation_spaces,
                spacer: self.config.spacer_between_sections,
            },
        )
    }

    // -- Tags -----------------------------------------------------------------

    /// Tags for a gathered definition: function, else class, else variable.
    pub fn tags(&self, id: LanguageId, definition: &str, trailing: &str) -> Vec<Tag> {
        let lang = self.registry.get(id);
        if let Some(decl) = lang.parse_function(definition) {
            return self.function_tags(lang, decl, trailing);
        }
        if let Some(ClassDecl { name }) = lang.parse_class(definition) {
            return vec![Tag::new(kind::CLASS).identifier(name).value(description(trailing))];
        }
        if let Some(var) = lang.parse_var(definition) {
            return self.var_tags(lang, var, trailing);
        }
        debug!(language = %id, definition, "no declaration matched");
        Vec::new()
    }

    fn function_tags(&self, lang: &dyn Language, decl: FunctionDecl, trailing: &str) -> Vec<Tag> {
        let mut tags = vec![Tag::new(kind::NAME)
            .identifier(decl.name.as_str())
            .value(description(trailing))];

        let args = decl.args.as_deref().map(|a| lang.parse_args(a)).unwrap_or_default();
        for arg in args {
            let type_name = arg.type_name.or_else(|| self.guess(lang, &arg.name));
            tags.push(
                Tag::new(kind::PARAM)
                    .identifier(arg.name)
                    .value(arg.value)
                    .type_name(type_name),
            );
        }

        if !decl.procedure {
            match lang.function_return_type(&decl.name, decl.return_type.as_deref()) {
                ReturnType::Declared(type_name) => tags.push(Tag::new(kind::RETURNS).type_name(Some(type_name))),
                ReturnType::Omitted => {}
                ReturnType::Infer => tags.extend(self.infer_return(lang, &decl.name)),
            }
        }

        for exception in decl.throws {
            tags.push(Tag::new(kind::THROWS).identifier(exception));
        }
        lang.arrange(tags, &self.config)
    }

    /// Constructors (capitalized) and names the notations mark as `NONE`
    /// return nothing; otherwise the name may imply the type.
    fn infer_return(&self, lang: &dyn Language, name: &str) -> Option<Tag> {
        let short = name.rsplit('.').next().unwrap_or(name);
        if short.chars().next().is_some_and(char::is_uppercase) {
            return None;
        }
        match self.notations.guess(short) {
            Some(NONE) => None,
            Some(guess) => Some(Tag::new(kind::RETURNS).type_name(lang.settings().primitives.translate(guess))),
            None => Some(Tag::new(kind::RETURNS)),
        }
    }

    fn var_tags(&self, lang: &dyn Language, var: VarDecl, trailing: &str) -> Vec<Tag> {
        let mut tags = vec![Tag::new(kind::VAR)
            .identifier(var.name.as_str())
            .value(description(trailing))];
        if lang.settings().type_tag.is_some() {
            let type_name = var
                .type_name
                .clone()
                .or_else(|| var.value.as_deref().and_then(|v| lang.guess_type_from_value(v)))
                .or_else(|| var.value.as_deref().and_then(|v| self.guess(lang, v)))
                .or_else(|| self.guess(lang, &var.name));
            tags.push(Tag::new(kind::TYPE).identifier(var.name).type_name(type_name));
        }
        tags
    }

    /// Notation guess in the language's type names.
    fn guess(&self, lang: &dyn Language, text: &str) -> Option<String> {
        self.notations
            .guess(text)
            .and_then(|t| lang.settings().primitives.translate(t))
    }

    // -- Rendering ------------------------------------------------------------

    fn frame(&self, lang: &dyn Language) -> Frame {
        let settings = lang.settings();
        Frame {
            prefix: self
                .config
                .comment_prefix
                .clone()
                .unwrap_or_else(|| settings.prefix.to_string()),
            closer: self
                .config
                .comment_closer
                .clone()
                .or_else(|| settings.closer.map(str::to_string))
                .filter(|c| !c.is_empty()),
            indentation_spaces: self.config.indentation_spaces,
            newline_after_block: self.config.newline_after_block,
        }
    }

    /// Rendered and laid-out lines of a block, before framing.
    fn lines(&self, id: LanguageId, tags: &[Tag]) -> Vec<String> {
        if tags.is_empty() {
            return Vec::new();
        }
        let templates = &self.templates[&id];
        let mut renderer = Renderer::new(templates, tags);
        let text = match &self.layout {
            Some(layout) => renderer.render(layout, &tags[0]),
            None => tags
                .iter()
                .filter_map(|tag| templates.get(&tag.tag).map(|t| renderer.render(t, tag)))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();

        let exempt = self.config.per_section_indent.then_some(self.config.return_tag.as_str());
        let lines = layout::align_tags(
            &lines,
            self.config.align_tags,
            self.config.min_spaces_between_columns,
            exempt,
        );
        let lines = layout::fix_tab_stops(&lines, 1);
        layout::add_spacers(lines, self.config.spacer_between_sections)
    }

    fn block(&self, id: LanguageId, tags: &[Tag], frame: &Frame, trailing: &str) -> String {
        layout::create_snippet(&self.lines(id, tags), frame, trailing)
    }
}

fn description(trailing: &str) -> Option<String> {
    let trailing = trailing.trim();
    (!trailing.is_empty()).then(|| trailing.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlignTags, Spacer};
    use crate::lang::TextBuffer;
    use crate::template::TemplateSource;

    fn generator() -> Docblockr {
        Docblockr::new(Config::default()).unwrap()
    }

    fn generate(id: LanguageId, source: &str) -> String {
        generator().generate(id, &TextBuffer::new(source), 0, "")
    }

    #[test]
    fn javascript_function_block() {
        let snippet = generate(LanguageId::JavaScript, "function fetchAll(url, isStrict = false) {");
        assert_eq!(
            snippet,
            "\n * ${1:[description]}\n *\n * @param  {${2:[type]}}  url      ${3:[description]}\n * @param  {${4:Boolean}} isStrict ${5:[description]}\n * @return {${6:[type]}}           ${7:[description]}\n */$0"
        );
    }

    #[test]
    fn notation_none_suppresses_return() {
        let snippet = generate(LanguageId::JavaScript, "function add(a, b = 1) { return a + b; }");
        assert!(!snippet.contains("@return"));
        assert!(snippet.contains("{${4:Number}} b"));
    }

    #[test]
    fn boolean_name_infers_return_type() {
        let snippet = generate(LanguageId::JavaScript, "function isReady() {");
        assert!(snippet.contains("@return {${2:Boolean}}"));
    }

    #[test]
    fn constructor_has_no_return() {
        let snippet = generate(LanguageId::JavaScript, "function Widget(options) {");
        assert!(!snippet.contains("@return"));
    }

    #[test]
    fn unmatched_line_gives_skeleton() {
        let snippet = generator().generate(LanguageId::JavaScript, &TextBuffer::new("x + 1"), 0, "note");
        assert_eq!(snippet, "\n * ${0:note}\n */");
    }

    #[test]
    fn existing_comment_continues() {
        let snippet = generate(LanguageId::JavaScript, " * already here");
        assert_eq!(snippet, "\n * ");
    }

    #[test]
    fn trailing_text_is_description_default() {
        let snippet = generator().generate(LanguageId::JavaScript, &TextBuffer::new("var total = 0;"), 0, "Running sum");
        assert!(snippet.starts_with("\n * ${1:Running sum}"));
        assert!(snippet.contains("@type {${2:Number}}"));
    }

    #[test]
    fn inline_variable() {
        let buf = TextBuffer::new("const names = [];");
        assert_eq!(
            generator().generate_inline(LanguageId::JavaScript, &buf, 0),
            " @type {${1:Array}} ${2:[description]}$0 */"
        );
        let none = TextBuffer::new("if (x) {");
        assert_eq!(generator().generate_inline(LanguageId::JavaScript, &none, 0), " $0 */");
    }

    #[test]
    fn rust_markdown_sections() {
        let snippet = generate(LanguageId::Rust, "pub fn area(&self, scale: f64) -> f64 {");
        assert_eq!(
            snippet,
            "\n/// ${1:[short description]}\n///\n/// ${2:[long description]}\n///\n/// # Parameters\n///\n/// * `scale` - ${3:[description]}\n///\n/// # Returns\n///\n/// ${4:[returns description]}$0"
        );
    }

    #[test]
    fn java_throws_become_tags() {
        let config = Config {
            align_tags: AlignTags::None,
            spacer_between_sections: Spacer::Never,
            ..Config::default()
        };
        let snippet = Docblockr::new(config)
            .unwrap()
            .generate(LanguageId::Java, &TextBuffer::new("public void load(String path) throws IOException {"), 0, "");
        assert_eq!(
            snippet,
            "\n * ${1:[description]}\n * @param path ${2:[description]}\n * @throws IOException ${3:[description]}\n */$0"
        );
    }

    #[test]
    fn template_override_and_prefix() {
        let mut config = Config::default();
        config
            .templates
            .insert(kind::NAME.to_string(), TemplateSource::Brace("{identifier}: {$ [what]}".to_string()));
        config.comment_prefix = Some(" **".to_string());
        let snippet = Docblockr::new(config)
            .unwrap()
            .generate(LanguageId::C, &TextBuffer::new("void reset(void);"), 0, "");
        assert_eq!(snippet, "\n ** reset: ${1:[what]}\n */$0");
    }

    #[test]
    fn layout_template_drives_the_block() {
        let config = Config {
            layout: Some(TemplateSource::Brace(
                "{$ [description]}\n{@ param @param {type} {$ {identifier}}\n}@returns {$ [type]}".to_string(),
            )),
            align_tags: AlignTags::None,
            spacer_between_sections: Spacer::Never,
            ..Config::default()
        };
        let snippet = Docblockr::new(config)
            .unwrap()
            .generate(LanguageId::JavaScript, &TextBuffer::new("function add(a, b = 1) {"), 0, "");
        assert_eq!(
            snippet,
            "\n * ${1:[description]}\n * @param  ${2:a}\n * @param Number ${3:b}\n * @returns ${4:[type]}\n */$0"
        );
    }

    #[test]
    fn tree_matcher_block() {
        let config = Config {
            align_tags: AlignTags::None,
            spacer_between_sections: Spacer::Never,
            ..Config::default()
        };
        let snippet = Docblockr::new(config)
            .unwrap()
            .generate_from_tree("function twice(n = 2) { return 'x'; }", 0, "");
        assert_eq!(
            snippet,
            "\n * ${1:[description]}\n * @param {${2:Number}} n ${3:[description]}\n * @return {${4:String}} ${5:[description]}\n */$0"
        );
    }

    #[test]
    fn row_past_the_buffer_gives_skeleton() {
        let g = generator();
        for id in [LanguageId::JavaScript, LanguageId::Java, LanguageId::Rust] {
            let buf = TextBuffer::new("var x = 1;");
            let snippet = g.generate(id, &buf, usize::MAX - 1, "");
            assert_eq!(snippet, g.generate(id, &buf, 40, ""), "{id}");
        }
        let buf = TextBuffer::new("var x = 1;");
        assert_eq!(g.generate(LanguageId::JavaScript, &buf, usize::MAX - 1, ""), "\n * ${0:}\n */");
    }

    #[test]
    fn tree_variable_gets_type_tag() {
        let g = generator();
        let source = "let when = new Date();";
        let expected = "\n * ${1:[description]}\n *\n * @type {${2:Date}}\n */$0";
        assert_eq!(g.generate_from_tree(source, 0, ""), expected);
        assert_eq!(g.generate(LanguageId::JavaScript, &TextBuffer::new(source), 0, ""), expected);
        assert!(g.generate_from_tree(source, 0, "Start time").starts_with("\n * ${1:Start time}\n"));
    }

    #[test]
    fn wrap_uses_configured_width() {
        let config = Config {
            wrap_width: 20,
            ..Config::default()
        };
        let wrapped = Docblockr::new(config).unwrap().wrap(" * one two three four five six");
        assert!(wrapped.lines().all(|l| l.len() <= 20));
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut config = Config::default();
        config
            .templates
            .insert(kind::PARAM.to_string(), TemplateSource::Brace("{identifier".to_string()));
        assert!(matches!(Docblockr::new(config), Err(Error::Template { .. })));
    }
}
