use docblockr::config::AlignTags;
use docblockr::lang::{Language, LanguageId, TextBuffer, MAX_DEFINITION_LINES, VARARGS};
use docblockr::layout;
use docblockr::render;
use docblockr::tag::kind;
use docblockr::{Config, Docblockr, Template};

fn generator() -> Docblockr {
    Docblockr::new(Config::default()).unwrap()
}

fn lang(generator: &Docblockr, id: LanguageId) -> &dyn Language {
    generator.registry().get(id)
}

// -- Matchers -----------------------------------------------------------------

#[test]
fn every_language_splits_top_level_arguments() {
    let cases = [
        (LanguageId::JavaScript, "function add(a, b = 1) { return a + b; }", 2),
        (
            LanguageId::TypeScript,
            "public static lookup(keys: Map<string, number>, strict?: boolean): Promise<Array<Item>> {",
            2,
        ),
        (LanguageId::ActionScript, "public function resize(w:int, h:int = 10):void {", 2),
        (LanguageId::C, "static int copy(char *dst, const char *src, size_t n)", 3),
        (LanguageId::ObjectiveC, "- (id)initWithName:(NSString *)name age:(int)age", 2),
        (
            LanguageId::Java,
            "public static Map<String, Integer> count(final List<String> words, int limit)",
            2,
        ),
        (
            LanguageId::Php,
            "public static function &find(?int $id, array $opts = [], $strict = true): ?Model",
            3,
        ),
        (LanguageId::Rust, "pub fn scale(&self, by: HashMap<String, f64>, clamp: bool) -> Self {", 2),
        (LanguageId::Sass, "@mixin button-variant($color, $padding: 4px 8px, $args...) {", 3),
    ];
    let g = generator();
    for (id, line, expected) in cases {
        let lang = lang(&g, id);
        let decl = lang
            .parse_function(line)
            .unwrap_or_else(|| panic!("{id}: no match for {line}"));
        let args = lang.parse_args(decl.args.as_deref().unwrap_or_default());
        assert_eq!(args.len(), expected, "{id}: {line}");
    }
}

#[test]
fn variadic_sentinel_is_shared() {
    let g = generator();
    let ids = [
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::ActionScript,
        LanguageId::C,
        LanguageId::Java,
        LanguageId::Php,
    ];
    for id in ids {
        let args = lang(&g, id).parse_args("a, ...");
        let last = args.last().unwrap();
        assert_eq!(last.name, VARARGS, "{id}");
        assert_eq!(last.type_name.as_deref(), Some(VARARGS), "{id}");
    }
}

#[test]
fn value_guesses() {
    let g = generator();
    let js = lang(&g, LanguageId::JavaScript);
    assert_eq!(js.guess_type_from_value("42").as_deref(), Some("Number"));
    assert_eq!(js.guess_type_from_value("'x'").as_deref(), Some("String"));
    assert_eq!(js.guess_type_from_value("[1,2]").as_deref(), Some("Array"));
    assert_eq!(js.guess_type_from_value("true").as_deref(), Some("Boolean"));
    assert_eq!(js.guess_type_from_value("foo()"), None);
}

#[test]
fn unterminated_definition_stops_at_budget() {
    let mut text = String::from("function f(a,\n");
    for _ in 0..40 {
        text.push_str("  b,\n");
    }
    let g = generator();
    let definition = lang(&g, LanguageId::JavaScript).get_definition(&TextBuffer::new(&text), 0);
    assert!(definition.starts_with("function f(a,"));
    assert_eq!(definition.matches("b,").count(), MAX_DEFINITION_LINES - 1);
}

// -- Rendering and layout -----------------------------------------------------

#[test]
fn add_function_end_to_end() {
    let g = generator();
    let line = "function add(a, b = 1) { return a + b; }";
    let decl = lang(&g, LanguageId::JavaScript).parse_function(line).unwrap();
    assert_eq!(decl.name, "add");
    assert_eq!(decl.args.as_deref(), Some("a, b = 1"));

    let tags = g.tags(LanguageId::JavaScript, line, "");
    let params: Vec<_> = tags.iter().filter(|t| t.tag == kind::PARAM).collect();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].identifier.as_deref(), Some("a"));
    assert_eq!(params[0].type_name, None);
    assert_eq!(params[1].value.as_deref(), Some("1"));
    assert_eq!(params[1].type_name.as_deref(), Some("Number"));

    let template = Template::parse("{$ [description]}\n@param {$ {type}} {identifier}\n@returns {$ {type}}").unwrap();
    assert_eq!(
        render::render(&template, params[0]),
        "${1:[description]}\n@param ${2:} a\n@returns ${3:}"
    );
    assert_eq!(
        render::render(&template, params[1]),
        "${1:[description]}\n@param ${2:Number} b\n@returns ${3:Number}"
    );
}

#[test]
fn rendering_is_repeatable() {
    let g = generator();
    let tags = g.tags(LanguageId::JavaScript, "function add(a, b = 1) {", "");
    let template = Template::parse("@param\t{$ {= type [type]}}\t{identifier}{& value  = {value}}").unwrap();
    let first = render::render(&template, &tags[2]);
    assert_eq!(first, render::render(&template, &tags[2]));
    assert_eq!(first, "@param\t${1:Number}\tb = 1");
}

#[test]
fn renumbering_follows_reading_order() {
    let lines = vec!["${5:x} ${2:y}".to_string(), "$7 and $0".to_string()];
    assert_eq!(layout::fix_tab_stops(&lines, 1), ["${1:x} ${2:y}", "$3 and $0"]);
}

#[test]
fn deep_alignment_pads_middle_column() {
    let lines = vec!["@param\tfoo\tstr".to_string(), "@param\tlongname\tint".to_string()];
    assert_eq!(
        layout::align_tags(&lines, AlignTags::Deep, 1, None),
        ["@param foo      str", "@param longname int"]
    );
}

// -- Whole blocks -------------------------------------------------------------

#[test]
fn stops_are_gapless_across_the_block() {
    let buf = TextBuffer::new("function copy(dst, src, count = 0, cb) {");
    let snippet = generator().generate(LanguageId::JavaScript, &buf, 0, "");
    let mut expected = 1;
    let mut rest = snippet.as_str();
    while let Some(at) = rest.find("${") {
        let digits: String = rest[at + 2..].chars().take_while(char::is_ascii_digit).collect();
        assert_eq!(digits.parse::<usize>().unwrap(), expected);
        expected += 1;
        rest = &rest[at + 2..];
    }
    assert!(expected > 8);
    assert!(snippet.ends_with("*/$0"));
}

#[test]
fn callback_name_is_typed_as_function() {
    let buf = TextBuffer::new("function copy(dst, cb) {");
    let snippet = generator().generate(LanguageId::JavaScript, &buf, 0, "");
    assert!(snippet.contains("{${4:Function}} cb"));
}

#[test]
fn multi_line_declarations_are_gathered() {
    let buf = TextBuffer::new("public int sum(\n    int a, // first\n    int b\n) {\n}");
    let snippet = generator().generate(LanguageId::Java, &buf, 0, "");
    assert!(snippet.contains("@param  a"));
    assert!(snippet.contains("@param  b"));
    assert!(snippet.contains("@return"));
}

#[test]
fn tree_and_text_matchers_agree_on_names() {
    let source = "function scale(factor, origin = 0) {\n  return factor;\n}";
    let g = generator();
    let from_text = g.generate(LanguageId::JavaScript, &TextBuffer::new(source), 0, "");
    let from_tree = g.generate_from_tree(source, 0, "");
    for name in ["factor", "origin"] {
        assert!(from_text.contains(name));
        assert!(from_tree.contains(name));
    }
}

#[test]
fn config_from_json_drives_generation() {
    let config = Config::from_json_str(
        r#"{
            "align_tags": "none",
            "spacer_between_sections": "never",
            "lower_case_primitives": true,
            "indentation_spaces": 2
        }"#,
    )
    .unwrap();
    let snippet = Docblockr::new(config)
        .unwrap()
        .generate(LanguageId::JavaScript, &TextBuffer::new("function f(n = 2) {"), 0, "");
    assert!(snippet.starts_with("\n *  ${1:[description]}\n *  @param {${2:number}} n"));
}
