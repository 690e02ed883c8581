//! JavaScript through tree-sitter.
//!
//! Node kinds the patterns care about are named by [`JsKind`]; every other
//! kind is invisible to the walk. Extracted types are raw node kinds
//! (`number`, `template_string`, ...) or constructor names, turned into
//! type names by the [`Dictionary`] the caller passes in.

use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

use super::{document, Pattern, SyntaxNode};
use crate::tag::{kind, Dictionary, Tag, TagFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsKind {
    ExportStatement,
    FunctionDeclaration,
    GeneratorFunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    MethodDefinition,
    ClassDeclaration,
    Identifier,
    PropertyIdentifier,
    FormalParameters,
    AssignmentPattern,
    RestPattern,
    ObjectPattern,
    ShorthandPropertyIdentifierPattern,
    ObjectAssignmentPattern,
    PairPattern,
    StatementBlock,
    IfStatement,
    ElseClause,
    TryStatement,
    ReturnStatement,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    Number,
    String,
    TemplateString,
    True,
    False,
    Array,
    Object,
    Regex,
    NewExpression,
}

const KINDS: &[(JsKind, &str)] = &[
    (JsKind::ExportStatement, "export_statement"),
    (JsKind::FunctionDeclaration, "function_declaration"),
    (JsKind::GeneratorFunctionDeclaration, "generator_function_declaration"),
    (JsKind::FunctionExpression, "function_expression"),
    (JsKind::ArrowFunction, "arrow_function"),
    (JsKind::MethodDefinition, "method_definition"),
    (JsKind::ClassDeclaration, "class_declaration"),
    (JsKind::Identifier, "identifier"),
    (JsKind::PropertyIdentifier, "property_identifier"),
    (JsKind::FormalParameters, "formal_parameters"),
    (JsKind::AssignmentPattern, "assignment_pattern"),
    (JsKind::RestPattern, "rest_pattern"),
    (JsKind::ObjectPattern, "object_pattern"),
    (JsKind::ShorthandPropertyIdentifierPattern, "shorthand_property_identifier_pattern"),
    (JsKind::ObjectAssignmentPattern, "object_assignment_pattern"),
    (JsKind::PairPattern, "pair_pattern"),
    (JsKind::StatementBlock, "statement_block"),
    (JsKind::IfStatement, "if_statement"),
    (JsKind::ElseClause, "else_clause"),
    (JsKind::TryStatement, "try_statement"),
    (JsKind::ReturnStatement, "return_statement"),
    (JsKind::LexicalDeclaration, "lexical_declaration"),
    (JsKind::VariableDeclaration, "variable_declaration"),
    (JsKind::VariableDeclarator, "variable_declarator"),
    (JsKind::Number, "number"),
    (JsKind::String, "string"),
    (JsKind::TemplateString, "template_string"),
    (JsKind::True, "true"),
    (JsKind::False, "false"),
    (JsKind::Array, "array"),
    (JsKind::Object, "object"),
    (JsKind::Regex, "regex"),
    (JsKind::NewExpression, "new_expression"),
];

impl JsKind {
    pub fn from_kind(kind: &str) -> Option<Self> {
        // older grammars call function expressions `function`
        if kind == "function" {
            return Some(JsKind::FunctionExpression);
        }
        KINDS.iter().find(|(_, name)| *name == kind).map(|(k, _)| *k)
    }

    pub fn as_str(self) -> &'static str {
        KINDS
            .iter()
            .find(|(k, _)| *k == self)
            .map_or("", |(_, name)| name)
    }

    fn is_declaration(self) -> bool {
        matches!(
            self,
            JsKind::ExportStatement
                | JsKind::FunctionDeclaration
                | JsKind::GeneratorFunctionDeclaration
                | JsKind::MethodDefinition
                | JsKind::ClassDeclaration
                | JsKind::LexicalDeclaration
                | JsKind::VariableDeclaration
        )
    }
}

#[derive(Clone, Copy)]
pub struct JsNode<'t> {
    node: Node<'t>,
    source: &'t str,
}

impl<'t> JsNode<'t> {
    pub fn text(&self) -> &'t str {
        &self.source[self.node.byte_range()]
    }

    fn field(&self, name: &str) -> Option<JsNode<'t>> {
        self.node.child_by_field_name(name).map(|node| JsNode {
            node,
            source: self.source,
        })
    }

    fn first_child(&self) -> Option<JsNode<'t>> {
        self.children().into_iter().next()
    }
}

impl<'t> SyntaxNode for JsNode<'t> {
    type Kind = JsKind;

    fn kind(&self) -> Option<JsKind> {
        JsKind::from_kind(self.node.kind())
    }

    fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|node| JsNode {
                node,
                source: self.source,
            })
            .collect()
    }
}

/// Node kinds to the type names the notation tables use.
pub fn dictionary() -> Dictionary {
    Dictionary::new()
        .type_name("number", "NUMBER")
        .type_name("string", "STRING")
        .type_name("template_string", "STRING")
        .type_name("true", "BOOLEAN")
        .type_name("false", "BOOLEAN")
        .type_name("array", "ARRAY")
        .type_name("object", "OBJECT")
        .type_name("regex", "RegExp")
        .type_name("arrow_function", "FUNCTION")
        .type_name("function_expression", "FUNCTION")
}

// -- Extractors ---------------------------------------------------------------

/// Literal node kind or constructor name of a value expression.
fn value_type(value: &JsNode<'_>) -> Option<String> {
    match value.kind()? {
        JsKind::NewExpression => value.field("constructor").map(|c| c.text().to_string()),
        k @ (JsKind::Number
        | JsKind::String
        | JsKind::TemplateString
        | JsKind::True
        | JsKind::False
        | JsKind::Array
        | JsKind::Object
        | JsKind::Regex
        | JsKind::ArrowFunction
        | JsKind::FunctionExpression) => Some(k.as_str().to_string()),
        _ => None,
    }
}

fn identifier(node: &JsNode<'_>) -> Vec<TagFields> {
    vec![TagFields::identifier(node.text())]
}

/// A lone arrow parameter: `n => n * 2`.
fn arrow_parameter(node: &JsNode<'_>) -> Vec<TagFields> {
    let is_parameter = node
        .node
        .parent()
        .and_then(|arrow| arrow.child_by_field_name("parameter"))
        .is_some_and(|param| param == node.node);
    if !is_parameter {
        return Vec::new();
    }
    vec![TagFields {
        tag: Some(kind::PARAM.to_string()),
        identifier: Some(node.text().to_string()),
        ..Default::default()
    }]
}

/// `name = default`, in parameter lists and object patterns.
fn assignment(node: &JsNode<'_>) -> Vec<TagFields> {
    let Some(left) = node.field("left") else {
        return Vec::new();
    };
    let right = node.field("right");
    vec![TagFields {
        identifier: Some(left.text().to_string()),
        value: right.map(|r| r.text().to_string()),
        type_name: right.as_ref().and_then(value_type),
        ..Default::default()
    }]
}

fn rest(node: &JsNode<'_>) -> Vec<TagFields> {
    node.first_child().map(|inner| identifier(&inner)).unwrap_or_default()
}

fn pair(node: &JsNode<'_>) -> Vec<TagFields> {
    node.field("key").map(|key| identifier(&key)).unwrap_or_default()
}

fn returned(node: &JsNode<'_>) -> Vec<TagFields> {
    match node.first_child() {
        Some(value) => vec![TagFields {
            type_name: value_type(&value),
            ..Default::default()
        }],
        None => Vec::new(),
    }
}

fn class_name(node: &JsNode<'_>) -> Vec<TagFields> {
    node.field("name")
        .map(|name| {
            vec![TagFields {
                tag: Some(kind::CLASS.to_string()),
                identifier: Some(name.text().to_string()),
                ..Default::default()
            }]
        })
        .unwrap_or_default()
}

/// A variable, or a function when the value is one.
fn declarator(node: &JsNode<'_>) -> Vec<TagFields> {
    let Some(name) = node.field("name") else {
        return Vec::new();
    };
    let value = node.field("value");
    let callable = match value.and_then(|v| v.kind()) {
        Some(JsKind::ArrowFunction) => Some(arrow()),
        Some(JsKind::FunctionExpression) => Some(body_only()),
        _ => None,
    };
    if let (Some(pattern), Some(value)) = (callable, value) {
        let mut fields = vec![TagFields {
            tag: Some(kind::NAME.to_string()),
            identifier: Some(name.text().to_string()),
            ..Default::default()
        }];
        fields.extend(document(&value.children(), &pattern).into_iter().map(TagFields::from));
        return fields;
    }
    vec![TagFields {
        identifier: Some(name.text().to_string()),
        value: value.map(|v| v.text().to_string()),
        type_name: value.as_ref().and_then(value_type),
        ..Default::default()
    }]
}

// -- Patterns -----------------------------------------------------------------

fn parameters<'t>() -> Pattern<JsNode<'t>> {
    Pattern::new()
        .tag(kind::PARAM)
        .leaf(JsKind::Identifier, identifier)
        .leaf(JsKind::AssignmentPattern, assignment)
        .leaf(JsKind::RestPattern, rest)
        .nest(
            JsKind::ObjectPattern,
            Pattern::new()
                .leaf(JsKind::ShorthandPropertyIdentifierPattern, identifier)
                .leaf(JsKind::ObjectAssignmentPattern, assignment)
                .leaf(JsKind::PairPattern, pair),
        )
}

/// Return statements, looking into nested blocks up to `depth` levels.
fn body<'t>(depth: usize) -> Pattern<JsNode<'t>> {
    let mut pattern = Pattern::new()
        .tag(kind::RETURNS)
        .leaf(JsKind::ReturnStatement, returned);
    if depth > 0 {
        for block in [JsKind::StatementBlock, JsKind::IfStatement, JsKind::ElseClause, JsKind::TryStatement] {
            pattern = pattern.nest(block, body(depth - 1));
        }
    }
    pattern
}

const BODY_DEPTH: usize = 3;

/// Parameters and body of an anonymous function expression.
fn body_only<'t>() -> Pattern<JsNode<'t>> {
    Pattern::new()
        .nest(JsKind::FormalParameters, parameters())
        .nest(JsKind::StatementBlock, body(BODY_DEPTH))
}

fn arrow<'t>() -> Pattern<JsNode<'t>> {
    body_only().leaf(JsKind::Identifier, arrow_parameter)
}

fn callable<'t>() -> Pattern<JsNode<'t>> {
    body_only()
        .tag(kind::NAME)
        .leaf(JsKind::Identifier, identifier)
        .leaf(JsKind::PropertyIdentifier, identifier)
}

fn declarations<'t>() -> Pattern<JsNode<'t>> {
    Pattern::new()
        .tag(kind::VAR)
        .leaf(JsKind::VariableDeclarator, declarator)
}

fn declaration<'t>(exported: bool) -> Pattern<JsNode<'t>> {
    let mut pattern = Pattern::new()
        .nest(JsKind::FunctionDeclaration, callable())
        .nest(JsKind::GeneratorFunctionDeclaration, callable())
        .nest(JsKind::MethodDefinition, callable())
        .leaf(JsKind::ClassDeclaration, class_name)
        .nest(JsKind::LexicalDeclaration, declarations())
        .nest(JsKind::VariableDeclaration, declarations());
    if !exported {
        pattern = pattern.nest(JsKind::ExportStatement, declaration(true));
    }
    pattern
}

// -- Entry point --------------------------------------------------------------

/// First declaration starting at or after `row`, in document order.
fn find_declaration(root: Node<'_>, row: usize) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.end_position().row < row {
            continue;
        }
        if node.start_position().row >= row && JsKind::from_kind(node.kind()).is_some_and(JsKind::is_declaration) {
            return Some(node);
        }
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Tags for the declaration at or after `row`, translated through
/// `dictionary`. Unparseable input or no declaration gives no tags.
pub fn document_at(source: &str, row: usize, dictionary: &Dictionary) -> Vec<Tag> {
    let mut parser = Parser::new();
    let language = tree_sitter_javascript::LANGUAGE.into();
    if let Err(err) = parser.set_language(&language) {
        warn!(%err, "javascript grammar rejected");
        return Vec::new();
    }
    let Some(tree) = parser.parse(source, None) else {
        return Vec::new();
    };
    let Some(node) = find_declaration(tree.root_node(), row) else {
        debug!(row, "no declaration in syntax tree");
        return Vec::new();
    };

    let tags = document(&[JsNode { node, source }], &declaration(false));
    single_return(tags.into_iter().map(|t| dictionary.translate(t)).collect())
}

/// Keep one return tag: the first typed one, else the first.
fn single_return(tags: Vec<Tag>) -> Vec<Tag> {
    let keep = tags
        .iter()
        .filter(|t| t.tag == kind::RETURNS)
        .position(|t| t.type_name.is_some())
        .unwrap_or(0);
    let mut seen = 0;
    tags.into_iter()
        .filter(|t| {
            if t.tag != kind::RETURNS {
                return true;
            }
            seen += 1;
            seen - 1 == keep
        })
        .collect()
}
