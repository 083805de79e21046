//! Declared types of names in one file
//!
//! The parser does not model declarations, but it scans opaque regions for
//! `Type name` pairs and `Type name(` method headers so that placeholders
//! restricted by type can ask what an expression evaluates to.

use crate::ast::{BinaryOp, LiteralKind, Node, NodeKind, Span};

use super::lexer::{Token, TokenKind};

/// Reserved words of the host language
pub const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null", "var", "yield",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "var",
];

/// `String` methods that return a string when called on one
const STRING_METHODS: &[&str] = &[
    "trim", "strip", "substring", "concat", "formatted", "repeat", "replace", "toUpperCase",
    "toLowerCase",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Parameter or local variable, visible from its declaration on
    Local,
    /// Field, visible in the whole class body
    Field,
    /// Method declared in the file; the type is its return type
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub type_name: String,
    pub kind: DeclarationKind,
    /// Region of the file in which the name refers to this declaration
    pub scope: Span,
}

/// Static type category of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Primitive,
    Object,
    Unknown,
}

impl ValueType {
    fn of_declared(type_name: &str) -> Self {
        match type_name {
            "var" => ValueType::Unknown,
            primitive if PRIMITIVE_TYPES.contains(&primitive) => ValueType::Primitive,
            _ => ValueType::Object,
        }
    }
}

/// Declarations found in one file
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    declarations: Vec<Declaration>,
}

impl TypeEnv {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Declared type of the variable `name` at `offset`, from the innermost
    /// visible declaration
    pub fn type_of(&self, name: &str, offset: usize) -> Option<&str> {
        self.innermost(name, offset, |kind| kind != DeclarationKind::Method)
    }

    /// Type of the field `name` of the class enclosing `offset`
    pub fn field_type(&self, name: &str, offset: usize) -> Option<&str> {
        self.innermost(name, offset, |kind| kind == DeclarationKind::Field)
    }

    /// Return type of the method `name` of the class enclosing `offset`
    pub fn return_type(&self, name: &str, offset: usize) -> Option<&str> {
        self.innermost(name, offset, |kind| kind == DeclarationKind::Method)
    }

    fn innermost(
        &self,
        name: &str,
        offset: usize,
        wanted: impl Fn(DeclarationKind) -> bool,
    ) -> Option<&str> {
        self.declarations
            .iter()
            .filter(|d| wanted(d.kind) && d.name == name && d.scope.contains(offset))
            .min_by_key(|d| (d.scope.len(), usize::MAX - d.scope.start))
            .map(|d| d.type_name.as_str())
    }

    pub fn is_string(&self, name: &str, offset: usize) -> bool {
        is_string_type(self.type_of(name, offset))
    }

    /// Whether `node` has static type `String` as far as the declarations
    /// in this file tell
    pub fn is_string_expression(&self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Literal { kind, .. } => {
                matches!(kind, LiteralKind::String | LiteralKind::TextBlock)
            }
            NodeKind::Binary {
                op: BinaryOp::Add,
                left,
                right,
            } => self.is_string_expression(left) || self.is_string_expression(right),
            NodeKind::Paren { inner } => self.is_string_expression(inner),
            NodeKind::Reference { name } => self.is_string(name, node.span.start),
            NodeKind::FieldAccess { target, name } if is_this(target) => {
                is_string_type(self.field_type(name, node.span.start))
            }
            NodeKind::Call {
                receiver: None,
                name,
                ..
            } => is_string_type(self.return_type(name, node.span.start)),
            NodeKind::Call {
                receiver: Some(receiver),
                name,
                args,
            } => match name.as_str() {
                "toString" | "name" => args.is_empty(),
                "valueOf" | "format" | "join" => matches!(
                    receiver.dotted_name().as_deref(),
                    Some("String") | Some("java.lang.String")
                ),
                _ if is_this(receiver) => is_string_type(self.return_type(name, node.span.start)),
                method if STRING_METHODS.contains(&method) => self.is_string_expression(receiver),
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether `node` evaluates to a primitive or to a reference, when the
    /// file says so
    pub fn value_type(&self, node: &Node) -> ValueType {
        let offset = node.span.start;
        match &node.kind {
            NodeKind::Literal { kind, .. } => match kind {
                LiteralKind::Null => ValueType::Unknown,
                LiteralKind::String | LiteralKind::TextBlock => ValueType::Object,
                _ => ValueType::Primitive,
            },
            NodeKind::Paren { inner } => self.value_type(inner),
            NodeKind::Unary { .. } => ValueType::Primitive,
            NodeKind::Binary { .. } if self.is_string_expression(node) => ValueType::Object,
            NodeKind::Binary { .. } => ValueType::Primitive,
            NodeKind::New { .. } => ValueType::Object,
            NodeKind::Reference { name } if name == "this" || name == "super" => ValueType::Object,
            NodeKind::Reference { name } => declared(self.type_of(name, offset)),
            NodeKind::FieldAccess { target, name } if is_this(target) => {
                declared(self.field_type(name, offset))
            }
            NodeKind::Call { receiver, name, .. }
                if receiver.as_deref().map_or(true, is_this) =>
            {
                declared(self.return_type(name, offset))
            }
            _ if self.is_string_expression(node) => ValueType::Object,
            _ => ValueType::Unknown,
        }
    }
}

fn declared(type_name: Option<&str>) -> ValueType {
    type_name.map_or(ValueType::Unknown, ValueType::of_declared)
}

fn is_string_type(type_name: Option<&str>) -> bool {
    matches!(type_name, Some("String") | Some("java.lang.String"))
}

fn is_this(node: &Node) -> bool {
    matches!(&node.kind, NodeKind::Reference { name } if name == "this")
}

/// A declaration seen in an opaque token run, before its scope is known
#[derive(Debug, Clone)]
pub(crate) struct FoundDeclaration {
    pub name: String,
    pub type_name: String,
    pub name_end: usize,
    /// Declared inside parentheses: a parameter, catch or for-each variable
    pub parameter: bool,
    /// A method header `Type name(`
    pub method: bool,
}

/// Scan `tokens` (one opaque run) for `Type name` declarations and
/// `Type name(` method headers
pub(crate) fn scan_declarations(tokens: &[Token]) -> Vec<FoundDeclaration> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_punct("(") {
            depth += 1;
            continue;
        }
        if token.is_punct(")") {
            depth = depth.saturating_sub(1);
            continue;
        }
        if token.kind != TokenKind::Ident || is_keyword(&token.text) || i == 0 {
            continue;
        }
        let Some(next) = tokens.get(i + 1) else {
            continue;
        };
        let method = depth == 0 && next.is_punct("(");
        let terminated = [",", ")", "=", ";", ":"].iter().any(|t| next.is_punct(t));
        if !terminated && !method {
            continue;
        }
        let Some(type_name) = declared_type(tokens, i) else {
            continue;
        };
        let type_name = if type_name != "var" {
            type_name
        } else if method {
            continue;
        } else {
            infer_var_type(tokens, i + 1)
        };
        found.push(FoundDeclaration {
            name: token.text.clone(),
            type_name,
            name_end: token.span.end,
            parameter: depth > 0,
            method,
        });
    }
    found
}

/// Type text ending right before the name at `name_index`
fn declared_type(tokens: &[Token], name_index: usize) -> Option<String> {
    let previous = &tokens[name_index - 1];
    if previous.is_punct(">") || previous.is_punct("]") {
        return Some("?".to_string());
    }
    if previous.kind != TokenKind::Ident {
        return None;
    }
    if is_keyword(&previous.text) && !PRIMITIVE_TYPES.contains(&previous.text.as_str()) {
        return None;
    }
    let mut segments = vec![previous.text.as_str()];
    let mut k = name_index - 1;
    while k >= 2 && tokens[k - 1].is_punct(".") && tokens[k - 2].kind == TokenKind::Ident {
        segments.insert(0, tokens[k - 2].text.as_str());
        k -= 2;
    }
    Some(segments.join("."))
}

/// `var name = "literal"` is string-typed; any other initializer is unknown
fn infer_var_type(tokens: &[Token], after_name: usize) -> String {
    let assigned_string = tokens.get(after_name).is_some_and(|t| t.is_punct("="))
        && tokens
            .get(after_name + 1)
            .is_some_and(|t| matches!(t.kind, TokenKind::String | TokenKind::TextBlock));
    if assigned_string {
        "String".to_string()
    } else {
        "var".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    fn scan(source: &str) -> Vec<(String, String, bool)> {
        scan_declarations(&tokenize(source).unwrap())
            .into_iter()
            .filter(|d| !d.method)
            .map(|d| (d.name, d.type_name, d.parameter))
            .collect()
    }

    fn methods(source: &str) -> Vec<(String, String)> {
        scan_declarations(&tokenize(source).unwrap())
            .into_iter()
            .filter(|d| d.method)
            .map(|d| (d.name, d.type_name))
            .collect()
    }

    #[test]
    fn test_method_parameters() {
        assert_eq!(
            scan("void t(Object o, String message)"),
            vec![
                ("o".to_string(), "Object".to_string(), true),
                ("message".to_string(), "String".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_local_declarations() {
        assert_eq!(
            scan("final java.lang.String title = book.getTitle();"),
            vec![("title".to_string(), "java.lang.String".to_string(), false)]
        );
        assert_eq!(
            scan("var label = \"x\";"),
            vec![("label".to_string(), "String".to_string(), false)]
        );
        assert_eq!(
            scan("List<Book> books = bundle.getBooks();")[0].1,
            "?".to_string()
        );
    }

    #[test]
    fn test_statements_are_not_declarations() {
        assert!(scan("return value;").is_empty());
        assert!(scan("x = y;").is_empty());
        assert!(scan("foo(a, b);").is_empty());
    }

    #[test]
    fn test_method_headers() {
        assert_eq!(
            methods("@Override public String describe(int depth)"),
            vec![("describe".to_string(), "String".to_string())]
        );
        assert_eq!(
            methods("List<Book> books()"),
            vec![("books".to_string(), "?".to_string())]
        );
        assert!(methods("void run()").is_empty());
        assert!(methods("return compute(x);").is_empty());
        assert!(methods("Object o = factory.create(x);").is_empty());
        assert!(methods("throw new IllegalStateException(why);").is_empty());
    }

    fn declaration(name: &str, type_name: &str, kind: DeclarationKind, scope: Span) -> Declaration {
        Declaration {
            name: name.into(),
            type_name: type_name.into(),
            kind,
            scope,
        }
    }

    #[test]
    fn test_innermost_declaration_wins() {
        let env = TypeEnv::new(vec![
            declaration("m", "String", DeclarationKind::Field, Span::new(0, 100)),
            declaration("m", "int", DeclarationKind::Local, Span::new(20, 40)),
        ]);
        assert!(env.is_string("m", 10));
        assert!(!env.is_string("m", 30));
        assert!(env.is_string("m", 50));
        assert!(!env.is_string("other", 10));
        assert_eq!(env.field_type("m", 30), Some("String"));
    }

    #[test]
    fn test_methods_and_variables_are_separate() {
        let env = TypeEnv::new(vec![
            declaration("label", "String", DeclarationKind::Method, Span::new(0, 100)),
            declaration("label", "int", DeclarationKind::Local, Span::new(20, 40)),
        ]);
        assert_eq!(env.return_type("label", 30), Some("String"));
        assert_eq!(env.type_of("label", 30), Some("int"));
        assert_eq!(env.type_of("label", 50), None);
    }

    #[test]
    fn test_declared_value_types() {
        assert_eq!(ValueType::of_declared("long"), ValueType::Primitive);
        assert_eq!(ValueType::of_declared("Integer"), ValueType::Object);
        assert_eq!(ValueType::of_declared("?"), ValueType::Object);
        assert_eq!(ValueType::of_declared("var"), ValueType::Unknown);
    }
}
