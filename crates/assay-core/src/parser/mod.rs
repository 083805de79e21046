//! Parsing of Java source files and template fragments
//!
//! A file is parsed into a `Unit` whose items are package and import
//! declarations, blocks, statements of the supported subset and opaque
//! runs of everything else. Opaque runs end at `;`, `{` or `}` outside of
//! parentheses, so nested blocks are always reached. They also end before
//! an `assert` that is the body of a control-flow header such as
//! `if (c) assert x;`.

pub mod expr;
pub mod lexer;
pub mod scope;

#[cfg(test)]
mod tests;

use crate::ast::{ImportDecl, Node, NodeKind, Position, SourcePrinter, Span};
use crate::errors::{Result, RewriteError};

use expr::ExprParser;
use lexer::{tokenize, Token, TokenKind};
use scope::{is_keyword, scan_declarations, Declaration, DeclarationKind, FoundDeclaration, TypeEnv};

/// An `assert` statement the parser kept as opaque text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedConstruct {
    pub span: Span,
    pub position: Position,
    pub description: String,
}

impl UnsupportedConstruct {
    pub fn to_error(&self) -> RewriteError {
        RewriteError::Unsupported {
            position: self.position,
            construct: self.description.clone(),
        }
    }
}

/// A parsed file together with the text it was parsed from
#[derive(Debug, Clone)]
pub struct SourceFile {
    text: String,
    root: Node,
    tokens: Vec<Token>,
    types: TypeEnv,
    unsupported: Vec<UnsupportedConstruct>,
}

impl SourceFile {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let tokens = tokenize(&text).map_err(|e| parse_error(&text, e.offset, e.message))?;
        let (root, declarations, unsupported) = {
            let mut parser = UnitParser::new(&text, &tokens);
            let root = parser.unit()?;
            (root, parser.declarations, parser.unsupported)
        };
        Ok(Self {
            text,
            root,
            tokens,
            types: TypeEnv::new(declarations),
            unsupported,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Tree and text together, for edits placed relative to the text
    pub fn edit(&mut self) -> (&mut Node, &str) {
        (&mut self.root, &self.text)
    }

    pub fn types(&self) -> &TypeEnv {
        &self.types
    }

    pub fn unsupported(&self) -> &[UnsupportedConstruct] {
        &self.unsupported
    }

    /// Current tree printed against the original text
    pub fn print(&self) -> String {
        SourcePrinter::new(&self.text).print(&self.root)
    }

    pub fn imports(&self) -> Vec<ImportDecl> {
        self.items()
            .iter()
            .filter_map(|item| match &item.kind {
                NodeKind::Import(import) => Some(import.clone()),
                _ => None,
            })
            .collect()
    }

    /// Identifiers spelled `name` outside of package and import
    /// declarations, opaque regions included
    pub fn reference_count(&self, name: &str) -> usize {
        let declarations: Vec<Span> = self
            .items()
            .iter()
            .filter(|item| matches!(item.kind, NodeKind::Package { .. } | NodeKind::Import(_)))
            .map(|item| item.span)
            .collect();
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Ident && t.text == name)
            .filter(|t| !declarations.iter().any(|span| span.encloses(t.span)))
            .count()
    }

    pub fn position(&self, offset: usize) -> Position {
        Position::from_offset(&self.text, offset)
    }

    fn items(&self) -> &[Node] {
        match &self.root.kind {
            NodeKind::Unit { items } => items,
            _ => &[],
        }
    }
}

/// Parse a template fragment: a statement when it ends with `;`, an
/// expression otherwise. Spans are relative to `text`.
pub fn parse_fragment(text: &str) -> std::result::Result<Node, String> {
    let tokens = tokenize(text).map_err(|e| e.message)?;
    if tokens.is_empty() {
        return Err("empty fragment".to_string());
    }
    let mut parser = ExprParser::new(&tokens, 0, text.len());
    let node = if tokens.last().is_some_and(|t| t.is_punct(";")) {
        parser.statement()
    } else {
        parser.expression()
    }
    .map_err(|e| format!("{} at offset {}", e.message, e.offset))?;
    if let Some(extra) = tokens.get(parser.position()) {
        return Err(format!(
            "unexpected '{}' at offset {}",
            extra.text, extra.span.start
        ));
    }
    Ok(node)
}

fn parse_error(source: &str, offset: usize, message: impl Into<String>) -> RewriteError {
    RewriteError::Parse {
        position: Position::from_offset(source, offset),
        message: message.into(),
    }
}

/// Tokens that may begin an expression statement
fn starts_expression(token: &Token) -> bool {
    match token.kind {
        TokenKind::Ident => {
            !is_keyword(&token.text) || matches!(token.text.as_str(), "this" | "super" | "new")
        }
        TokenKind::Punct => token.is_punct("("),
        _ => false,
    }
}

/// Declarations of one open block
struct Scope {
    start: usize,
    /// A class, interface or enum body, whose members are visible anywhere
    /// inside it
    members: bool,
    found: Vec<FoundDeclaration>,
}

/// Whether the block after `run` is a class, interface, enum or record body,
/// anonymous classes included
fn opens_type_body(run: &[Token]) -> bool {
    let declares_type = run.iter().enumerate().any(|(i, token)| {
        let member_of = i > 0 && run[i - 1].is_punct(".");
        (token.is_ident("class") && !member_of)
            || token.is_ident("interface")
            || token.is_ident("enum")
            || (token.is_ident("record")
                && run.get(i + 1).is_some_and(|next| next.kind == TokenKind::Ident))
    });
    let mut depth = 0usize;
    let mut creates_instance = false;
    for token in run {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is_ident("new") {
            creates_instance = true;
        }
    }
    declares_type || (creates_instance && run.last().is_some_and(|t| t.is_punct(")")))
}

struct UnitParser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    /// Innermost last
    scopes: Vec<Scope>,
    /// Parameters waiting for the block or statement they belong to
    pending_parameters: Vec<FoundDeclaration>,
    /// The next block is a type body
    pending_members: bool,
    declarations: Vec<Declaration>,
    unsupported: Vec<UnsupportedConstruct>,
}

impl<'a> UnitParser<'a> {
    fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            scopes: Vec::new(),
            pending_parameters: Vec::new(),
            pending_members: false,
            declarations: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    fn unit(&mut self) -> Result<Node> {
        self.scopes.push(Scope {
            start: 0,
            members: false,
            found: Vec::new(),
        });
        let items = self.items(true)?;
        self.close_scope(self.source.len());
        Ok(Node::new(
            NodeKind::Unit { items },
            Span::new(0, self.source.len()),
        ))
    }

    fn items(&mut self, top_level: bool) -> Result<Vec<Node>> {
        let tokens = self.tokens;
        let mut items = Vec::new();
        while let Some(token) = tokens.get(self.pos) {
            if token.is_punct("}") {
                if top_level {
                    return Err(self.error(token.span.start, "unexpected '}'"));
                }
                break;
            }
            items.push(self.item(top_level)?);
        }
        Ok(items)
    }

    fn item(&mut self, top_level: bool) -> Result<Node> {
        let tokens = self.tokens;
        let token = &tokens[self.pos];
        if token.is_punct("{") {
            return self.block();
        }
        if token.is_ident("assert") {
            // braceless body of a header like `for (String s : xs)`
            let parameters = std::mem::take(&mut self.pending_parameters);
            self.pending_members = false;
            let node = self.assertion()?;
            self.declare_parameters(parameters, node.span);
            return Ok(node);
        }
        self.pending_parameters.clear();
        self.pending_members = false;
        if top_level && token.is_ident("package") {
            if let Some(node) = self.package() {
                return Ok(node);
            }
        }
        if top_level && token.is_ident("import") {
            if let Some(node) = self.import() {
                return Ok(node);
            }
        }
        if starts_expression(token) {
            if let Some(node) = self.expression_statement() {
                return Ok(node);
            }
        }
        self.opaque()
    }

    fn block(&mut self) -> Result<Node> {
        let open = self.tokens[self.pos].span.start;
        self.pos += 1;
        let parameters = std::mem::take(&mut self.pending_parameters);
        let members = std::mem::take(&mut self.pending_members);
        self.scopes.push(Scope {
            start: open,
            members,
            found: Vec::new(),
        });
        let items = self.items(false)?;
        let Some(close) = self.tokens.get(self.pos) else {
            return Err(self.error(open, "unclosed '{'"));
        };
        let end = close.span.end;
        self.pos += 1;
        self.close_scope(end);
        self.declare_parameters(parameters, Span::new(open, end));
        Ok(Node::new(NodeKind::Block { items }, Span::new(open, end)))
    }

    fn declare_parameters(&mut self, parameters: Vec<FoundDeclaration>, scope: Span) {
        self.declarations
            .extend(parameters.into_iter().map(|p| Declaration {
                name: p.name,
                type_name: p.type_name,
                kind: DeclarationKind::Local,
                scope,
            }));
    }

    fn close_scope(&mut self, end: usize) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        let body = Span::new(scope.start, end);
        let members = scope.members;
        self.declarations
            .extend(scope.found.into_iter().map(|found| {
                let (kind, visible) = if found.method {
                    (DeclarationKind::Method, body)
                } else if members {
                    (DeclarationKind::Field, body)
                } else {
                    (DeclarationKind::Local, Span::new(found.name_end, end))
                };
                Declaration {
                    name: found.name,
                    type_name: found.type_name,
                    kind,
                    scope: visible,
                }
            }));
    }

    /// `package a.b.c;`, or `None` to leave it opaque
    fn package(&mut self) -> Option<Node> {
        let start = self.tokens[self.pos].span.start;
        let mut i = self.pos + 1;
        let mut name = String::new();
        loop {
            let token = self.tokens.get(i)?;
            if token.is_punct(";") {
                break;
            }
            let name_part = token.is_punct(".")
                || (token.kind == TokenKind::Ident && !is_keyword(&token.text));
            if !name_part {
                return None;
            }
            name.push_str(&token.text);
            i += 1;
        }
        if name.is_empty() {
            return None;
        }
        let end = self.tokens[i].span.end;
        self.pos = i + 1;
        Some(Node::new(NodeKind::Package { name }, Span::new(start, end)))
    }

    /// `import [static] a.b.C[.*];`, or `None` to leave it opaque
    fn import(&mut self) -> Option<Node> {
        let start = self.tokens[self.pos].span.start;
        let mut i = self.pos + 1;
        let is_static = self.tokens.get(i)?.is_ident("static");
        if is_static {
            i += 1;
        }
        let mut path = String::new();
        let mut wildcard = false;
        loop {
            let segment = self.tokens.get(i)?;
            if segment.kind != TokenKind::Ident || is_keyword(&segment.text) {
                return None;
            }
            path.push_str(&segment.text);
            i += 1;
            let separator = self.tokens.get(i)?;
            if separator.is_punct(";") {
                break;
            }
            if !separator.is_punct(".") {
                return None;
            }
            i += 1;
            if self.tokens.get(i)?.is_punct("*") {
                i += 1;
                if !self.tokens.get(i)?.is_punct(";") {
                    return None;
                }
                wildcard = true;
                break;
            }
            path.push('.');
        }
        let end = self.tokens[i].span.end;
        self.pos = i + 1;
        Some(Node::new(
            NodeKind::Import(ImportDecl {
                path,
                is_static,
                wildcard,
            }),
            Span::new(start, end),
        ))
    }

    fn assertion(&mut self) -> Result<Node> {
        let mut parser = ExprParser::new(self.tokens, self.pos, self.source.len());
        match parser.statement() {
            Ok(node) => {
                self.pos = parser.position();
                Ok(node)
            }
            Err(err) => {
                let node = self.opaque()?;
                self.unsupported.push(UnsupportedConstruct {
                    span: node.span,
                    position: Position::from_offset(self.source, err.offset),
                    description: format!("assert statement ({})", err.message),
                });
                Ok(node)
            }
        }
    }

    fn expression_statement(&mut self) -> Option<Node> {
        let mut parser = ExprParser::new(self.tokens, self.pos, self.source.len());
        let node = parser.statement().ok()?;
        self.pos = parser.position();
        Some(node)
    }

    /// Consume tokens up to the end of the current run and record the
    /// declarations found in it
    fn opaque(&mut self) -> Result<Node> {
        let tokens = self.tokens;
        let first = self.pos;
        let case_label = tokens[first].is_ident("case") || tokens[first].is_ident("default");
        let mut open_parens: Vec<usize> = Vec::new();
        let mut nested_asserts = Vec::new();
        let mut ends_statement = false;
        while let Some(token) = tokens.get(self.pos) {
            if token.is_ident("assert") && self.pos > first {
                if open_parens.is_empty() {
                    break;
                }
                nested_asserts.push(token.span.start);
            }
            if token.is_punct("(") {
                open_parens.push(token.span.start);
            } else if token.is_punct(")") {
                if open_parens.pop().is_none() {
                    return Err(self.error(token.span.start, "unbalanced ')'"));
                }
            } else if open_parens.is_empty() {
                if token.is_punct("{") || token.is_punct("}") {
                    break;
                }
                if token.is_punct(";") || (case_label && token.is_punct(":")) {
                    ends_statement = token.is_punct(";");
                    self.pos += 1;
                    break;
                }
            }
            self.pos += 1;
        }
        if let Some(&offset) = open_parens.last() {
            return Err(self.error(offset, "unclosed '('"));
        }

        let run = &tokens[first..self.pos];
        let span = match (run.first(), run.last()) {
            (Some(head), Some(tail)) => Span::new(head.span.start, tail.span.end),
            _ => Span::new(self.source.len(), self.source.len()),
        };
        for offset in nested_asserts {
            self.unsupported.push(UnsupportedConstruct {
                span,
                position: Position::from_offset(self.source, offset),
                description: "assert statement inside an expression".to_string(),
            });
        }
        let (parameters, locals): (Vec<_>, Vec<_>) = scan_declarations(run)
            .into_iter()
            .partition(|found| found.parameter);
        if let Some(scope) = self.scopes.last_mut() {
            scope.found.extend(locals);
        }
        if !ends_statement {
            self.pending_parameters = parameters;
            self.pending_members = opens_type_body(run);
        }
        Ok(Node::new(NodeKind::Opaque, span))
    }

    fn error(&self, offset: usize, message: &str) -> RewriteError {
        parse_error(self.source, offset, message)
    }
}
