// AST for the Java subset understood by the rewrite engine.
// The same node type describes parsed input files and compiled template
// fragments; templates additionally contain Placeholder nodes.

pub mod source_gen;
pub use source_gen::{SourcePrinter, ToSource};


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Byte range into the text a node was parsed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn encloses(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// 1-based line and column of a byte offset, used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Where a node's text comes from when the tree is printed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    /// Parsed from the current source; printed verbatim
    Source,
    /// Produced by a rewrite; printed canonically. The span is that of the
    /// node it replaced.
    Rewritten,
    /// A new file-level item (an import). `lead` is written before it and
    /// `trail` after it. A non-empty span anchors it inside the original
    /// text: the text up to the span start comes first, the span itself is
    /// dropped.
    Inserted {
        lead: &'static str,
        trail: &'static str,
    },
    /// Dropped from the output together with the whitespace preceding it
    Removed,
}

/// Semantic kind of a template placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    /// Any expression
    AnyValue,
    /// A simple or qualified name
    AnyReference,
    /// Any expression whose static type is `String`
    StringLiteralOrExpression,
    /// Any expression known to have a primitive type
    PrimitiveValue,
    /// Any expression known to have a reference type
    ObjectValue,
}

impl PlaceholderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::AnyValue => "AnyValue",
            PlaceholderKind::AnyReference => "AnyReference",
            PlaceholderKind::StringLiteralOrExpression => "StringLiteralOrExpression",
            PlaceholderKind::PrimitiveValue => "PrimitiveValue",
            PlaceholderKind::ObjectValue => "ObjectValue",
        }
    }
}

impl FromStr for PlaceholderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AnyValue" => Ok(PlaceholderKind::AnyValue),
            "AnyReference" => Ok(PlaceholderKind::AnyReference),
            "StringLiteralOrExpression" => Ok(PlaceholderKind::StringLiteralOrExpression),
            "PrimitiveValue" => Ok(PlaceholderKind::PrimitiveValue),
            "ObjectValue" => Ok(PlaceholderKind::ObjectValue),
            other => Err(format!("unknown placeholder kind '{other}'")),
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named hole in a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Null,
    Boolean,
    Integer,
    Floating,
    Character,
    String,
    TextBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal | BinaryOp::NotEqual => 3,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 4,
            BinaryOp::Add | BinaryOp::Subtract => 5,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Remainder => 6,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEqual,
            ">=" => BinaryOp::GreaterEqual,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Remainder,
            _ => return None,
        };
        Some(op)
    }
}

/// An `import` declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*` of wildcard imports
    pub path: String,
    pub is_static: bool,
    pub wildcard: bool,
}

impl ImportDecl {
    pub fn single(path: impl Into<String>, is_static: bool) -> Self {
        Self {
            path: path.into(),
            is_static,
            wildcard: false,
        }
    }

    /// Simple name this import makes visible, `None` for wildcards
    pub fn short_name(&self) -> Option<&str> {
        if self.wildcard {
            None
        } else {
            Some(last_segment(&self.path))
        }
    }

    /// Type a static import reads its members from
    pub fn owner(&self) -> &str {
        if self.wildcard || !self.is_static {
            &self.path
        } else {
            self.path.rsplit_once('.').map(|(owner, _)| owner).unwrap_or("")
        }
    }
}

impl fmt::Display for ImportDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("import ")?;
        if self.is_static {
            f.write_str("static ")?;
        }
        f.write_str(&self.path)?;
        if self.wildcard {
            f.write_str(".*")?;
        }
        f.write_str(";")
    }
}

/// Last segment of a dotted name
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    // File structure
    Unit {
        items: Vec<Node>,
    },
    Package {
        name: String,
    },
    Import(ImportDecl),
    Block {
        items: Vec<Node>,
    },
    /// Source the parser keeps as text: declarations, control-flow headers
    /// and anything outside the expression subset
    Opaque,

    // Statements
    Assertion {
        condition: Box<Node>,
        message: Option<Box<Node>>,
    },
    ExprStmt {
        expr: Box<Node>,
    },

    // Expressions
    Literal {
        kind: LiteralKind,
        text: String,
    },
    Reference {
        name: String,
    },
    FieldAccess {
        target: Box<Node>,
        name: String,
    },
    Index {
        target: Box<Node>,
        index: Box<Node>,
    },
    Call {
        receiver: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
    },
    New {
        class: String,
        args: Vec<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Paren {
        inner: Box<Node>,
    },

    // Templates only
    Placeholder(Placeholder),
}

/// Index path from the root to a node, one child index per level
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub origin: Origin,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            origin: Origin::Source,
        }
    }

    /// A node without a source location
    pub fn synthetic(kind: NodeKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            origin: Origin::Rewritten,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::synthetic(NodeKind::Reference { name: name.into() })
    }

    /// `a.b.c` as a chain of field accesses over a reference
    pub fn qualified_name(path: &str) -> Self {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or(path);
        segments.fold(Self::reference(first), |target, name| {
            Self::synthetic(NodeKind::FieldAccess {
                target: Box::new(target),
                name: name.to_string(),
            })
        })
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Literal { .. }
                | NodeKind::Reference { .. }
                | NodeKind::FieldAccess { .. }
                | NodeKind::Index { .. }
                | NodeKind::Call { .. }
                | NodeKind::New { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Paren { .. }
                | NodeKind::Placeholder(_)
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Assertion { .. } | NodeKind::ExprStmt { .. }
        )
    }

    /// Dotted text of a name or field-access chain (`a.b.C`)
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Reference { name } => Some(name.clone()),
            NodeKind::FieldAccess { target, name } => {
                target.dotted_name().map(|prefix| format!("{prefix}.{name}"))
            }
            _ => None,
        }
    }

    /// Children in source order
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Unit { items } | NodeKind::Block { items } => items.iter().collect(),
            NodeKind::Assertion { condition, message } => {
                let mut children = vec![condition.as_ref()];
                if let Some(message) = message {
                    children.push(message.as_ref());
                }
                children
            }
            NodeKind::ExprStmt { expr } => vec![expr.as_ref()],
            NodeKind::FieldAccess { target, .. } => vec![target.as_ref()],
            NodeKind::Index { target, index } => vec![target.as_ref(), index.as_ref()],
            NodeKind::Call { receiver, args, .. } => {
                let mut children: Vec<&Node> = receiver.iter().map(|r| r.as_ref()).collect();
                children.extend(args.iter());
                children
            }
            NodeKind::New { args, .. } => args.iter().collect(),
            NodeKind::Unary { operand, .. } => vec![operand.as_ref()],
            NodeKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            NodeKind::Paren { inner } => vec![inner.as_ref()],
            NodeKind::Package { .. }
            | NodeKind::Import(_)
            | NodeKind::Opaque
            | NodeKind::Literal { .. }
            | NodeKind::Reference { .. }
            | NodeKind::Placeholder(_) => Vec::new(),
        }
    }

    /// Mutable children, same order as [`Node::children`]
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.kind {
            NodeKind::Unit { items } | NodeKind::Block { items } => items.iter_mut().collect(),
            NodeKind::Assertion { condition, message } => {
                let mut children = vec![condition.as_mut()];
                if let Some(message) = message {
                    children.push(message.as_mut());
                }
                children
            }
            NodeKind::ExprStmt { expr } => vec![expr.as_mut()],
            NodeKind::FieldAccess { target, .. } => vec![target.as_mut()],
            NodeKind::Index { target, index } => vec![target.as_mut(), index.as_mut()],
            NodeKind::Call { receiver, args, .. } => {
                let mut children: Vec<&mut Node> =
                    receiver.iter_mut().map(|r| r.as_mut()).collect();
                children.extend(args.iter_mut());
                children
            }
            NodeKind::New { args, .. } => args.iter_mut().collect(),
            NodeKind::Unary { operand, .. } => vec![operand.as_mut()],
            NodeKind::Binary { left, right, .. } => vec![left.as_mut(), right.as_mut()],
            NodeKind::Paren { inner } => vec![inner.as_mut()],
            NodeKind::Package { .. }
            | NodeKind::Import(_)
            | NodeKind::Opaque
            | NodeKind::Literal { .. }
            | NodeKind::Reference { .. }
            | NodeKind::Placeholder(_) => Vec::new(),
        }
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => self.children().get(index)?.node_at(rest),
        }
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => self
                .children_mut()
                .into_iter()
                .nth(index)?
                .node_at_mut(rest),
        }
    }

    /// Pre-order walk
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Node)) {
        visit(self);
        for child in self.children_mut() {
            child.walk_mut(visit);
        }
    }

    pub fn placeholders(&self) -> Vec<&Placeholder> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if let NodeKind::Placeholder(placeholder) = &node.kind {
                found.push(placeholder);
            }
        });
        found
    }

    /// Structural equality ignoring spans and origins
    pub fn same_shape(&self, other: &Node) -> bool {
        let own_children = self.children();
        let other_children = other.children();
        shallow_eq(&self.kind, &other.kind)
            && own_children.len() == other_children.len()
            && own_children
                .iter()
                .zip(other_children.iter())
                .all(|(a, b)| a.same_shape(b))
    }

    /// Whether every source node starts no earlier than the end of the
    /// source node visited before it, depth-first
    pub fn spans_are_monotonic(&self) -> bool {
        fn check(node: &Node, floor: &mut usize) -> bool {
            if node.origin != Origin::Source {
                return true;
            }
            if node.span.start < *floor || node.span.end < node.span.start {
                return false;
            }
            let mut inner = node.span.start;
            for child in node.children() {
                if child.origin == Origin::Source && child.span.end > node.span.end {
                    return false;
                }
                if !check(child, &mut inner) {
                    return false;
                }
            }
            *floor = node.span.end;
            true
        }
        let mut floor = 0;
        check(self, &mut floor)
    }
}

/// Compare the non-child parts of two node kinds
pub(crate) fn shallow_eq(a: &NodeKind, b: &NodeKind) -> bool {
    match (a, b) {
        (NodeKind::Unit { .. }, NodeKind::Unit { .. }) => true,
        (NodeKind::Block { .. }, NodeKind::Block { .. }) => true,
        (NodeKind::Opaque, NodeKind::Opaque) => true,
        (NodeKind::Package { name: a }, NodeKind::Package { name: b }) => a == b,
        (NodeKind::Import(a), NodeKind::Import(b)) => a == b,
        (
            NodeKind::Assertion { message: a, .. },
            NodeKind::Assertion { message: b, .. },
        ) => a.is_some() == b.is_some(),
        (NodeKind::ExprStmt { .. }, NodeKind::ExprStmt { .. }) => true,
        (
            NodeKind::Literal { kind: ka, text: ta },
            NodeKind::Literal { kind: kb, text: tb },
        ) => ka == kb && ta == tb,
        (NodeKind::Reference { name: a }, NodeKind::Reference { name: b }) => a == b,
        (NodeKind::FieldAccess { name: a, .. }, NodeKind::FieldAccess { name: b, .. }) => a == b,
        (NodeKind::Index { .. }, NodeKind::Index { .. }) => true,
        (
            NodeKind::Call {
                receiver: ra,
                name: na,
                ..
            },
            NodeKind::Call {
                receiver: rb,
                name: nb,
                ..
            },
        ) => na == nb && ra.is_some() == rb.is_some(),
        (NodeKind::New { class: a, .. }, NodeKind::New { class: b, .. }) => a == b,
        (NodeKind::Unary { op: a, .. }, NodeKind::Unary { op: b, .. }) => a == b,
        (NodeKind::Binary { op: a, .. }, NodeKind::Binary { op: b, .. }) => a == b,
        (NodeKind::Paren { .. }, NodeKind::Paren { .. }) => true,
        (NodeKind::Placeholder(a), NodeKind::Placeholder(b)) => a == b,
        _ => false,
    }
}
