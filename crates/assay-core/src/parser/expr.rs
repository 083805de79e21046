// Recursive-descent parser for the expression subset and the two statement
// forms the rewrite engine understands (`assert` and expression statements).

use crate::ast::{BinaryOp, LiteralKind, Node, NodeKind, Span, UnaryOp};

use super::lexer::{Token, TokenKind};
use super::scope::is_keyword;

/// Why a token run is not part of the supported subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

type ParseResult<T> = Result<T, SyntaxError>;

pub struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Offset reported when input ends early
    end_offset: usize,
}

impl<'t> ExprParser<'t> {
    pub fn new(tokens: &'t [Token], pos: usize, end_offset: usize) -> Self {
        Self {
            tokens,
            pos,
            end_offset,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// `assert cond [: message];` or `expr;` starting at the current token
    pub fn statement(&mut self) -> ParseResult<Node> {
        let start = self.offset();
        if self.peek().is_some_and(|t| t.is_ident("assert")) {
            self.pos += 1;
            let condition = self.expression()?;
            let message = if self.eat_punct(":") {
                Some(Box::new(self.expression()?))
            } else {
                None
            };
            let end = self.expect_punct(";")?;
            return Ok(Node::new(
                NodeKind::Assertion {
                    condition: Box::new(condition),
                    message,
                },
                Span::new(start, end),
            ));
        }
        let expr = self.expression()?;
        let end = self.expect_punct(";")?;
        Ok(Node::new(
            NodeKind::ExprStmt {
                expr: Box::new(expr),
            },
            Span::new(start, end),
        ))
    }

    pub fn expression(&mut self) -> ParseResult<Node> {
        self.binary(1)
    }

    /// Precedence climbing over left-associative binary operators
    fn binary(&mut self, min_precedence: u8) -> ParseResult<Node> {
        let mut left = self.unary()?;
        loop {
            let Some(op) = self.peek_binary_op() else {
                break;
            };
            if op.precedence() < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.binary(op.precedence() + 1)?;
            let span = Span::new(left.span.start, right.span.end);
            left = Node::new(
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        self.peek()
            .filter(|t| t.kind == TokenKind::Punct)
            .and_then(|t| BinaryOp::from_symbol(&t.text))
    }

    fn unary(&mut self) -> ParseResult<Node> {
        let op = match self.peek() {
            Some(t) if t.is_punct("!") => Some(UnaryOp::Not),
            Some(t) if t.is_punct("-") => Some(UnaryOp::Negate),
            Some(t) if t.is_punct("+") => Some(UnaryOp::Plus),
            _ => None,
        };
        match op {
            Some(op) => {
                let start = self.offset();
                self.pos += 1;
                let operand = self.unary()?;
                let span = Span::new(start, operand.span.end);
                Ok(Node::new(
                    NodeKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> ParseResult<Node> {
        let mut node = self.primary()?;
        loop {
            if self.eat_punct(".") {
                let name = self.member_name()?;
                if self.peek().is_some_and(|t| t.is_punct("(")) {
                    let (args, end) = self.arguments()?;
                    let span = Span::new(node.span.start, end);
                    node = Node::new(
                        NodeKind::Call {
                            receiver: Some(Box::new(node)),
                            name,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = Span::new(node.span.start, self.previous_end());
                    node = Node::new(
                        NodeKind::FieldAccess {
                            target: Box::new(node),
                            name,
                        },
                        span,
                    );
                }
            } else if self.eat_punct("[") {
                let index = self.expression()?;
                let end = self.expect_punct("]")?;
                let span = Span::new(node.span.start, end);
                node = Node::new(
                    NodeKind::Index {
                        target: Box::new(node),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn member_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Ident
                && (!is_keyword(&t.text) || t.text == "class" || t.text == "this") =>
            {
                let name = t.text.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected member name after '.'")),
        }
    }

    fn primary(&mut self) -> ParseResult<Node> {
        let Some(token) = self.peek() else {
            return Err(self.error("expected expression"));
        };
        let span = token.span;
        match token.kind {
            TokenKind::Integer => Ok(self.literal(LiteralKind::Integer)),
            TokenKind::Floating => Ok(self.literal(LiteralKind::Floating)),
            TokenKind::Char => Ok(self.literal(LiteralKind::Character)),
            TokenKind::String => Ok(self.literal(LiteralKind::String)),
            TokenKind::TextBlock => Ok(self.literal(LiteralKind::TextBlock)),
            TokenKind::Punct if token.is_punct("(") => {
                self.pos += 1;
                let inner = self.expression()?;
                let end = self.expect_punct(")")?;
                Ok(Node::new(
                    NodeKind::Paren {
                        inner: Box::new(inner),
                    },
                    Span::new(span.start, end),
                ))
            }
            TokenKind::Punct => Err(self.error(&format!("unexpected '{}'", token.text))),
            TokenKind::Ident => match token.text.as_str() {
                "null" => Ok(self.literal(LiteralKind::Null)),
                "true" | "false" => Ok(self.literal(LiteralKind::Boolean)),
                "new" => self.instance_creation(),
                "this" | "super" => {
                    let name = token.text.clone();
                    self.pos += 1;
                    Ok(Node::new(NodeKind::Reference { name }, span))
                }
                text if is_keyword(text) => Err(self.error(&format!("unsupported keyword '{text}'"))),
                _ => {
                    let name = token.text.clone();
                    self.pos += 1;
                    if self.peek().is_some_and(|t| t.is_punct("(")) {
                        let (args, end) = self.arguments()?;
                        Ok(Node::new(
                            NodeKind::Call {
                                receiver: None,
                                name,
                                args,
                            },
                            Span::new(span.start, end),
                        ))
                    } else {
                        Ok(Node::new(NodeKind::Reference { name }, span))
                    }
                }
            },
        }
    }

    fn literal(&mut self, kind: LiteralKind) -> Node {
        let token = &self.tokens[self.pos];
        self.pos += 1;
        Node::new(
            NodeKind::Literal {
                kind,
                text: token.text.clone(),
            },
            token.span,
        )
    }

    /// `new a.b.C<...>(args)`; array creation and anonymous classes are
    /// rejected
    fn instance_creation(&mut self) -> ParseResult<Node> {
        let start = self.offset();
        self.pos += 1;
        let mut class = String::new();
        loop {
            match self.peek() {
                Some(t) if t.kind == TokenKind::Ident && !is_keyword(&t.text) => {
                    class.push_str(&t.text);
                    self.pos += 1;
                }
                _ => return Err(self.error("expected class name after 'new'")),
            }
            if !self.eat_punct(".") {
                break;
            }
            class.push('.');
        }
        if self.peek().is_some_and(|t| t.is_punct("<")) {
            class.push_str(&self.type_arguments()?);
        }
        if !self.peek().is_some_and(|t| t.is_punct("(")) {
            return Err(self.error("unsupported instance creation"));
        }
        let (args, end) = self.arguments()?;
        if self.peek().is_some_and(|t| t.is_punct("{")) {
            return Err(self.error("anonymous classes are not supported"));
        }
        Ok(Node::new(NodeKind::New { class, args }, Span::new(start, end)))
    }

    /// Raw text of a balanced `<...>` group
    fn type_arguments(&mut self) -> ParseResult<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            let is_open = token.is_punct("<");
            let is_close = token.is_punct(">");
            let allowed = is_open
                || is_close
                || token.is_punct(",")
                || token.is_punct(".")
                || token.is_punct("?")
                || token.is_punct("[")
                || token.is_punct("]")
                || token.kind == TokenKind::Ident;
            if !allowed {
                break;
            }
            if token.is_punct(",") {
                text.push_str(", ");
            } else if token.kind == TokenKind::Ident && text.ends_with(|c: char| c.is_alphanumeric()) {
                text.push(' ');
                text.push_str(&token.text);
            } else {
                text.push_str(&token.text);
            }
            self.pos += 1;
            if is_open {
                depth += 1;
            } else if is_close {
                depth -= 1;
                if depth == 0 {
                    return Ok(text);
                }
            }
        }
        Err(self.error("unbalanced type arguments"))
    }

    fn arguments(&mut self) -> ParseResult<(Vec<Node>, usize)> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        if let Some(end) = self.peek().filter(|t| t.is_punct(")")).map(|t| t.span.end) {
            self.pos += 1;
            return Ok((args, end));
        }
        loop {
            args.push(self.expression()?);
            if self.eat_punct(",") {
                continue;
            }
            let end = self.expect_punct(")")?;
            return Ok((args, end));
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.span.start).unwrap_or(self.end_offset)
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(self.end_offset)
    }

    fn eat_punct(&mut self, text: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(text)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `text` and return the end offset of the token
    fn expect_punct(&mut self, text: &str) -> ParseResult<usize> {
        match self.peek() {
            Some(t) if t.is_punct(text) => {
                self.pos += 1;
                Ok(t.span.end)
            }
            Some(t) => Err(self.error(&format!("expected '{text}', found '{}'", t.text))),
            None => Err(self.error(&format!("expected '{text}'"))),
        }
    }

    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            offset: self.offset(),
            message: message.to_string(),
        }
    }
}
