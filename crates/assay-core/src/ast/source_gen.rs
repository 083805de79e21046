// Source code generation from the AST.
// Nodes parsed from a file are written back from the file text, so
// untouched regions stay byte-identical. Rewritten nodes are printed in
// the canonical style, which still copies any captured source subtree
// verbatim.

use super::*;

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

impl ToSource for Node {
    /// Canonical rendering, ignoring any original text
    fn to_source(&self) -> String {
        let mut out = String::new();
        write_canonical(self, &mut out, &|child: &Node, out: &mut String| {
            out.push_str(&child.to_source())
        });
        out
    }
}

/// Prints a tree against the text it was parsed from
pub struct SourcePrinter<'a> {
    source: &'a str,
}

impl<'a> SourcePrinter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn print(&self, node: &Node) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        self.print_into(node, &mut out);
        out
    }

    fn print_into(&self, node: &Node, out: &mut String) {
        match node.origin {
            Origin::Removed => {}
            Origin::Rewritten | Origin::Inserted { .. } => self.print_canonical(node, out),
            Origin::Source => match &node.kind {
                NodeKind::Unit { items } | NodeKind::Block { items } => {
                    self.print_items(node.span, items, out)
                }
                _ => self.stitch(node, out),
            },
        }
    }

    fn print_canonical(&self, node: &Node, out: &mut String) {
        write_canonical(node, out, &|child: &Node, out: &mut String| {
            self.print_into(child, out)
        });
    }

    /// Original text of `node` with each child replaced by its own print
    fn stitch(&self, node: &Node, out: &mut String) {
        let mut cursor = node.span.start;
        for child in node.children() {
            out.push_str(self.slice(cursor, child.span.start));
            self.print_into(child, out);
            cursor = child.span.end;
        }
        out.push_str(self.slice(cursor, node.span.end));
    }

    fn print_items(&self, span: Span, items: &[Node], out: &mut String) {
        let mut cursor = span.start;
        for (i, item) in items.iter().enumerate() {
            match item.origin {
                Origin::Inserted { lead, trail } => {
                    if item.span.end > cursor {
                        out.push_str(self.slice(cursor, item.span.start));
                        cursor = item.span.end;
                    }
                    out.push_str(lead);
                    self.print_canonical(item, out);
                    out.push_str(trail);
                }
                Origin::Removed => {
                    let before = self.slice(cursor, item.span.start);
                    let next = items
                        .get(i + 1)
                        .filter(|next| matches!(next.origin, Origin::Source | Origin::Rewritten));
                    if out.is_empty() && before.trim().is_empty() {
                        cursor = item.span.end + self.leading_blank_len(item.span.end);
                    } else if let Some(next) = next.filter(|next| {
                        line_breaks(before) > line_breaks(self.slice(item.span.end, next.span.start))
                    }) {
                        // first of a group: keep the separator above, drop the one below
                        out.push_str(before);
                        cursor = next.span.start;
                    } else {
                        out.push_str(before.trim_end());
                        cursor = item.span.end;
                    }
                }
                Origin::Source | Origin::Rewritten => {
                    out.push_str(self.slice(cursor, item.span.start));
                    self.print_into(item, out);
                    cursor = item.span.end;
                }
            }
        }
        out.push_str(self.slice(cursor, span.end));
    }

    /// Whitespace run starting at `offset`
    fn leading_blank_len(&self, offset: usize) -> usize {
        self.source
            .get(offset..)
            .map(|rest| rest.len() - rest.trim_start().len())
            .unwrap_or(0)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        if start >= end {
            return "";
        }
        self.source.get(start..end).unwrap_or("")
    }
}

fn line_breaks(text: &str) -> usize {
    text.matches('\n').count()
}

type ChildPrinter<'p> = dyn Fn(&Node, &mut String) + 'p;

fn write_canonical(node: &Node, out: &mut String, child: &ChildPrinter<'_>) {
    match &node.kind {
        NodeKind::Unit { items } => {
            for (i, item) in items.iter().enumerate() {
                if item.origin == Origin::Removed {
                    continue;
                }
                if i > 0 {
                    out.push('\n');
                }
                child(item, out);
            }
        }
        NodeKind::Block { items } => {
            out.push_str("{ ");
            for item in items.iter().filter(|item| item.origin != Origin::Removed) {
                child(item, out);
                out.push(' ');
            }
            out.push('}');
        }
        NodeKind::Package { name } => {
            out.push_str("package ");
            out.push_str(name);
            out.push(';');
        }
        NodeKind::Import(import) => out.push_str(&import.to_string()),
        NodeKind::Opaque => {}
        NodeKind::Assertion { condition, message } => {
            out.push_str("assert ");
            child(condition, out);
            if let Some(message) = message {
                out.push_str(" : ");
                child(message, out);
            }
            out.push(';');
        }
        NodeKind::ExprStmt { expr } => {
            child(expr, out);
            out.push(';');
        }
        NodeKind::Literal { text, .. } => out.push_str(text),
        NodeKind::Reference { name } => out.push_str(name),
        NodeKind::Placeholder(placeholder) => out.push_str(&placeholder.name),
        NodeKind::FieldAccess { target, name } => {
            write_operand(target, out, child);
            out.push('.');
            out.push_str(name);
        }
        NodeKind::Index { target, index } => {
            write_operand(target, out, child);
            out.push('[');
            child(index, out);
            out.push(']');
        }
        NodeKind::Call {
            receiver,
            name,
            args,
        } => {
            if let Some(receiver) = receiver {
                write_operand(receiver, out, child);
                out.push('.');
            }
            out.push_str(name);
            write_args(args, out, child);
        }
        NodeKind::New { class, args } => {
            out.push_str("new ");
            out.push_str(class);
            write_args(args, out, child);
        }
        NodeKind::Unary { op, operand } => {
            out.push_str(op.symbol());
            if matches!(operand.kind, NodeKind::Binary { .. }) {
                write_parenthesized(operand, out, child);
            } else {
                child(operand, out);
            }
        }
        NodeKind::Binary { op, left, right } => {
            write_binary_side(left, op.precedence(), false, out, child);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_binary_side(right, op.precedence(), true, out, child);
        }
        NodeKind::Paren { inner } => write_parenthesized(inner, out, child),
    }
}

fn write_args(args: &[Node], out: &mut String, child: &ChildPrinter<'_>) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        child(arg, out);
    }
    out.push(')');
}

/// Receivers and field-access targets need parentheses around operators
fn write_operand(node: &Node, out: &mut String, child: &ChildPrinter<'_>) {
    if matches!(node.kind, NodeKind::Binary { .. } | NodeKind::Unary { .. }) {
        write_parenthesized(node, out, child);
    } else {
        child(node, out);
    }
}

fn write_binary_side(
    node: &Node,
    parent_precedence: u8,
    right: bool,
    out: &mut String,
    child: &ChildPrinter<'_>,
) {
    let needs_parens = match &node.kind {
        NodeKind::Binary { op, .. } => {
            op.precedence() < parent_precedence || (right && op.precedence() == parent_precedence)
        }
        _ => false,
    };
    if needs_parens {
        write_parenthesized(node, out, child);
    } else {
        child(node, out);
    }
}

fn write_parenthesized(node: &Node, out: &mut String, child: &ChildPrinter<'_>) {
    out.push('(');
    child(node, out);
    out.push(')');
}
