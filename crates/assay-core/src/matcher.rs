/*!
# Pattern Matching

Finds occurrences of a compiled pattern in a parsed file. The tree is walked
in pre-order; when a node unifies with the pattern root the match is
recorded and its subtree is not searched further, so overlapping matches
resolve outermost-first and then leftmost-first.
*/

use indexmap::IndexMap;

use crate::ast::{last_segment, shallow_eq, ImportDecl, Node, NodeKind, NodePath, PlaceholderKind, Span};
use crate::parser::scope::{TypeEnv, ValueType};
use crate::rewriter::imports::ImportSet;
use crate::template::{Pattern, Symbol};

/// What the matcher knows about the file besides its tree
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub types: &'a TypeEnv,
    pub imports: &'a ImportSet,
    /// Symbols the pattern refers to by short name
    pub symbols: &'a [Symbol],
}

/// Captured subtrees of one match, keyed by placeholder name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    pub captures: IndexMap<String, Node>,
    /// Explicit imports the matched code used to reach pattern symbols
    pub resolved_imports: Vec<ImportDecl>,
}

impl Binding {
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.captures.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub path: NodePath,
    pub span: Span,
    pub binding: Binding,
}

/// Every occurrence of `pattern` under `root`
pub fn matches(root: &Node, pattern: &Pattern, ctx: &MatchContext<'_>) -> Vec<Match> {
    let mut found = Vec::new();
    let mut path = Vec::new();
    search(root, pattern, ctx, &mut path, &mut found);
    found
}

fn search(
    node: &Node,
    pattern: &Pattern,
    ctx: &MatchContext<'_>,
    path: &mut NodePath,
    found: &mut Vec<Match>,
) {
    let mut binding = Binding::default();
    if unify(&pattern.root, node, ctx, &mut binding) {
        found.push(Match {
            path: path.clone(),
            span: node.span,
            binding,
        });
        return;
    }
    for (index, child) in node.children().into_iter().enumerate() {
        path.push(index);
        search(child, pattern, ctx, path, found);
        path.pop();
    }
}

fn unify(pattern: &Node, input: &Node, ctx: &MatchContext<'_>, binding: &mut Binding) -> bool {
    if let NodeKind::Placeholder(placeholder) = &pattern.kind {
        if !accepts(placeholder.kind, input, ctx) {
            return false;
        }
        binding
            .captures
            .insert(placeholder.name.clone(), input.clone());
        return true;
    }

    if let NodeKind::Call {
        receiver: None,
        name,
        args,
    } = &pattern.kind
    {
        if let Some(symbol) = ctx
            .symbols
            .iter()
            .find(|s| s.is_static && s.short_name() == name.as_str())
        {
            return unify_symbol_call(symbol, args, input, ctx, binding);
        }
    }

    if !shallow_eq(&pattern.kind, &input.kind) {
        return false;
    }
    let pattern_children = pattern.children();
    let input_children = input.children();
    pattern_children.len() == input_children.len()
        && pattern_children
            .iter()
            .zip(input_children.iter())
            .all(|(p, i)| unify(p, i, ctx, binding))
}

fn accepts(kind: PlaceholderKind, input: &Node, ctx: &MatchContext<'_>) -> bool {
    match kind {
        PlaceholderKind::AnyValue => input.is_expression(),
        PlaceholderKind::AnyReference => input.dotted_name().is_some(),
        PlaceholderKind::StringLiteralOrExpression => {
            input.is_expression() && ctx.types.is_string_expression(input)
        }
        PlaceholderKind::PrimitiveValue => {
            input.is_expression() && ctx.types.value_type(input) == ValueType::Primitive
        }
        PlaceholderKind::ObjectValue => {
            input.is_expression() && ctx.types.value_type(input) == ValueType::Object
        }
    }
}

/// A call to a static symbol matches when the input call resolves to that
/// same symbol: through a static import, or qualified by its owner type
fn unify_symbol_call(
    symbol: &Symbol,
    pattern_args: &[Node],
    input: &Node,
    ctx: &MatchContext<'_>,
    binding: &mut Binding,
) -> bool {
    let NodeKind::Call {
        receiver,
        name,
        args,
    } = &input.kind
    else {
        return false;
    };
    if name != symbol.short_name() || args.len() != pattern_args.len() {
        return false;
    }
    let resolved = match receiver {
        None => match ctx.imports.resolve_static(symbol) {
            Some(import) => Some(import.clone()),
            None => return false,
        },
        Some(owner) => match owner.dotted_name() {
            Some(written) if written == symbol.owner() => None,
            Some(written) if written == last_segment(symbol.owner()) => {
                match ctx.imports.resolve_type(symbol.owner()) {
                    Some(import) => Some(import.clone()),
                    None => return false,
                }
            }
            _ => return false,
        },
    };
    if !pattern_args
        .iter()
        .zip(args.iter())
        .all(|(p, i)| unify(p, i, ctx, binding))
    {
        return false;
    }
    if let Some(import) = resolved.filter(|import| !import.wildcard) {
        if !binding.resolved_imports.contains(&import) {
            binding.resolved_imports.push(import);
        }
    }
    true
}
