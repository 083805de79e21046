/*!
# Rewriter

Instantiates the after-pattern of a rule with the subtrees captured by a
match and works out the import edits the replacement needs.
*/

pub mod imports;

use crate::ast::{ImportDecl, Node, NodeKind, Origin};
use crate::errors::{Result, RewriteError};
use crate::matcher::Binding;
use crate::template::{ImportPolicy, Rule, Symbol};

use imports::ImportSet;

/// Import edits requested by one rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDelta {
    pub add: Vec<ImportDecl>,
    /// Imports the replaced code used; dropped by the driver once nothing
    /// in the file refers to their short name any more
    pub release: Vec<ImportDecl>,
}

impl ImportDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.release.is_empty()
    }

    pub fn merge(&mut self, other: ImportDelta) {
        for decl in other.add {
            if !self.add.contains(&decl) {
                self.add.push(decl);
            }
        }
        for decl in other.release {
            if !self.release.contains(&decl) {
                self.release.push(decl);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub node: Node,
    pub imports: ImportDelta,
}

/// Build the replacement for `target`, which `rule` matched with `binding`
pub fn rewrite(
    target: &Node,
    rule: &Rule,
    binding: &Binding,
    imports: &ImportSet,
) -> Result<Rewrite> {
    let mut node = rule.after.root.clone();
    substitute(&mut node, rule, binding)?;
    node.span = target.span;
    node.origin = Origin::Rewritten;
    unwrap_argument_parens(&mut node);

    let mut delta = ImportDelta::default();
    match rule.import_policy {
        ImportPolicy::NoChange => {}
        ImportPolicy::StaticImportAlways => {
            for symbol in &rule.after_symbols {
                let visible = if symbol.is_static {
                    imports.resolve_static(symbol).is_some()
                } else {
                    imports.resolve_type(&symbol.path).is_some()
                };
                if visible {
                    continue;
                }
                if imports.conflicts(symbol) {
                    qualify(&mut node, symbol);
                } else {
                    delta.add.push(symbol.import());
                }
            }
            delta.release = binding.resolved_imports.clone();
        }
        ImportPolicy::FullyQualifiedAlways => {
            for symbol in &rule.after_symbols {
                qualify(&mut node, symbol);
            }
        }
    }

    Ok(Rewrite {
        node,
        imports: delta,
    })
}

fn substitute(node: &mut Node, rule: &Rule, binding: &Binding) -> Result<()> {
    if let NodeKind::Placeholder(placeholder) = &node.kind {
        let captured = binding
            .get(&placeholder.name)
            .ok_or_else(|| RewriteError::invalid_binding(&rule.id, &placeholder.name))?;
        *node = captured.clone();
        return Ok(());
    }
    for child in node.children_mut() {
        substitute(child, rule, binding)?;
    }
    Ok(())
}

/// `assertThat((a == b))` reads better without the captured parentheses
fn unwrap_argument_parens(node: &mut Node) {
    if node.origin != Origin::Rewritten {
        return;
    }
    if let NodeKind::Call { args, .. } | NodeKind::New { args, .. } = &mut node.kind {
        for arg in args.iter_mut() {
            while let NodeKind::Paren { inner } = &mut arg.kind {
                let unwrapped = std::mem::replace(inner.as_mut(), Node::synthetic(NodeKind::Opaque));
                *arg = unwrapped;
            }
        }
    }
    for child in node.children_mut() {
        unwrap_argument_parens(child);
    }
}

/// Spell out `symbol` in full wherever the template introduced its short
/// name
fn qualify(node: &mut Node, symbol: &Symbol) {
    node.walk_mut(&mut |n| {
        if n.origin != Origin::Rewritten {
            return;
        }
        match &mut n.kind {
            NodeKind::Call {
                receiver: receiver @ None,
                name,
                ..
            } if symbol.is_static && name == symbol.short_name() => {
                *receiver = Some(Box::new(Node::qualified_name(symbol.owner())));
            }
            NodeKind::Reference { name } if !symbol.is_static && name == symbol.short_name() => {
                *n = Node::qualified_name(&symbol.path);
            }
            _ => {}
        }
    });
}
