/*!
# Rule Templates

A rule is authored as two source-like fragments, each with a typed parameter
list naming its placeholders:

```text
before: (actual: AnyValue)  assert actual == null;
after:  (actual: AnyValue)  assertThat(actual).isNull();
```

Compiling the pair parses both fragments, turns every reference to a
declared parameter into a placeholder node and checks that the two sides
agree on names and kinds.
*/

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{last_segment, ImportDecl, Node, NodeKind, Origin, Placeholder, PlaceholderKind, Span};
use crate::errors::{Result, RewriteError};
use crate::parser::parse_fragment;


/// Raw template text: a parameter list and a fragment body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub params: String,
    pub body: String,
}

impl Fragment {
    pub fn new(params: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            params: params.into(),
            body: body.into(),
        }
    }
}

/// How the rewriter adjusts imports around a replacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportPolicy {
    #[default]
    NoChange,
    StaticImportAlways,
    FullyQualifiedAlways,
}

/// A fully qualified name a template refers to by its short name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub path: String,
    pub is_static: bool,
}

impl Symbol {
    pub fn static_member(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: true,
        }
    }

    pub fn type_name(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
        }
    }

    pub fn short_name(&self) -> &str {
        last_segment(&self.path)
    }

    /// Declaring type of a static member, the package of a type
    pub fn owner(&self) -> &str {
        self.path.rsplit_once('.').map(|(owner, _)| owner).unwrap_or("")
    }

    pub fn import(&self) -> ImportDecl {
        ImportDecl::single(self.path.clone(), self.is_static)
    }

    /// Whether `node` mentions this symbol by its short name
    fn appears_in(&self, node: &Node) -> bool {
        let mut found = false;
        node.walk(&mut |n| match &n.kind {
            NodeKind::Call {
                receiver: None,
                name,
                ..
            } if self.is_static => found |= name == self.short_name(),
            NodeKind::Reference { name } => found |= name == self.short_name(),
            _ => {}
        });
        found
    }
}

/// A compiled fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub text: String,
    pub root: Node,
    pub placeholders: IndexMap<String, PlaceholderKind>,
}

impl Pattern {
    pub fn is_statement(&self) -> bool {
        self.root.is_statement()
    }
}

/// Everything about a rule except its fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub import_policy: ImportPolicy,
    pub symbols: Vec<Symbol>,
}

/// An immutable before/after rewrite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub before: Pattern,
    pub after: Pattern,
    pub import_policy: ImportPolicy,
    /// Symbols named by the before fragment; calls to them only match when
    /// the input resolves to the same symbol
    pub before_symbols: Vec<Symbol>,
    /// Symbols the replacement needs imported or qualified
    pub after_symbols: Vec<Symbol>,
}

impl Rule {
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    pub fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            before: self.before.text.clone(),
            after: self.after.text.clone(),
            import_policy: self.import_policy,
        }
    }
}

/// Serializable summary of a rule for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub before: String,
    pub after: String,
    pub import_policy: ImportPolicy,
}

/// Builder for [`Rule`]; `build` runs [`compile`]
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    metadata: RuleMetadata,
    before: Option<Fragment>,
    after: Option<Fragment>,
}

impl RuleBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            metadata: RuleMetadata {
                id: id.into(),
                ..RuleMetadata::default()
            },
            before: None,
            after: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    pub fn before(mut self, fragment: Fragment) -> Self {
        self.before = Some(fragment);
        self
    }

    pub fn after(mut self, fragment: Fragment) -> Self {
        self.after = Some(fragment);
        self
    }

    pub fn import_policy(mut self, policy: ImportPolicy) -> Self {
        self.metadata.import_policy = policy;
        self
    }

    pub fn static_import(mut self, path: impl Into<String>) -> Self {
        self.metadata.symbols.push(Symbol::static_member(path));
        self
    }

    pub fn type_import(mut self, path: impl Into<String>) -> Self {
        self.metadata.symbols.push(Symbol::type_name(path));
        self
    }

    pub fn build(self) -> Result<Rule> {
        let id = self.metadata.id.clone();
        let before = self
            .before
            .ok_or_else(|| RewriteError::malformed(&id, "missing before fragment"))?;
        let after = self
            .after
            .ok_or_else(|| RewriteError::malformed(&id, "missing after fragment"))?;
        compile(&before, &after, self.metadata)
    }
}

/// Compile a before/after pair into a rule
pub fn compile(before: &Fragment, after: &Fragment, metadata: RuleMetadata) -> Result<Rule> {
    let id = metadata.id.as_str();
    if id.trim().is_empty() {
        return Err(RewriteError::malformed(id, "rule id is empty"));
    }
    if metadata.name.trim().is_empty() {
        return Err(RewriteError::malformed(id, "missing name"));
    }
    if metadata.description.trim().is_empty() {
        return Err(RewriteError::malformed(id, "missing description"));
    }
    for symbol in &metadata.symbols {
        if !symbol.path.contains('.') {
            return Err(RewriteError::malformed(
                id,
                format!("symbol '{}' is not fully qualified", symbol.path),
            ));
        }
    }

    let before = compile_fragment(id, "before", before)?;
    let after = compile_fragment(id, "after", after)?;

    for (name, kind) in &before.placeholders {
        match placeholder_uses(&before.root, name) {
            0 => {
                return Err(RewriteError::malformed(
                    id,
                    format!("placeholder '{name}' is declared but not used in before"),
                ))
            }
            1 => {}
            _ => {
                return Err(RewriteError::malformed(
                    id,
                    format!("placeholder '{name}' appears more than once in before"),
                ))
            }
        }
        if !after.placeholders.contains_key(name) && references(&after.root, name) {
            return Err(RewriteError::malformed(
                id,
                format!("'{name}' is used in after but not declared there ({kind})"),
            ));
        }
    }
    for (name, kind) in &after.placeholders {
        match before.placeholders.get(name) {
            None => {
                return Err(RewriteError::malformed(
                    id,
                    format!("placeholder '{name}' is not bound by before"),
                ))
            }
            Some(bound) if bound != kind => {
                return Err(RewriteError::malformed(
                    id,
                    format!("placeholder '{name}' is {bound} in before but {kind} in after"),
                ))
            }
            Some(_) => {}
        }
    }
    if before.is_statement() != after.is_statement() {
        return Err(RewriteError::malformed(
            id,
            "before and after must both be statements or both be expressions",
        ));
    }

    let (before_symbols, after_symbols) = metadata.symbols.iter().fold(
        (Vec::new(), Vec::new()),
        |(mut in_before, mut in_after), symbol| {
            if symbol.appears_in(&before.root) {
                in_before.push(symbol.clone());
            }
            if symbol.appears_in(&after.root) {
                in_after.push(symbol.clone());
            }
            (in_before, in_after)
        },
    );

    Ok(Rule {
        id: metadata.id,
        name: metadata.name,
        description: metadata.description,
        before,
        after,
        import_policy: metadata.import_policy,
        before_symbols,
        after_symbols,
    })
}

fn compile_fragment(rule: &str, side: &str, fragment: &Fragment) -> Result<Pattern> {
    let placeholders = parse_params(&fragment.params)
        .map_err(|reason| RewriteError::malformed(rule, format!("{side} parameters: {reason}")))?;
    let mut root = parse_fragment(&fragment.body)
        .map_err(|reason| RewriteError::malformed(rule, format!("invalid {side} fragment: {reason}")))?;
    if !root.is_statement() && !root.is_expression() {
        return Err(RewriteError::malformed(
            rule,
            format!("{side} fragment is neither a statement nor an expression"),
        ));
    }
    root.walk_mut(&mut |node| {
        if let NodeKind::Reference { name } = &node.kind {
            if let Some(kind) = placeholders.get(name) {
                node.kind = NodeKind::Placeholder(Placeholder {
                    name: name.clone(),
                    kind: *kind,
                });
            }
        }
        node.span = Span::default();
        node.origin = Origin::Rewritten;
    });
    Ok(Pattern {
        text: fragment.body.trim().to_string(),
        root,
        placeholders,
    })
}

/// `(name: Kind, ...)`
fn parse_params(text: &str) -> std::result::Result<IndexMap<String, PlaceholderKind>, String> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| format!("expected a parenthesized list, found '{text}'"))?;
    let mut params = IndexMap::new();
    for entry in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, kind) = entry
            .split_once(':')
            .ok_or_else(|| format!("expected 'name: Kind', found '{entry}'"))?;
        let name = name.trim();
        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid_name {
            return Err(format!("invalid placeholder name '{name}'"));
        }
        let kind: PlaceholderKind = kind.trim().parse()?;
        if params.insert(name.to_string(), kind).is_some() {
            return Err(format!("placeholder '{name}' is declared twice"));
        }
    }
    Ok(params)
}

fn placeholder_uses(root: &Node, name: &str) -> usize {
    root.placeholders().iter().filter(|p| p.name == name).count()
}

fn references(root: &Node, name: &str) -> bool {
    let mut found = false;
    root.walk(&mut |node| {
        if let NodeKind::Reference { name: referenced } = &node.kind {
            found |= referenced == name;
        }
    });
    found
}
