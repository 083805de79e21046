// Import declarations of a file: resolution of short names, placement of new
// imports and removal of unused ones.

use crate::ast::{ImportDecl, Node, NodeKind, Origin, Span};
use crate::template::Symbol;

/// Live imports of one file, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    imports: Vec<ImportDecl>,
}

impl ImportSet {
    pub fn from_unit(root: &Node) -> Self {
        let imports = match &root.kind {
            NodeKind::Unit { items } => items
                .iter()
                .filter(|item| item.origin != Origin::Removed)
                .filter_map(|item| match &item.kind {
                    NodeKind::Import(import) => Some(import.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { imports }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportDecl> {
        self.imports.iter()
    }

    pub fn contains(&self, decl: &ImportDecl) -> bool {
        self.imports.contains(decl)
    }

    /// The import through which `symbol`, a static member, is visible by
    /// its short name
    pub fn resolve_static(&self, symbol: &Symbol) -> Option<&ImportDecl> {
        let explicit = self
            .imports
            .iter()
            .find(|i| i.is_static && !i.wildcard && i.path == symbol.path);
        explicit.or_else(|| {
            self.imports
                .iter()
                .find(|i| i.is_static && i.wildcard && i.path == symbol.owner())
        })
    }

    /// The import through which the type `type_path` is visible by its
    /// simple name
    pub fn resolve_type(&self, type_path: &str) -> Option<&ImportDecl> {
        let package = type_path.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
        let explicit = self
            .imports
            .iter()
            .find(|i| !i.is_static && !i.wildcard && i.path == type_path);
        explicit.or_else(|| {
            self.imports
                .iter()
                .find(|i| !i.is_static && i.wildcard && i.path == package)
        })
    }

    /// Whether an explicit import already claims the short name of `symbol`
    /// for something else
    pub fn conflicts(&self, symbol: &Symbol) -> bool {
        self.imports.iter().any(|i| {
            !i.wildcard
                && i.is_static == symbol.is_static
                && i.short_name() == Some(symbol.short_name())
                && i.path != symbol.path
        })
    }

    /// Number of explicit imports that bind `name`
    pub fn resolution_count(&self, name: &str) -> usize {
        self.imports
            .iter()
            .filter(|i| i.short_name() == Some(name))
            .count()
    }
}

/// Add `decl` to the file unless it is already imported. Static imports go
/// after the last static import, type imports after the last type import;
/// a first import goes after the package declaration, or at the head below
/// any leading header comments. `text` is the source `root` was parsed from.
pub fn insert_import(root: &mut Node, text: &str, decl: ImportDecl) -> bool {
    let NodeKind::Unit { items } = &mut root.kind else {
        return false;
    };
    let (index, lead, mut trail, anchor) = {
        let live = |item: &&Node| item.origin != Origin::Removed;
        if items
            .iter()
            .filter(live)
            .any(|item| matches!(&item.kind, NodeKind::Import(existing) if *existing == decl))
        {
            return false;
        }
        let last_import = |flavour: Option<bool>| {
            items.iter().rposition(|item| {
                item.origin != Origin::Removed
                    && matches!(&item.kind, NodeKind::Import(i) if flavour.map_or(true, |s| i.is_static == s))
            })
        };
        let package = items
            .iter()
            .position(|item| matches!(item.kind, NodeKind::Package { .. }));
        let same_flavour = last_import(Some(decl.is_static));
        let any_import = if decl.is_static { last_import(None) } else { None };
        match (same_flavour, any_import, package) {
            (Some(i), _, _) => (i + 1, "\n", "", Span::default()),
            (None, Some(i), _) => (i + 1, "\n\n", "", Span::default()),
            (None, None, Some(i)) => (i + 1, "\n\n", "", Span::default()),
            (None, None, None) => {
                let first = items
                    .iter()
                    .find(|item| item.origin == Origin::Source)
                    .map_or(text.len(), |item| item.span.start);
                match header_end(text.get(..first).unwrap_or("")) {
                    Some(end) => {
                        let rest = &text[end..first];
                        let blank = rest.len() - rest.trim_start().len();
                        (0, "\n\n", "\n\n", Span::new(end, end + blank))
                    }
                    None => (0, "", "\n\n", Span::default()),
                }
            }
        }
    };

    // an inserted predecessor hands its trailing separator to the new item
    if let Some(previous) = index.checked_sub(1).and_then(|i| items.get_mut(i)) {
        if let Origin::Inserted {
            lead: previous_lead,
            trail: previous_trail,
        } = previous.origin
        {
            if !previous_trail.is_empty() {
                previous.origin = Origin::Inserted {
                    lead: previous_lead,
                    trail: "",
                };
                trail = previous_trail;
            }
        }
    }

    items.insert(
        index,
        Node {
            kind: NodeKind::Import(decl),
            span: anchor,
            origin: Origin::Inserted { lead, trail },
        },
    );
    true
}

/// End of the comments opening `head`, up to the first Javadoc comment,
/// which belongs to the declaration below it
fn header_end(head: &str) -> Option<usize> {
    let mut end = None;
    let mut offset = 0;
    loop {
        let rest = &head[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.starts_with("//") {
            offset += trimmed.find('\n').unwrap_or(trimmed.len());
        } else if trimmed.starts_with("/*") {
            if trimmed.starts_with("/**") && !trimmed.starts_with("/**/") {
                return end;
            }
            offset += trimmed[2..].find("*/").map_or(trimmed.len(), |close| close + 4);
        } else {
            return end;
        }
        end = Some(offset);
    }
}

/// Mark the explicit import `decl` as removed
pub fn remove_import(root: &mut Node, decl: &ImportDecl) -> bool {
    let NodeKind::Unit { items } = &mut root.kind else {
        return false;
    };
    match items.iter_mut().find(|item| {
        item.origin != Origin::Removed && matches!(&item.kind, NodeKind::Import(i) if i == decl)
    }) {
        Some(item) => {
            item.origin = Origin::Removed;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::SourceFile;

    const ASSERT_THAT: &str = "org.assertj.core.api.Assertions.assertThat";

    fn with_imports(source: &str, decls: &[ImportDecl]) -> String {
        let mut file = SourceFile::parse(source).unwrap();
        for decl in decls {
            let (root, text) = file.edit();
            insert_import(root, text, decl.clone());
        }
        file.print()
    }

    #[test]
    fn test_static_import_placement() {
        let assert_that = ImportDecl::single(ASSERT_THAT, true);
        let cases = [
            ("class A {}\n", "import static org.assertj.core.api.Assertions.assertThat;\n\nclass A {}\n"),
            (
                "package p;\n\nclass A {}\n",
                "package p;\n\nimport static org.assertj.core.api.Assertions.assertThat;\n\nclass A {}\n",
            ),
            (
                "package p;\n\nimport java.util.List;\n\nclass A {}\n",
                "package p;\n\nimport java.util.List;\n\nimport static org.assertj.core.api.Assertions.assertThat;\n\nclass A {}\n",
            ),
            (
                "import static a.B.c;\nimport java.util.List;\n\nclass A {}\n",
                "import static a.B.c;\nimport static org.assertj.core.api.Assertions.assertThat;\nimport java.util.List;\n\nclass A {}\n",
            ),
        ];
        for (source, expected) in cases {
            assert_eq!(with_imports(source, &[assert_that.clone()]), expected);
        }
    }

    #[test]
    fn test_first_import_goes_below_header_comments() {
        let assert_that = ImportDecl::single(ASSERT_THAT, true);
        let cases = [
            (
                "/* License */\nclass A {}\n",
                "/* License */\n\nimport static org.assertj.core.api.Assertions.assertThat;\n\nclass A {}\n",
            ),
            (
                "// Copyright\n// Licensed under MIT\n\n/** Docs for A. */\nclass A {}\n",
                "// Copyright\n// Licensed under MIT\n\nimport static org.assertj.core.api.Assertions.assertThat;\n\n/** Docs for A. */\nclass A {}\n",
            ),
            (
                "/** Docs for A. */\nclass A {}\n",
                "import static org.assertj.core.api.Assertions.assertThat;\n\n/** Docs for A. */\nclass A {}\n",
            ),
        ];
        for (source, expected) in cases {
            assert_eq!(with_imports(source, &[assert_that.clone()]), expected);
        }

        let printed = with_imports(
            "/* License */\nclass A {}\n",
            &[assert_that, ImportDecl::single("org.assertj.core.api.Assertions.fail", true)],
        );
        assert_eq!(
            printed,
            "/* License */\n\nimport static org.assertj.core.api.Assertions.assertThat;\nimport static org.assertj.core.api.Assertions.fail;\n\nclass A {}\n"
        );
    }

    #[test]
    fn test_type_import_goes_before_static_block() {
        let source = "package p;\n\nimport static a.B.c;\n\nclass A {}\n";
        let printed = with_imports(source, &[ImportDecl::single("org.assertj.core.api.Assertions", false)]);
        assert_eq!(
            printed,
            "package p;\n\nimport org.assertj.core.api.Assertions;\n\nimport static a.B.c;\n\nclass A {}\n"
        );
    }

    #[test]
    fn test_consecutive_insertions_share_one_block() {
        let printed = with_imports(
            "class A {}\n",
            &[
                ImportDecl::single(ASSERT_THAT, true),
                ImportDecl::single("org.assertj.core.api.Assertions.fail", true),
                ImportDecl::single(ASSERT_THAT, true),
            ],
        );
        assert_eq!(
            printed,
            "import static org.assertj.core.api.Assertions.assertThat;\nimport static org.assertj.core.api.Assertions.fail;\n\nclass A {}\n"
        );
    }

    #[test]
    fn test_resolution() {
        let file = SourceFile::parse(
            "import static org.junit.jupiter.api.Assertions.*;\nimport org.assertj.core.api.*;\nimport static a.Other.assertThat;\nclass A {}",
        )
        .unwrap();
        let imports = ImportSet::from_unit(file.root());
        let assert_true = Symbol::static_member("org.junit.jupiter.api.Assertions.assertTrue");
        assert!(imports.resolve_static(&assert_true).unwrap().wildcard);
        assert!(imports
            .resolve_type("org.assertj.core.api.Assertions")
            .is_some());
        assert!(imports.resolve_type("org.junit.Assert").is_none());
        assert!(imports.conflicts(&Symbol::static_member(ASSERT_THAT)));
        assert!(!imports.conflicts(&assert_true));
        assert_eq!(imports.resolution_count("assertThat"), 1);
    }

    #[test]
    fn test_remove_import() {
        let mut file =
            SourceFile::parse("import static a.B.c;\nimport java.util.List;\n\nclass A {}\n").unwrap();
        assert!(remove_import(file.root_mut(), &ImportDecl::single("a.B.c", true)));
        assert!(!remove_import(file.root_mut(), &ImportDecl::single("a.B.c", true)));
        assert_eq!(file.print(), "import java.util.List;\n\nclass A {}\n");
        assert_eq!(ImportSet::from_unit(file.root()).iter().count(), 1);
    }
}
