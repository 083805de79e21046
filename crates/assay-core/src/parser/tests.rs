use pretty_assertions::assert_eq;

use super::*;
use crate::ast::{BinaryOp, ToSource};
use crate::errors::RewriteError;

const SAMPLE: &str = r#"package com.example.books;

import java.util.List;
import static org.junit.jupiter.api.Assertions.*;

// Checks on the catalogue
public class BookTest {
    private final List<Book> books = Catalogue.load();

    @Test
    void titlesAreSet(String expected) {
        for (Book book : books) {
            assert book.getTitle() != null : "title of " + book.getIsbn();
        }
        switch (books.size()) {
            case 0: assert books.isEmpty(); break;
            default: log.info("{} books", books.size());
        }
        Runnable r = () -> { assert expected.length() > 0; };
    }
}
"#;

fn assertions(file: &SourceFile) -> Vec<&Node> {
    let mut found = Vec::new();
    file.root().walk(&mut |node| {
        if matches!(node.kind, NodeKind::Assertion { .. }) {
            found.push(node);
        }
    });
    found
}

#[test]
fn test_untouched_file_prints_verbatim() {
    let file = SourceFile::parse(SAMPLE).unwrap();
    assert_eq!(file.print(), SAMPLE);
    assert!(file.root().spans_are_monotonic());
}

#[test]
fn test_statements_in_nested_blocks_are_parsed() {
    let file = SourceFile::parse(SAMPLE).unwrap();
    let found = assertions(&file);
    // the lambda body is a block outside any parentheses, so it is reached too
    assert_eq!(found.len(), 3);
    match &found[0].kind {
        NodeKind::Assertion { condition, message } => {
            assert_eq!(condition.to_source(), "book.getTitle() != null");
            assert_eq!(
                message.as_ref().map(|m| m.to_source()).as_deref(),
                Some("\"title of \" + book.getIsbn()")
            );
        }
        other => panic!("expected assertion, got {other:?}"),
    }
}

#[test]
fn test_package_and_imports() {
    let file = SourceFile::parse(SAMPLE).unwrap();
    assert_eq!(
        file.imports(),
        vec![
            ImportDecl::single("java.util.List", false),
            ImportDecl {
                path: "org.junit.jupiter.api.Assertions".to_string(),
                is_static: true,
                wildcard: true,
            },
        ]
    );
    let NodeKind::Unit { items } = &file.root().kind else {
        panic!("root is not a unit");
    };
    assert_eq!(
        items[0].kind,
        NodeKind::Package {
            name: "com.example.books".to_string()
        }
    );
}

#[test]
fn test_declared_types_are_scoped() {
    let source = "class A {\n  void t(String message, Object o) {\n    assert o == null : message;\n  }\n  void u(int message) { }\n}\n";
    let file = SourceFile::parse(source).unwrap();
    let inside = source.find("message;").unwrap();
    assert!(file.types().is_string("message", inside));
    let later = source.rfind("{ }").unwrap();
    assert!(!file.types().is_string("message", later + 1));
    assert_eq!(file.types().type_of("o", inside), Some("Object"));
}

#[test]
fn test_string_typed_expressions() {
    let source = "class A { void t(String s, int n) { f(s + n, n, s.trim(), n + 1, String.valueOf(n)); } }";
    let file = SourceFile::parse(source).unwrap();
    let mut calls = Vec::new();
    file.root().walk(&mut |node| {
        if let NodeKind::Call { name, args, .. } = &node.kind {
            if name == "f" {
                calls.extend(args.iter());
            }
        }
    });
    let typed: Vec<bool> = calls
        .iter()
        .map(|arg| file.types().is_string_expression(arg))
        .collect();
    assert_eq!(typed, vec![true, false, true, false, true]);
}

#[test]
fn test_unsupported_assert_is_kept_as_text() {
    let source = "class A { void t() { assert list.stream().anyMatch(x -> x > 0); } }";
    let file = SourceFile::parse(source).unwrap();
    assert_eq!(file.print(), source);
    assert!(assertions(&file).is_empty());
    let unsupported = &file.unsupported()[0];
    assert_eq!(unsupported.position.line, 1);
    assert!(matches!(
        unsupported.to_error(),
        RewriteError::Unsupported { .. }
    ));
}

fn conditions(file: &SourceFile) -> Vec<String> {
    assertions(file)
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Assertion { condition, .. } => Some(condition.to_source()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_braceless_bodies_reach_the_assert() {
    let source = "class A {\n  void t(Object o, boolean c, List<String> xs) {\n    if (c) assert o == null;\n    else assert o != null;\n    for (String x : xs) assert x != null : x;\n    do assert c; while (!c);\n  }\n}\n";
    let file = SourceFile::parse(source).unwrap();
    assert_eq!(file.print(), source);
    assert!(file.root().spans_are_monotonic());
    assert_eq!(
        conditions(&file),
        vec!["o == null", "o != null", "x != null", "c"]
    );
    assert!(file.unsupported().is_empty());

    let message = source.find(": x;").unwrap() + 2;
    assert!(file.types().is_string("x", message));
    assert_eq!(file.types().type_of("x", source.find("do assert").unwrap()), None);
}

#[test]
fn test_assert_inside_an_expression_is_unsupported() {
    let source = "class A { void t(List<Object> xs) { xs.forEach(x -> { assert x != null; }); } }";
    let file = SourceFile::parse(source).unwrap();
    assert_eq!(file.print(), source);
    assert!(assertions(&file).is_empty());
    assert_eq!(file.unsupported().len(), 1);
    assert_eq!(
        file.unsupported()[0].description,
        "assert statement inside an expression"
    );
    assert_eq!(file.unsupported()[0].position.column, 55);
}

#[test]
fn test_members_are_visible_in_the_whole_class() {
    let source = "class A {\n  void t() { check(label, this.label, describe()); }\n  String describe() { int label = 0; return \"\"; }\n  private String label;\n}\n";
    let file = SourceFile::parse(source).unwrap();
    let call = source.find("check(").unwrap();
    assert_eq!(file.types().type_of("label", call), Some("String"));
    assert_eq!(file.types().field_type("label", call), Some("String"));
    assert_eq!(file.types().return_type("describe", call), Some("String"));

    let local = source.find("return").unwrap();
    assert_eq!(file.types().type_of("label", local), Some("int"));
    assert_eq!(file.types().field_type("label", local), Some("String"));
}

#[test]
fn test_declarations_and_assignments_stay_opaque() {
    let source = "class A { void t() { int x = 1; x = 2; i++; foo(x); } }";
    let file = SourceFile::parse(source).unwrap();
    let mut statements = Vec::new();
    file.root().walk(&mut |node| {
        if let NodeKind::ExprStmt { expr } = &node.kind {
            statements.push(expr.to_source());
        }
    });
    assert_eq!(statements, vec!["foo(x)".to_string()]);
}

#[test]
fn test_structural_errors() {
    let cases = [
        ("class A {\n  void t() {\n", "unclosed '{'"),
        ("class A { }\n}", "unexpected '}'"),
        ("class A { void t() { foo(1)); } }", "unbalanced ')'"),
        ("class A { void t() { foo(1; } }", "unclosed '('"),
        ("class A { String s = \"abc; }", "unterminated string literal"),
    ];
    for (source, expected) in cases {
        match SourceFile::parse(source) {
            Err(RewriteError::Parse { message, .. }) => assert_eq!(message, expected),
            other => panic!("expected parse error for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_error_position() {
    let err = SourceFile::parse("class A {\n  void t() {\n    foo(1));\n  }\n}").unwrap_err();
    match err {
        RewriteError::Parse { position, .. } => {
            assert_eq!((position.line, position.column), (3, 11));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_reference_count_skips_import_declarations() {
    let source = "import static org.junit.Assert.assertTrue;\nclass A { void t() { assertTrue(x); /* assertTrue */ } }";
    let file = SourceFile::parse(source).unwrap();
    assert_eq!(file.reference_count("assertTrue"), 1);
    assert_eq!(file.reference_count("Assert"), 0);
    assert_eq!(file.reference_count("A"), 1);
}

#[test]
fn test_parse_fragment() {
    let statement = parse_fragment("assert actual == null : message;").unwrap();
    assert!(statement.is_statement());

    let expression = parse_fragment("a.equals(b)").unwrap();
    assert!(expression.is_expression());
    assert_eq!(expression.span, Span::new(0, 11));

    let precedence = parse_fragment("a + b * c == d").unwrap();
    match precedence.kind {
        NodeKind::Binary { op, left, .. } => {
            assert_eq!(op, BinaryOp::Equal);
            assert_eq!(left.to_source(), "a + b * c");
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(parse_fragment("").is_err());
    assert!(parse_fragment("a b").is_err());
    assert!(parse_fragment("(String) x").is_err());
}
