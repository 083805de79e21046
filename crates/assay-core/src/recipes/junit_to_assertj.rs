//! JUnit Jupiter assertions to AssertJ
//!
//! Jupiter takes the expected value first and the message last:
//! `assertEquals(expected, actual, message)` becomes
//! `assertThat(actual).as(message).isEqualTo(expected)`. JUnit static
//! imports left without a use are removed.

use super::{ASSERT_THAT, JUNIT_TO_ASSERTJ};
use crate::errors::Result;
use crate::registry::{Recipe, RuleRegistry};
use crate::template::{Fragment, ImportPolicy, Rule};

const JUPITER_ASSERTIONS: &str = "org.junit.jupiter.api.Assertions";

/// (method, takes an expected value, AssertJ assertion)
const CONVERSIONS: &[(&str, bool, &str)] = &[
    ("assertNull", false, "isNull()"),
    ("assertNotNull", false, "isNotNull()"),
    ("assertTrue", false, "isTrue()"),
    ("assertFalse", false, "isFalse()"),
    ("assertEquals", true, "isEqualTo(expected)"),
    ("assertNotEquals", true, "isNotEqualTo(expected)"),
    ("assertSame", true, "isSameAs(expected)"),
    ("assertNotSame", true, "isNotSameAs(expected)"),
];

fn rule(method: &str, binary: bool, assertion: &str, with_message: bool) -> Result<Rule> {
    let mut params = Vec::new();
    let mut args = Vec::new();
    if binary {
        params.push("expected: AnyValue");
        args.push("expected");
    }
    params.push("actual: AnyValue");
    args.push("actual");
    if with_message {
        params.push("message: StringLiteralOrExpression");
        args.push("message");
    }
    let params = format!("({})", params.join(", "));
    let before = format!("{method}({});", args.join(", "));
    let after = if with_message {
        format!("assertThat(actual).as(message).{assertion};")
    } else {
        format!("assertThat(actual).{assertion};")
    };

    let rule_name = method.trim_start_matches("assert");
    let id = if with_message {
        format!("{JUNIT_TO_ASSERTJ}.{rule_name}WithMessage")
    } else {
        format!("{JUNIT_TO_ASSERTJ}.{rule_name}")
    };
    Rule::builder(id)
        .name(format!("Convert JUnit `{method}` to AssertJ"))
        .description(format!(
            "Convert `{}` to `{}` from AssertJ.",
            before.trim_end_matches(';'),
            after.trim_end_matches(';'),
        ))
        .before(Fragment::new(params.clone(), before))
        .after(Fragment::new(params, after))
        .import_policy(ImportPolicy::StaticImportAlways)
        .static_import(format!("{JUPITER_ASSERTIONS}.{method}"))
        .static_import(ASSERT_THAT)
        .build()
}

pub fn rules() -> Result<Vec<Rule>> {
    let mut rules = Vec::with_capacity(CONVERSIONS.len() * 2);
    for &(method, binary, assertion) in CONVERSIONS {
        rules.push(rule(method, binary, assertion, false)?);
        rules.push(rule(method, binary, assertion, true)?);
    }
    Ok(rules)
}

pub fn recipe() -> Result<Recipe> {
    let mut registry = RuleRegistry::new(
        JUNIT_TO_ASSERTJ,
        "JUnit to AssertJ",
        "Convert JUnit Jupiter assertions to AssertJ assertions.",
    );
    registry.register_all(rules()?)?;
    Ok(registry.recipe())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::driver::apply;
    use crate::harness::{assert_rewrite, assert_unchanged};

    const HEADER: &str = "package shop;\n\nimport static org.junit.jupiter.api.Assertions.assertEquals;\nimport static org.junit.jupiter.api.Assertions.assertTrue;\n\nimport org.junit.jupiter.api.Test;\n\n";

    #[test]
    fn test_rule_ids() {
        let recipe = recipe().unwrap();
        assert_eq!(recipe.len(), 16);
        assert_eq!(recipe.rules()[0].id, "assay.JUnitToAssertJ.Null");
        assert_eq!(recipe.rules()[9].id, "assay.JUnitToAssertJ.EqualsWithMessage");
    }

    #[test]
    fn test_arguments_are_reordered_and_imports_swapped() {
        let input = format!(
            "{HEADER}class OrderTest {{\n    @Test\n    void total(String label) {{\n        assertEquals(42, order.total(), label);\n        assertTrue(order.isPaid());\n    }}\n}}\n"
        );
        let expected = "package shop;\n\nimport static org.assertj.core.api.Assertions.assertThat;\n\nimport org.junit.jupiter.api.Test;\n\nclass OrderTest {\n    @Test\n    void total(String label) {\n        assertThat(order.total()).as(label).isEqualTo(42);\n        assertThat(order.isPaid()).isTrue();\n    }\n}\n";
        assert_rewrite(&recipe().unwrap(), &input, expected);
    }

    #[test]
    fn test_delta_argument_is_not_a_message() {
        let input = "import static org.junit.jupiter.api.Assertions.assertEquals;\n\nclass T {\n    void t() {\n        assertEquals(1.0, ratio(), 0.01);\n    }\n}\n";
        assert_unchanged(&recipe().unwrap(), input);
    }

    #[test]
    fn test_unrelated_assert_methods_are_ignored() {
        let input = "import static org.hamcrest.MatcherAssert.assertTrue;\n\nclass T {\n    void t() {\n        assertTrue(ok());\n    }\n}\n";
        assert_unchanged(&recipe().unwrap(), input);
    }

    #[test]
    fn test_qualified_calls_release_the_type_import() {
        let input = "import org.junit.jupiter.api.Assertions;\n\nclass T {\n    void t() {\n        Assertions.assertSame(a, b);\n        org.junit.jupiter.api.Assertions.assertNotNull(c);\n    }\n}\n";
        let output = apply(&recipe().unwrap(), input).unwrap();
        assert_eq!(
            output,
            "import static org.assertj.core.api.Assertions.assertThat;\n\nclass T {\n    void t() {\n        assertThat(b).isSameAs(a);\n        assertThat(c).isNotNull();\n    }\n}\n"
        );
    }
}
