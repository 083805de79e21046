//! `assert` statements to AssertJ
//!
//! Each condition comes in two rules, without and with a message; the
//! message becomes an `.as(message)` description. Specific comparisons are
//! listed before the catch-all `IsTrue`.
//!
//! `==` compares values only when an operand is a primitive and identities
//! when both are references, so it maps to `isEqualTo` or `isSameAs`
//! depending on the declared types. A comparison of unknown types falls
//! through to `IsTrue` unchanged in meaning.

use super::{ASSERT_THAT, ASSERT_TO_ASSERT_THAT};
use crate::errors::Result;
use crate::registry::{Recipe, RuleRegistry};
use crate::template::{Fragment, ImportPolicy, Rule};

struct Conversion {
    id: &'static str,
    params: &'static str,
    condition: &'static str,
    assertion: &'static str,
}

const CONVERSIONS: &[Conversion] = &[
    Conversion {
        id: "IsNull",
        params: "actual: AnyValue",
        condition: "actual == null",
        assertion: "isNull()",
    },
    Conversion {
        id: "IsNotNull",
        params: "actual: AnyValue",
        condition: "actual != null",
        assertion: "isNotNull()",
    },
    Conversion {
        id: "IsNullReversed",
        params: "actual: AnyValue",
        condition: "null == actual",
        assertion: "isNull()",
    },
    Conversion {
        id: "IsNotNullReversed",
        params: "actual: AnyValue",
        condition: "null != actual",
        assertion: "isNotNull()",
    },
    Conversion {
        id: "IsEqualTo",
        params: "actual: AnyValue, expected: PrimitiveValue",
        condition: "actual == expected",
        assertion: "isEqualTo(expected)",
    },
    Conversion {
        id: "IsNotEqualTo",
        params: "actual: AnyValue, expected: PrimitiveValue",
        condition: "actual != expected",
        assertion: "isNotEqualTo(expected)",
    },
    Conversion {
        id: "IsSameAs",
        params: "actual: ObjectValue, expected: ObjectValue",
        condition: "actual == expected",
        assertion: "isSameAs(expected)",
    },
    Conversion {
        id: "IsNotSameAs",
        params: "actual: ObjectValue, expected: ObjectValue",
        condition: "actual != expected",
        assertion: "isNotSameAs(expected)",
    },
    Conversion {
        id: "IsEqualToEquals",
        params: "actual: AnyValue, expected: AnyValue",
        condition: "actual.equals(expected)",
        assertion: "isEqualTo(expected)",
    },
    Conversion {
        id: "IsNotEqualToEquals",
        params: "actual: AnyValue, expected: AnyValue",
        condition: "!actual.equals(expected)",
        assertion: "isNotEqualTo(expected)",
    },
    Conversion {
        id: "IsFalse",
        params: "actual: AnyValue",
        condition: "!actual",
        assertion: "isFalse()",
    },
    Conversion {
        id: "IsTrue",
        params: "actual: AnyValue",
        condition: "actual",
        assertion: "isTrue()",
    },
];

impl Conversion {
    fn rule(&self, with_message: bool) -> Result<Rule> {
        let (id, params, before, after) = if with_message {
            (
                format!("{ASSERT_TO_ASSERT_THAT}.{}WithMessage", self.id),
                format!("({}, message: StringLiteralOrExpression)", self.params),
                format!("assert {} : message;", self.condition),
                format!("assertThat(actual).as(message).{};", self.assertion),
            )
        } else {
            (
                format!("{ASSERT_TO_ASSERT_THAT}.{}", self.id),
                format!("({})", self.params),
                format!("assert {};", self.condition),
                format!("assertThat(actual).{};", self.assertion),
            )
        };
        let suffix = if with_message { " with a message" } else { "" };
        Rule::builder(id)
            .name(format!("Convert `assert {}`{suffix} to AssertJ", self.condition))
            .description(format!(
                "Convert `{}` statements to `{}` from AssertJ.",
                before.trim_end_matches(';'),
                after.trim_end_matches(';'),
            ))
            .before(Fragment::new(params.clone(), before))
            .after(Fragment::new(params, after))
            .import_policy(ImportPolicy::StaticImportAlways)
            .static_import(ASSERT_THAT)
            .build()
    }
}

pub fn rules() -> Result<Vec<Rule>> {
    let mut rules = Vec::with_capacity(CONVERSIONS.len() * 2);
    for conversion in CONVERSIONS {
        rules.push(conversion.rule(false)?);
        rules.push(conversion.rule(true)?);
    }
    Ok(rules)
}

pub fn recipe() -> Result<Recipe> {
    let mut registry = RuleRegistry::new(
        ASSERT_TO_ASSERT_THAT,
        "Assert to AssertJ",
        "Convert `assert` statements to AssertJ assertions.",
    );
    registry.register_all(rules()?)?;
    Ok(registry.recipe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{assert_rewrite, assert_unchanged};

    fn wrap(body: &str) -> String {
        format!("class T {{\n    void t(Object o, Object p, boolean b, String text, int n) {{\n        {body}\n    }}\n}}\n")
    }

    fn converted(body: &str) -> String {
        format!(
            "import static org.assertj.core.api.Assertions.assertThat;\n\n{}",
            wrap(body)
        )
    }

    #[test]
    fn test_rule_order() {
        let recipe = recipe().unwrap();
        let ids: Vec<&str> = recipe
            .rules()
            .iter()
            .map(|rule| rule.id.trim_start_matches("assay.AssertToAssertThat."))
            .collect();
        assert_eq!(
            ids,
            vec![
                "IsNull",
                "IsNullWithMessage",
                "IsNotNull",
                "IsNotNullWithMessage",
                "IsNullReversed",
                "IsNullReversedWithMessage",
                "IsNotNullReversed",
                "IsNotNullReversedWithMessage",
                "IsEqualTo",
                "IsEqualToWithMessage",
                "IsNotEqualTo",
                "IsNotEqualToWithMessage",
                "IsSameAs",
                "IsSameAsWithMessage",
                "IsNotSameAs",
                "IsNotSameAsWithMessage",
                "IsEqualToEquals",
                "IsEqualToEqualsWithMessage",
                "IsNotEqualToEquals",
                "IsNotEqualToEqualsWithMessage",
                "IsFalse",
                "IsFalseWithMessage",
                "IsTrue",
                "IsTrueWithMessage",
            ]
        );
    }

    #[test]
    fn test_each_condition() {
        let recipe = recipe().unwrap();
        let cases = [
            ("assert o == null;", "assertThat(o).isNull();"),
            ("assert o != null;", "assertThat(o).isNotNull();"),
            ("assert n == 3;", "assertThat(n).isEqualTo(3);"),
            ("assert n != 3;", "assertThat(n).isNotEqualTo(3);"),
            ("assert 3 == n;", "assertThat(3).isEqualTo(n);"),
            ("assert null == o;", "assertThat(o).isNull();"),
            ("assert null != o;", "assertThat(o).isNotNull();"),
            ("assert o == p;", "assertThat(o).isSameAs(p);"),
            ("assert o != text;", "assertThat(o).isNotSameAs(text);"),
            ("assert o == q;", "assertThat(o == q).isTrue();"),
            ("assert o.equals(p);", "assertThat(o).isEqualTo(p);"),
            ("assert !o.equals(p);", "assertThat(o).isNotEqualTo(p);"),
            ("assert !b;", "assertThat(b).isFalse();"),
            ("assert b;", "assertThat(b).isTrue();"),
            ("assert n > 0 && b;", "assertThat(n > 0 && b).isTrue();"),
            ("assert !(n < 0);", "assertThat(n < 0).isFalse();"),
        ];
        for (input, output) in cases {
            assert_rewrite(&recipe, &wrap(input), &converted(output));
        }
    }

    #[test]
    fn test_messages_become_descriptions() {
        let recipe = recipe().unwrap();
        assert_rewrite(
            &recipe,
            &wrap("assert o != null : \"o is set\";"),
            &converted("assertThat(o).as(\"o is set\").isNotNull();"),
        );
        assert_rewrite(
            &recipe,
            &wrap("assert b : text + n;"),
            &converted("assertThat(b).as(text + n).isTrue();"),
        );
    }

    #[test]
    fn test_identity_is_kept_for_references() {
        let recipe = recipe().unwrap();
        assert_rewrite(
            &recipe,
            &wrap("assert o == p : \"same instance\";"),
            &converted("assertThat(o).as(\"same instance\").isSameAs(p);"),
        );
        assert_rewrite(
            &recipe,
            &wrap("assert text.length() == n;"),
            &converted("assertThat(text.length()).isEqualTo(n);"),
        );
    }

    #[test]
    fn test_side_effecting_message_is_kept_verbatim() {
        let input = "class T {\n    void t(Object o) {\n        assert o == null : compute();\n    }\n\n    String compute() {\n        return \"\";\n    }\n}\n";
        let expected = "import static org.assertj.core.api.Assertions.assertThat;\n\nclass T {\n    void t(Object o) {\n        assertThat(o).as(compute()).isNull();\n    }\n\n    String compute() {\n        return \"\";\n    }\n}\n";
        assert_rewrite(&recipe().unwrap(), input, expected);
    }

    #[test]
    fn test_field_message_through_this() {
        let input = "class T {\n    void t(Object o) {\n        assert o == null : this.label;\n        assert o != null : this.count;\n    }\n\n    private final String label = \"t\";\n    private int count;\n}\n";
        let expected = "import static org.assertj.core.api.Assertions.assertThat;\n\nclass T {\n    void t(Object o) {\n        assertThat(o).as(this.label).isNull();\n        assert o != null : this.count;\n    }\n\n    private final String label = \"t\";\n    private int count;\n}\n";
        assert_rewrite(&recipe().unwrap(), input, expected);
    }

    #[test]
    fn test_non_string_message_is_left_alone() {
        assert_unchanged(&recipe().unwrap(), &wrap("assert o == null : n;"));
    }
}
