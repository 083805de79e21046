//! Built-in recipes
//!
//! | id | converts |
//! |----|----------|
//! | `assay.AssertToAssertThat` | `assert` statements |
//! | `assay.JUnitToAssertJ` | JUnit Jupiter `Assertions` calls |
//! | `assay.all` | both, JUnit first |

pub mod assert_to_assert_that;
pub mod junit_to_assertj;

use crate::errors::Result;
use crate::registry::{Recipe, RuleRegistry};

pub const ASSERT_TO_ASSERT_THAT: &str = "assay.AssertToAssertThat";
pub const JUNIT_TO_ASSERTJ: &str = "assay.JUnitToAssertJ";
pub const ALL: &str = "assay.all";

pub(crate) const ASSERT_THAT: &str = "org.assertj.core.api.Assertions.assertThat";

/// Every built-in recipe, in listing order
pub fn catalog() -> Result<Vec<Recipe>> {
    let assert = assert_to_assert_that::recipe()?;
    let junit = junit_to_assertj::recipe()?;
    let mut all = RuleRegistry::new(
        ALL,
        "All AssertJ migrations",
        "Convert JUnit assertions and `assert` statements to AssertJ.",
    );
    all.register_recipe(&junit)?;
    all.register_recipe(&assert)?;
    Ok(vec![assert, junit, all.recipe()])
}

/// Look up a built-in recipe, or a single rule of one by its id
pub fn find(id: &str) -> Result<Option<Recipe>> {
    let catalog = catalog()?;
    if let Some(recipe) = catalog.iter().find(|recipe| recipe.id() == id) {
        return Ok(Some(recipe.clone()));
    }
    Ok(catalog.iter().find_map(|recipe| recipe.only(id)))
}
