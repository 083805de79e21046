//! Before/after test harness for recipes

use similar::TextDiff;

use crate::driver::{Driver, DriverConfig};
use crate::errors::RewriteError;
use crate::registry::Recipe;

#[derive(Debug)]
pub enum HarnessFailure {
    Error(RewriteError),
    /// Output differs from the expectation; carries a unified diff
    Mismatch(String),
    /// A second application changed the output again
    NotIdempotent(String),
}

impl std::fmt::Display for HarnessFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessFailure::Error(e) => write!(f, "rewrite failed: {e}"),
            HarnessFailure::Mismatch(diff) => write!(f, "unexpected rewrite output:\n{diff}"),
            HarnessFailure::NotIdempotent(diff) => {
                write!(f, "second application changed the output:\n{diff}")
            }
        }
    }
}

/// Apply `recipe` to `input` and compare with `expected` byte for byte,
/// then check that applying it again is a no-op
pub fn check_rewrite(recipe: &Recipe, input: &str, expected: &str) -> Result<(), HarnessFailure> {
    let mut driver = Driver::new(DriverConfig::default());
    let output = driver
        .apply(recipe, input)
        .map_err(HarnessFailure::Error)?
        .output;
    if output != expected {
        return Err(HarnessFailure::Mismatch(diff("expected", expected, "actual", &output)));
    }
    let again = driver
        .apply(recipe, &output)
        .map_err(HarnessFailure::Error)?
        .output;
    if again != output {
        return Err(HarnessFailure::NotIdempotent(diff("first", &output, "second", &again)));
    }
    Ok(())
}

/// Panicking form of [`check_rewrite`] for tests
#[track_caller]
pub fn assert_rewrite(recipe: &Recipe, input: &str, expected: &str) {
    if let Err(failure) = check_rewrite(recipe, input, expected) {
        panic!("{} ({})\n{}", recipe.id(), recipe.name(), failure);
    }
}

/// Assert that `recipe` leaves `input` untouched
#[track_caller]
pub fn assert_unchanged(recipe: &Recipe, input: &str) {
    assert_rewrite(recipe, input, input);
}

fn diff(old_name: &str, old: &str, new_name: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(old_name, new_name)
        .to_string()
}
