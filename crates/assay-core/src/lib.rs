//! # Assay Core
//!
//! Rewrite engine that turns Java `assert` statements and JUnit assertions
//! into fluent AssertJ assertions:
//! - AST and lexer/parser for the Java subset the rules care about
//! - Template compiler turning before/after fragments into rules
//! - Rule registry and recipes
//! - Matcher, rewriter and import bookkeeping
//! - Fixed-point driver, parallel file driver and a test harness
//!
//! ```
//! let recipe = assay_core::recipes::assert_to_assert_that::recipe().unwrap();
//! let output = assay_core::apply(&recipe, "class T { void t(Object o) { assert o != null; } }").unwrap();
//! assert!(output.contains("assertThat(o).isNotNull();"));
//! ```

#![warn(clippy::all)]

pub mod ast;
pub mod driver;
pub mod errors;
pub mod harness;
pub mod matcher;
pub mod parser;
pub mod recipes;
pub mod registry;
pub mod rewriter;
pub mod template;

// Re-export commonly used types
pub use ast::{ImportDecl, Node, NodeKind, PlaceholderKind, Span};
pub use driver::{
    apply, ApplyReport, CancellationToken, Driver, DriverConfig, FileDriver, FileDriverConfig,
    FileOutcome, FileStatus, RuleStats, RunSummary,
};
pub use errors::{Result, RewriteError};
pub use harness::{assert_rewrite, check_rewrite};
pub use matcher::{matches, Binding, Match, MatchContext};
pub use parser::SourceFile;
pub use registry::{Recipe, RecipeDescriptor, RuleRegistry};
pub use rewriter::{rewrite, ImportDelta, Rewrite};
pub use template::{compile, Fragment, ImportPolicy, Rule, RuleDescriptor, RuleMetadata, Symbol};

/// Assay version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for assay components, logging to stderr.
/// `RUST_LOG` overrides the default `assay_core=info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("assay_core=info"));
    // a subscriber installed earlier (by a test or an embedding binary) wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
