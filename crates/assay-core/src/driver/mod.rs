/*!
# Driver

Applies a recipe to one source text until a full pass over its rules
changes nothing. Every rule application re-serialises and re-parses the
file, so later rules always match against fresh positions and a fresh
import set.
*/

pub mod file_driver;
pub mod stats;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::{Node, NodePath};
use crate::errors::{Result, RewriteError};
use crate::matcher::{matches, MatchContext};
use crate::parser::SourceFile;
use crate::registry::Recipe;
use crate::rewriter::imports::{insert_import, remove_import, ImportSet};
use crate::rewriter::{rewrite, ImportDelta};
use crate::template::Rule;

pub use file_driver::{FileDriver, FileDriverConfig, FileOutcome, RunSummary};
pub use stats::RuleStats;

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Cap on recipe passes that change the file
    pub max_iterations: usize,
    /// Pass unsupported constructs through instead of failing the file
    pub allow_unsupported: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 16,
            allow_unsupported: true,
        }
    }
}

impl DriverConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: DriverConfig =
            serde_json::from_str(json).context("Invalid driver configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("In {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_iterations == 0 {
            anyhow::bail!("max_iterations must be at least 1");
        }
        Ok(())
    }
}

/// Shared flag that stops a running driver between rewrites
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    Unparsed,
    Parsed,
    /// Tree edited since the last parse
    Dirty,
    /// A full recipe pass changed nothing
    Stable,
}

/// One file under rewrite: its latest text and, once parsed, its tree
#[derive(Debug)]
pub struct FileState {
    status: FileStatus,
    text: String,
    source: Option<SourceFile>,
}

impl FileState {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Unparsed,
            text: text.into(),
            source: None,
        }
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Text as of the last parse
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed file, re-parsing first when it is unparsed or dirty
    pub fn source_mut(&mut self) -> Result<&mut SourceFile> {
        let source = match (self.status, self.source.take()) {
            (FileStatus::Parsed | FileStatus::Stable, Some(source)) => source,
            (FileStatus::Dirty, Some(edited)) => {
                self.text = edited.print();
                SourceFile::parse(self.text.clone())?
            }
            _ => SourceFile::parse(self.text.clone())?,
        };
        if self.status != FileStatus::Stable {
            self.status = FileStatus::Parsed;
        }
        Ok(self.source.insert(source))
    }

    fn mark_dirty(&mut self) {
        self.status = FileStatus::Dirty;
    }

    /// Flush pending edits and freeze the file
    fn finish(&mut self) -> Result<()> {
        self.source_mut()?;
        self.status = FileStatus::Stable;
        Ok(())
    }
}

/// Result of applying a recipe to one source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub output: String,
    pub changed: bool,
    /// Recipe passes run, including the final unchanged one
    pub passes: usize,
    pub rewrites: usize,
    pub status: FileStatus,
}

/// Runs recipes over source texts, accumulating per-rule statistics
#[derive(Debug, Default)]
pub struct Driver {
    config: DriverConfig,
    cancel: CancellationToken,
    stats: IndexMap<String, RuleStats>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            stats: IndexMap::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn stats(&self) -> &IndexMap<String, RuleStats> {
        &self.stats
    }

    pub fn take_stats(&mut self) -> IndexMap<String, RuleStats> {
        std::mem::take(&mut self.stats)
    }

    /// Apply `recipe` to `source` until a fixed point. On error nothing of
    /// the partial rewrite escapes.
    pub fn apply(&mut self, recipe: &Recipe, source: &str) -> Result<ApplyReport> {
        let mut state = FileState::new(source);
        let parsed = state.source_mut()?;
        if !self.config.allow_unsupported {
            if let Some(construct) = parsed.unsupported().first() {
                return Err(construct.to_error());
            }
        }

        // `max_iterations` bounds the passes that change something; the
        // confirming pass after the last change is always run
        let mut iterations = 0;
        let mut passes = 0;
        let mut rewrites = 0;
        let mut converged = false;
        while iterations <= self.config.max_iterations {
            let changed = self.run_pass(recipe, &mut state, &mut rewrites)?;
            passes += 1;
            if !changed {
                converged = true;
                break;
            }
            iterations += 1;
        }

        if !converged {
            warn!(
                "Recipe {} did not converge after {} iterations",
                recipe.id(),
                iterations
            );
            return Err(RewriteError::NonConverging {
                recipe: recipe.id().to_string(),
                max_iterations: self.config.max_iterations,
            });
        }

        state.finish()?;
        let output = state.text().to_string();
        debug!(
            "Recipe {} reached a fixed point after {} passes ({} rewrites)",
            recipe.id(),
            passes,
            rewrites
        );
        Ok(ApplyReport {
            changed: output != source,
            output,
            passes,
            rewrites,
            status: state.status(),
        })
    }

    fn run_pass(
        &mut self,
        recipe: &Recipe,
        state: &mut FileState,
        rewrites: &mut usize,
    ) -> Result<bool> {
        let mut changed = false;
        for rule in recipe.rules() {
            self.check_cancelled()?;
            let start = Instant::now();
            let result = self.apply_rule(rule, state);
            let elapsed = start.elapsed().as_millis() as u64;

            let stats = self
                .stats
                .entry(rule.id.clone())
                .or_insert_with(|| RuleStats::new(rule.id.clone()));
            stats.total_time_ms += elapsed;
            match result {
                Ok(0) => {}
                Ok(count) => {
                    stats.applications += 1;
                    stats.transformations += count as u64;
                    *rewrites += count;
                    changed = true;
                }
                Err(e) => {
                    stats.errors += 1;
                    return Err(e);
                }
            }
        }
        Ok(changed)
    }

    /// Rewrite every match of `rule`, then fix up imports. Returns the
    /// number of rewrites.
    fn apply_rule(&self, rule: &Rule, state: &mut FileState) -> Result<usize> {
        let source = state.source_mut()?;
        let (replacements, delta) = self.plan(rule, source)?;
        if replacements.is_empty() {
            return Ok(0);
        }

        let count = replacements.len();
        let (root, text) = source.edit();
        for (path, node) in replacements {
            if let Some(slot) = root.node_at_mut(&path) {
                *slot = node;
            }
        }
        for decl in delta.add {
            insert_import(root, text, decl);
        }
        state.mark_dirty();
        debug!("Rule {} rewrote {} matches", rule.id, count);

        if !delta.release.is_empty() {
            let source = state.source_mut()?;
            let unused: Vec<_> = delta
                .release
                .into_iter()
                .filter(|decl| !decl.wildcard)
                .filter(|decl| {
                    decl.short_name()
                        .is_some_and(|name| source.reference_count(name) == 0)
                })
                .collect();
            let mut removed = false;
            for decl in &unused {
                if remove_import(source.root_mut(), decl) {
                    debug!("Rule {} dropped unused import {}", rule.id, decl);
                    removed = true;
                }
            }
            if removed {
                state.mark_dirty();
            }
        }
        Ok(count)
    }

    /// Replacement nodes for every match, deepest first, then leftmost
    fn plan(&self, rule: &Rule, source: &SourceFile) -> Result<(Vec<(NodePath, Node)>, ImportDelta)> {
        let imports = ImportSet::from_unit(source.root());
        let ctx = MatchContext {
            types: source.types(),
            imports: &imports,
            symbols: &rule.before_symbols,
        };
        let mut found = matches(source.root(), &rule.before, &ctx);
        found.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then(a.span.start.cmp(&b.span.start))
        });

        let mut replacements = Vec::with_capacity(found.len());
        let mut delta = ImportDelta::default();
        for m in &found {
            self.check_cancelled()?;
            let Some(target) = source.root().node_at(&m.path) else {
                continue;
            };
            let rewritten = rewrite(target, rule, &m.binding, &imports)?;
            delta.merge(rewritten.imports);
            replacements.push((m.path.clone(), rewritten.node));
        }
        Ok((replacements, delta))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(RewriteError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Apply `recipe` to `source` with the default configuration
pub fn apply(recipe: &Recipe, source: &str) -> Result<String> {
    Driver::default()
        .apply(recipe, source)
        .map(|report| report.output)
}
