//! Applies a recipe to files and directory trees on a pool of worker
//! threads. Files are independent: a failing file is left untouched and
//! reported, the others carry on.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel as channel;
use indexmap::IndexMap;
use serde::Serialize;
use similar::TextDiff;
use tracing::{debug, info, warn};

use super::{CancellationToken, Driver, DriverConfig, RuleStats};
use crate::registry::Recipe;

/// Directories never descended into
pub const DEFAULT_IGNORES: &[&str] = &[".git", ".gradle", ".idea", "build", "node_modules", "out", "target"];

#[derive(Debug, Clone)]
pub struct FileDriverConfig {
    pub driver: DriverConfig,
    /// File extensions to rewrite, without the dot
    pub extensions: Vec<String>,
    pub jobs: usize,
    /// Produce diffs instead of writing files
    pub dry_run: bool,
}

impl Default for FileDriverConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            extensions: vec!["java".to_string()],
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Unchanged,
    Changed {
        rewrites: usize,
        /// Unified diff, in dry-run mode only
        diff: Option<String>,
    },
    Failed {
        error: String,
        exit_code: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub changed: usize,
    /// One entry per file, ordered by path
    pub files: Vec<FileResult>,
    pub stats: IndexMap<String, RuleStats>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Failed { .. }))
    }

    /// 0 when every file succeeded, otherwise the most severe code of any
    /// failure; specific codes outrank the generic 1
    pub fn exit_code(&self) -> i32 {
        self.failures()
            .filter_map(|file| match file.outcome {
                FileOutcome::Failed { exit_code, .. } => Some(exit_code),
                _ => None,
            })
            .max_by_key(|&code| if code == 1 { 0 } else { code })
            .unwrap_or(0)
    }

    pub fn diffs(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter_map(|file| match &file.outcome {
            FileOutcome::Changed {
                diff: Some(diff), ..
            } => Some(diff.as_str()),
            _ => None,
        })
    }
}

pub struct FileDriver {
    recipe: Recipe,
    config: FileDriverConfig,
    cancel: CancellationToken,
}

impl FileDriver {
    pub fn new(recipe: Recipe, config: FileDriverConfig) -> Self {
        Self {
            recipe,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Expand `paths` into the files to rewrite, sorted and deduplicated.
    /// Explicitly named files are taken whatever their extension.
    pub fn collect_files(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Cannot access {}", path.display()))?;
            if metadata.is_dir() {
                self.walk(path, &mut files)?;
            } else {
                files.push(path.clone());
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let ignored = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| DEFAULT_IGNORES.contains(&name));
                if !ignored {
                    self.walk(&path, files)?;
                }
            } else if file_type.is_file() && self.has_extension(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.extensions.iter().any(|e| e == ext))
    }

    /// Rewrite every file under `paths`
    pub fn run(&self, paths: &[PathBuf]) -> Result<RunSummary> {
        let files = self.collect_files(paths)?;
        let jobs = self.config.jobs.clamp(1, files.len().max(1));
        info!(
            "Applying {} to {} files with {} workers",
            self.recipe.id(),
            files.len(),
            jobs
        );

        let (work_tx, work_rx) = channel::unbounded::<PathBuf>();
        let (result_tx, result_rx) = channel::unbounded::<FileResult>();
        for file in &files {
            work_tx
                .send(file.clone())
                .map_err(|e| anyhow!("Work queue closed: {}", e))?;
        }
        drop(work_tx);

        let worker_stats = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..jobs)
                .map(|_| {
                    let work_rx = work_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        let mut driver = Driver::new(self.config.driver.clone())
                            .with_cancellation(self.cancel.clone());
                        for path in work_rx {
                            let outcome = self.process_file(&mut driver, &path);
                            if result_tx.send(FileResult { path, outcome }).is_err() {
                                break;
                            }
                        }
                        driver.take_stats()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| anyhow!("Worker thread panicked")))
                .collect::<Result<Vec<_>>>()
        })?;
        drop(result_tx);

        let mut summary = RunSummary::default();
        for stats in worker_stats {
            for (id, rule) in stats {
                summary
                    .stats
                    .entry(id)
                    .or_insert_with(|| RuleStats::new(rule.rule_name.clone()))
                    .merge(&rule);
            }
        }
        summary.files = result_rx.iter().collect();
        summary.files.sort_by(|a, b| a.path.cmp(&b.path));
        summary.processed = summary.files.len();
        summary.changed = summary
            .files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Changed { .. }))
            .count();
        info!(
            "Processed {} files, {} changed, {} failed",
            summary.processed,
            summary.changed,
            summary.failures().count()
        );
        Ok(summary)
    }

    /// Rewrite one file. The file is written only after the whole recipe
    /// succeeded.
    pub fn process_file(&self, driver: &mut Driver, path: &Path) -> FileOutcome {
        let original = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return FileOutcome::Failed {
                    error: format!("Failed to read {}: {}", path.display(), e),
                    exit_code: 1,
                };
            }
        };

        let report = match driver.apply(&self.recipe, &original) {
            Ok(report) => report,
            Err(e) => {
                warn!("Leaving {} unchanged: {}", path.display(), e);
                return FileOutcome::Failed {
                    error: e.to_string(),
                    exit_code: e.exit_code(),
                };
            }
        };

        if !report.changed {
            debug!("{} unchanged", path.display());
            return FileOutcome::Unchanged;
        }

        let diff = if self.config.dry_run {
            Some(unified_diff(path, &original, &report.output))
        } else {
            if let Err(e) = std::fs::write(path, &report.output) {
                warn!("Failed to write {}: {}", path.display(), e);
                return FileOutcome::Failed {
                    error: format!("Failed to write {}: {}", path.display(), e),
                    exit_code: 1,
                };
            }
            None
        };
        info!("Rewrote {} ({} rewrites)", path.display(), report.rewrites);
        FileOutcome::Changed {
            rewrites: report.rewrites,
            diff,
        }
    }
}

/// Unified diff of one file with three lines of context
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}
