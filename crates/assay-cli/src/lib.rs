//! Assay command line front end
//!
//! Argument parsing and the run loop behind the `assay` binary, kept in a
//! library so they can be driven from tests.

pub mod notifier;

use std::path::PathBuf;

use anyhow::{Context, Result};
use assay_core::recipes;
use assay_core::{
    DriverConfig, FileDriver, FileDriverConfig, FileOutcome, RecipeDescriptor, RunSummary,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

pub use notifier::{ConsoleNotifier, Notifier};

pub fn command() -> Command {
    Command::new("assay")
        .version(assay_core::VERSION)
        .about("Rewrite Java assert statements and JUnit assertions into AssertJ")
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .help("Files or directories to rewrite")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recipe")
                .short('r')
                .long("recipe")
                .value_name("ID")
                .help("Recipe, or single rule, to apply")
                .default_value(recipes::ASSERT_TO_ASSERT_THAT),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_name("N")
                .help("Cap on rewriting passes per file")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail files containing asserts outside the supported subset")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON driver configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print unified diffs instead of writing files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Worker threads (default: available parallelism)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Report per-rule statistics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-recipes")
                .long("list-recipes")
                .help("List the built-in recipes and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Machine readable output")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub paths: Vec<PathBuf>,
    pub recipe: String,
    pub driver: DriverConfig,
    pub dry_run: bool,
    pub jobs: Option<usize>,
    pub stats: bool,
    pub list_recipes: bool,
    pub json: bool,
}

impl Options {
    /// Options from parsed arguments; flags override the config file
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut driver = match matches.get_one::<PathBuf>("config") {
            Some(path) => DriverConfig::load(path)?,
            None => DriverConfig::default(),
        };
        if let Some(&max) = matches.get_one::<usize>("max-iterations") {
            driver.max_iterations = max;
        }
        if matches.get_flag("strict") {
            driver.allow_unsupported = false;
        }
        driver.validate()?;

        let mut paths: Vec<PathBuf> = matches
            .get_many::<PathBuf>("paths")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        if paths.is_empty() {
            paths.push(PathBuf::from("."));
        }

        Ok(Self {
            paths,
            recipe: matches
                .get_one::<String>("recipe")
                .cloned()
                .unwrap_or_else(|| recipes::ASSERT_TO_ASSERT_THAT.to_string()),
            driver,
            dry_run: matches.get_flag("dry-run"),
            jobs: matches.get_one::<usize>("jobs").copied(),
            stats: matches.get_flag("stats"),
            list_recipes: matches.get_flag("list-recipes"),
            json: matches.get_flag("json"),
        })
    }
}

/// Run the command; returns the process exit code
pub fn run(options: &Options, notifier: &dyn Notifier) -> Result<i32> {
    if options.list_recipes {
        return list_recipes(options, notifier);
    }

    let recipe = match recipes::find(&options.recipe) {
        Ok(Some(recipe)) => recipe,
        Ok(None) => anyhow::bail!("Unknown recipe '{}'; try --list-recipes", options.recipe),
        Err(e) => {
            notifier.on_error(&format!("Error: {e}"));
            return Ok(e.exit_code());
        }
    };
    debug!("Using recipe {} with {:?}", recipe.id(), options.driver);

    let mut config = FileDriverConfig {
        driver: options.driver.clone(),
        dry_run: options.dry_run,
        ..FileDriverConfig::default()
    };
    if let Some(jobs) = options.jobs {
        config.jobs = jobs;
    }
    let summary = FileDriver::new(recipe, config).run(&options.paths)?;

    if options.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        notifier.on_output(&json);
    } else {
        report(&summary, options, notifier);
    }
    Ok(summary.exit_code())
}

fn list_recipes(options: &Options, notifier: &dyn Notifier) -> Result<i32> {
    let catalog = match recipes::catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            notifier.on_error(&format!("Error: {e}"));
            return Ok(e.exit_code());
        }
    };
    let descriptors: Vec<RecipeDescriptor> = catalog.iter().map(|r| r.descriptor()).collect();
    if options.json {
        notifier.on_output(&serde_json::to_string_pretty(&descriptors)?);
        return Ok(0);
    }
    for recipe in descriptors {
        let mut text = format!("{} - {}\n    {}", recipe.id, recipe.name, recipe.description);
        for rule in &recipe.rules {
            text.push_str(&format!("\n    {}", rule.id));
        }
        notifier.on_output(&text);
    }
    Ok(0)
}

fn report(summary: &RunSummary, options: &Options, notifier: &dyn Notifier) {
    for file in &summary.files {
        match &file.outcome {
            FileOutcome::Unchanged => {}
            FileOutcome::Changed { diff: Some(diff), .. } => notifier.on_diff(diff),
            FileOutcome::Changed { rewrites, diff: None } => notifier.on_output(&format!(
                "Rewrote {} ({} rewrites)",
                file.path.display(),
                rewrites
            )),
            FileOutcome::Failed { error, .. } => {
                notifier.on_error(&format!("{}: {}", file.path.display(), error))
            }
        }
    }

    let verb = if options.dry_run { "would change" } else { "changed" };
    notifier.on_output(&format!(
        "{} files processed, {} {}, {} failed",
        summary.processed,
        summary.changed,
        verb,
        summary.failures().count()
    ));

    if options.stats {
        let mut text = String::from("rule                                                   applied  rewrites  errors  avg ms");
        for stats in summary.stats.values() {
            text.push_str(&format!(
                "\n{:<54} {:>8} {:>9} {:>7} {:>7.2}",
                stats.rule_name,
                stats.applications,
                stats.transformations,
                stats.errors,
                stats.average_time_ms()
            ));
        }
        notifier.on_output(&text);
    }
}
