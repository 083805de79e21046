/*!
# File Driver Integration Tests

Rewrites of directory trees on disk.
*/

use std::fs;
use std::path::{Path, PathBuf};

use assay_core::recipes::assert_to_assert_that;
use assay_core::{CancellationToken, FileDriver, FileDriverConfig, FileOutcome, RunSummary};
use tempfile::TempDir;

const CONVERTIBLE: &str = "class A {\n    void t(Object o) {\n        assert o != null;\n    }\n}\n";
const CONVERTED: &str = "import static org.assertj.core.api.Assertions.assertThat;\n\nclass A {\n    void t(Object o) {\n        assertThat(o).isNotNull();\n    }\n}\n";
const PLAIN: &str = "class B {\n    void t() {\n        run();\n    }\n}\n";
const BROKEN: &str = "class Broken {\n    void t() {\n        assert o != null;\n";

fn project() -> anyhow::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src/main/java/shop");
    fs::create_dir_all(&src)?;
    fs::write(src.join("A.java"), CONVERTIBLE)?;
    fs::write(src.join("B.java"), PLAIN)?;
    fs::write(src.join("Broken.java"), BROKEN)?;
    fs::write(src.join("notes.txt"), CONVERTIBLE)?;
    let target = dir.path().join("target/generated");
    fs::create_dir_all(&target)?;
    fs::write(target.join("Generated.java"), CONVERTIBLE)?;
    Ok(dir)
}

fn driver(jobs: usize, dry_run: bool) -> anyhow::Result<FileDriver> {
    Ok(FileDriver::new(
        assert_to_assert_that::recipe()?,
        FileDriverConfig {
            jobs,
            dry_run,
            ..FileDriverConfig::default()
        },
    ))
}

fn outcome<'a>(summary: &'a RunSummary, name: &str) -> &'a FileOutcome {
    summary
        .files
        .iter()
        .find(|file| file.path.ends_with(name))
        .map(|file| &file.outcome)
        .unwrap_or_else(|| panic!("{name} was not processed"))
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join("src/main/java/shop").join(name)).unwrap()
}

#[test]
fn test_collects_java_files_outside_build_output() -> anyhow::Result<()> {
    let dir = project()?;
    let files = driver(1, true)?.collect_files(&[dir.path().to_path_buf()])?;
    let names: Vec<&str> = files
        .iter()
        .filter_map(|path| path.file_name()?.to_str())
        .collect();
    assert_eq!(names, vec!["A.java", "B.java", "Broken.java"]);
    Ok(())
}

#[test]
fn test_rewrites_in_place() -> anyhow::Result<()> {
    let dir = project()?;
    let summary = driver(4, false)?.run(&[dir.path().to_path_buf()])?;

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.changed, 1);
    assert_eq!(read(dir.path(), "A.java"), CONVERTED);
    assert_eq!(read(dir.path(), "B.java"), PLAIN);
    assert_eq!(read(dir.path(), "Broken.java"), BROKEN);
    assert!(matches!(
        outcome(&summary, "A.java"),
        FileOutcome::Changed { rewrites: 1, diff: None }
    ));
    assert_eq!(outcome(&summary, "B.java"), &FileOutcome::Unchanged);

    let failures: Vec<_> = summary.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].path.ends_with("Broken.java"));
    assert_eq!(summary.exit_code(), 1);

    assert_eq!(summary.stats["assay.AssertToAssertThat.IsNotNull"].transformations, 1);
    Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> anyhow::Result<()> {
    let dir = project()?;
    let summary = driver(2, true)?.run(&[dir.path().to_path_buf()])?;

    assert_eq!(summary.changed, 1);
    assert_eq!(read(dir.path(), "A.java"), CONVERTIBLE);
    let diffs: Vec<&str> = summary.diffs().collect();
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].contains("+import static org.assertj.core.api.Assertions.assertThat;\n"));
    assert!(diffs[0].contains("-        assert o != null;\n+        assertThat(o).isNotNull();\n"));
    Ok(())
}

#[test]
fn test_worker_count_does_not_change_results() -> anyhow::Result<()> {
    let first = project()?;
    let second = project()?;
    let serial = driver(1, true)?.run(&[first.path().to_path_buf()])?;
    let parallel = driver(8, true)?.run(&[second.path().to_path_buf()])?;
    let strip = |summary: &RunSummary| -> Vec<(PathBuf, bool)> {
        summary
            .files
            .iter()
            .map(|file| {
                (
                    file.path.file_name().map(PathBuf::from).unwrap_or_default(),
                    matches!(file.outcome, FileOutcome::Changed { .. }),
                )
            })
            .collect()
    };
    assert_eq!(strip(&serial), strip(&parallel));
    Ok(())
}

#[test]
fn test_named_file_and_missing_path() -> anyhow::Result<()> {
    let dir = project()?;
    let notes = dir.path().join("src/main/java/shop/notes.txt");
    let summary = driver(1, true)?.run(&[notes])?;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.changed, 1);

    let missing = driver(1, true)?.run(&[dir.path().join("missing")]);
    assert!(missing.is_err());
    Ok(())
}

#[test]
fn test_cancelled_run_leaves_files_untouched() -> anyhow::Result<()> {
    let dir = project()?;
    let token = CancellationToken::new();
    token.cancel();
    let summary = driver(2, false)?
        .with_cancellation(token)
        .run(&[dir.path().to_path_buf()])?;
    assert_eq!(read(dir.path(), "A.java"), CONVERTIBLE);
    assert_eq!(summary.changed, 0);
    assert!(summary.failures().count() >= 1);
    Ok(())
}
