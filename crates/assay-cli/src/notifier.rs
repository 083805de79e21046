//! Output notification for the command line front end
//!
//! Reports go through a [`Notifier`] so tests and embedding tools can
//! capture them instead of writing to the terminal.

pub trait Notifier: Send + Sync {
    /// Regular output: listings, summaries, JSON documents
    fn on_output(&self, content: &str);

    /// Per-file failures and warnings
    fn on_error(&self, content: &str);

    /// A unified diff produced by a dry run
    fn on_diff(&self, diff: &str);
}

/// Writes output and diffs to stdout, errors to stderr
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ConsoleNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{}", content);
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{}", content);
    }

    fn on_diff(&self, diff: &str) {
        print!("{}", diff);
    }
}
