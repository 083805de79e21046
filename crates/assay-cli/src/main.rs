use assay_cli::{command, run, ConsoleNotifier, Options};
use assay_core::init_tracing;

fn main() {
    // Initialize logging
    init_tracing();

    let matches = command().get_matches();
    let notifier = ConsoleNotifier::new();
    let code = match Options::from_matches(&matches).and_then(|options| run(&options, &notifier)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
