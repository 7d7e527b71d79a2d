use std::process::ExitCode;

use clap::Parser;

use nonomaker::cli::{self, CliArgs};
use nonomaker::logger;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = args.load_settings();

    let level = match args.log_level.as_deref() {
        Some(name) => match logger::parse_level(name) {
            Some(level) => level,
            None => {
                eprintln!("error: unknown log level '{}'", name);
                return ExitCode::FAILURE;
            }
        },
        None => settings.log_level,
    };

    // Initialize session log (overwrites previous session log)
    logger::init(level, args.verbose);
    log::info!("nonomaker {} starting", env!("CARGO_PKG_VERSION"));
    if args.verbose
        && let Some(path) = logger::log_path()
    {
        eprintln!("log: {}", path.display());
    }

    cli::run(args, &settings)
}
