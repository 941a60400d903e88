use anyhow::Result;
use coverage_report::app::{self, AppConfig, Args};
use tracing::debug;

fn main() -> Result<()> {
    let (args, ignored) = Args::parse_lenient(std::env::args_os());
    app::init_tracing(args.verbose);
    if !ignored.is_empty() {
        debug!(?ignored, "ignoring unrecognized arguments");
    }

    let config = AppConfig::from(args);
    app::run(&config)
}
