use std::{
    ffi::OsString,
    io::{self, Write},
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use tracing_subscriber::EnvFilter;

use crate::{
    config::ReportConfig,
    lcov,
    render::{self, RenderOptions},
};

/// Flags passed through to clap. Anything else on the command line is dropped.
const KNOWN_FLAGS: &[&str] = &[
    "--uncovered",
    "-v",
    "--verbose",
    "-h",
    "--help",
    "-V",
    "--version",
];

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "coverage_report",
    author,
    version,
    about = "Per-file coverage summary from ./lcov.info",
    long_about = None,
    args_override_self = true
)]
pub struct Args {
    /// Only show files whose path contains PATTERN
    #[arg(long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// With --filter, list uncovered line ranges for each file
    #[arg(long)]
    pub uncovered: bool,

    /// Print diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments, ignoring anything unrecognized.
    ///
    /// Returns the parsed arguments and the ignored ones. `--help` and
    /// `--version` print and exit as usual; any other parse error yields the
    /// defaults.
    pub fn parse_lenient<I, T>(raw: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let raw = raw.into_iter().map(|arg| {
            let arg: OsString = arg.into();
            arg.to_string_lossy().into_owned()
        });
        let (known, ignored) = split_known_args(raw);

        let args = match Args::try_parse_from(known) {
            Ok(args) => args,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayVersion
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                err.exit()
            }
            Err(_) => Args::default(),
        };

        (args, ignored)
    }
}

fn split_known_args(raw: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
    let mut raw = raw.into_iter();
    let mut known = Vec::new();
    let mut ignored = Vec::new();

    if let Some(bin) = raw.next() {
        known.push(bin);
    }

    while let Some(arg) = raw.next() {
        if arg == "--filter" {
            // Attach the value so patterns starting with '-' are not read as flags.
            match raw.next() {
                Some(pattern) => known.push(format!("--filter={pattern}")),
                None => ignored.push(arg),
            }
        } else if arg.starts_with("--filter=") || KNOWN_FLAGS.contains(&arg.as_str()) {
            known.push(arg);
        } else {
            ignored.push(arg);
        }
    }

    (known, ignored)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub report: ReportConfig,
    pub render: RenderOptions,
    pub verbose: bool,
}

impl AppConfig {
    /// Line detail is only parsed when it will be printed.
    pub fn collect_uncovered(&self) -> bool {
        self.render.filter.is_some() && self.render.show_uncovered
    }
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        // An empty pattern means no filter.
        let render = RenderOptions {
            filter: value.filter.filter(|pattern| !pattern.is_empty()),
            show_uncovered: value.uncovered,
            ..RenderOptions::default()
        };

        Self {
            report: ReportConfig::default(),
            render,
            verbose: value.verbose,
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(config: &AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(config, &mut out)
}

pub fn run_with_output<W: Write>(config: &AppConfig, out: &mut W) -> Result<()> {
    let records = lcov::read_report(&config.report, config.collect_uncovered())
        .context("Failed to load coverage report")?;

    render::render_report(out, &records, &config.render).context("Failed to write report")?;
    out.flush().context("Failed to flush report output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const REPORT: &str = concat!(
        "SF:/x/rain-tracker-service/src/a.c\n",
        "DA:1,0\n",
        "DA:2,3\n",
        "DA:3,0\n",
        "DA:4,0\n",
        "LF:4\n",
        "LH:1\n",
        "end_of_record\n",
        "SF:/x/rain-tracker-service/src/b.c\n",
        "LF:4\n",
        "LH:4\n",
        "end_of_record\n",
    );

    fn config_for(report_path: std::path::PathBuf, args: Args) -> AppConfig {
        let mut config = AppConfig::from(args);
        config.report = ReportConfig {
            report_path,
            project_root: "rain-tracker-service".to_string(),
            ..ReportConfig::default()
        };
        config
    }

    #[test]
    fn cli_args_defaults_then_use_expected_values() {
        let (args, ignored) = Args::parse_lenient(["coverage_report"]);

        assert_eq!(args, Args::default());
        assert!(ignored.is_empty());
    }

    #[test]
    fn parse_lenient__filter_and_uncovered__then_both_set() {
        let (args, _) = Args::parse_lenient([
            "coverage_report",
            "--filter",
            "importers",
            "--uncovered",
        ]);

        assert_eq!(args.filter.as_deref(), Some("importers"));
        assert!(args.uncovered);
        assert!(!args.verbose);
    }

    #[test]
    fn parse_lenient__unknown_arguments__then_ignored() {
        let (args, ignored) = Args::parse_lenient([
            "coverage_report",
            "--bogus",
            "stray",
            "--filter=db",
            "-x",
        ]);

        assert_eq!(args.filter.as_deref(), Some("db"));
        assert_eq!(ignored, ["--bogus", "stray", "-x"]);
    }

    #[test]
    fn parse_lenient__filter_without_value__then_ignored() {
        let (args, ignored) =
            Args::parse_lenient(["coverage_report", "--uncovered", "--filter"]);

        assert_eq!(args.filter, None);
        assert!(args.uncovered);
        assert_eq!(ignored, ["--filter"]);
    }

    #[test]
    fn parse_lenient__pattern_with_leading_dash__then_kept_as_value() {
        let (args, _) = Args::parse_lenient(["coverage_report", "--filter", "-worker"]);

        assert_eq!(args.filter.as_deref(), Some("-worker"));
    }

    #[test]
    fn parse_lenient__repeated_filter__then_last_wins() {
        let (args, _) =
            Args::parse_lenient(["coverage_report", "--filter", "a", "--filter", "b"]);

        assert_eq!(args.filter.as_deref(), Some("b"));
    }

    #[test]
    fn app_config__from_args__then_converts_all_fields() {
        let args = Args {
            filter: Some("services".to_string()),
            uncovered: true,
            verbose: true,
        };

        let config = AppConfig::from(args);

        assert_eq!(config.report, ReportConfig::default());
        assert_eq!(config.render.filter.as_deref(), Some("services"));
        assert!(config.render.show_uncovered);
        assert_eq!(config.render.table_limit, 20);
        assert_eq!(config.render.path_width, 60);
        assert!(config.verbose);
        assert!(config.collect_uncovered());
    }

    #[test]
    fn app_config__empty_filter__then_unfiltered_table() {
        let config = AppConfig::from(Args {
            filter: Some(String::new()),
            uncovered: true,
            verbose: false,
        });

        assert_eq!(config.render.filter, None);
        assert!(!config.collect_uncovered());
    }

    #[test]
    fn run_with_output__empty_filter__then_prints_lowest_coverage_table() {
        let dir = tempdir().expect("tempdir");
        let report_path = dir.path().join("lcov.info");
        fs::write(&report_path, REPORT).expect("write report");
        let config = config_for(
            report_path,
            Args {
                filter: Some(String::new()),
                ..Args::default()
            },
        );

        let mut out = Vec::new();
        run_with_output(&config, &mut out).expect("run");
        let output = String::from_utf8(out).expect("utf8");

        assert!(output.starts_with("Files with lowest coverage:\n\n"));
        assert!(!output.contains("FILES MATCHING"));
    }

    #[test]
    fn parse_lenient__empty_filter_value__then_parsed_as_empty_pattern() {
        let (args, ignored) = Args::parse_lenient(["coverage_report", "--filter", ""]);

        assert_eq!(args.filter.as_deref(), Some(""));
        assert!(ignored.is_empty());
    }

    #[test]
    fn app_config__uncovered_without_filter__then_skips_line_detail() {
        let config = AppConfig::from(Args {
            uncovered: true,
            ..Args::default()
        });

        assert!(!config.collect_uncovered());
    }

    #[test]
    fn run_with_output__no_filter__then_prints_sorted_table() {
        let dir = tempdir().expect("tempdir");
        let report_path = dir.path().join("lcov.info");
        fs::write(&report_path, REPORT).expect("write report");
        let config = config_for(report_path, Args::default());

        let mut out = Vec::new();
        run_with_output(&config, &mut out).expect("run");
        let output = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("src/a.c"));
        assert!(lines[2].contains("25.0%"));
        assert!(lines[3].starts_with("src/b.c"));
        assert!(lines[3].contains("100.0%"));
    }

    #[test]
    fn run_with_output__filter_with_uncovered__then_prints_ranges() {
        let dir = tempdir().expect("tempdir");
        let report_path = dir.path().join("lcov.info");
        fs::write(&report_path, REPORT).expect("write report");
        let config = config_for(
            report_path,
            Args {
                filter: Some("a.c".to_string()),
                uncovered: true,
                verbose: false,
            },
        );

        let mut out = Vec::new();
        run_with_output(&config, &mut out).expect("run");
        let output = String::from_utf8(out).expect("utf8");

        assert!(output.contains("FILES MATCHING 'a.c':"));
        assert!(output.contains("    Uncovered lines: 1, 3-4\n"));
        assert!(!output.contains("src/b.c"));
    }

    #[test]
    fn run_with_output__missing_report__then_returns_error() {
        let dir = tempdir().expect("tempdir");
        let config = config_for(dir.path().join("lcov.info"), Args::default());

        let mut out = Vec::new();
        let err = run_with_output(&config, &mut out).expect_err("missing report");

        assert!(format!("{err:#}").contains("lcov.info"));
        assert!(out.is_empty());
    }

    /// Direct unit test for init_tracing function coverage
    #[test]
    fn init_tracing__called_twice__then_second_call_is_noop() {
        init_tracing(false);
        init_tracing(true);
    }
}
