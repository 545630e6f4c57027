use std::{
    env,
    error::Error,
    fs,
    io::{self, IsTerminal as _},
    path::{Path, PathBuf},
    process,
};

use ansi_term::{ColorChoice, Palette};
use argh::FromArgs;
use deadlock::{
    BuildStateError, Outcome, ProgressEngine, SystemState,
    input::{self, InputFormatError, LoadStateError},
};
use snafu::ResultExt as _;
use snafu_utils::{GenericError, Located as _, Location, Report};

use self::{
    log::LogLevel,
    report::{AvailableTable, ProcessListing, ProgressPrinter, Summary},
};

#[macro_use]
mod log;
mod report;

/// Detect deadlocked processes in a snapshot of resource allocations and
/// requests.
#[derive(Debug, FromArgs)]
struct Args {
    /// file with the total instance count of each resource type
    #[argh(option, default = "PathBuf::from(\"resources.txt\")")]
    resources: PathBuf,
    /// file with the allocation matrix, one row per process
    #[argh(option, default = "PathBuf::from(\"allocations.txt\")")]
    allocations: PathBuf,
    /// file with the request matrix, one row per process
    #[argh(option, default = "PathBuf::from(\"requests.txt\")")]
    requests: PathBuf,
    /// when to color output: auto, always or never
    #[argh(option, default = "ColorChoice::Auto")]
    color: ColorChoice,
    /// least severe log level printed to stderr: trace, debug, info, warn,
    /// error or off
    #[argh(option, default = "LogLevel::Warn")]
    log_level: LogLevel,
    /// print only the running order and the deadlock verdict
    #[argh(switch, short = 'q')]
    quiet: bool,
    /// exit with status 2 if a deadlock is found
    #[argh(switch)]
    fail_on_deadlock: bool,
}

const EXIT_FAILURE: i32 = 1;
const EXIT_DEADLOCK: i32 = 2;

fn main() {
    let args: Args = argh::from_env();

    let no_color = env::var_os("NO_COLOR").is_some();
    let stdout_palette = Palette::new(
        args.color
            .should_colorize(io::stdout().is_terminal(), no_color),
    );
    let stderr_palette = Palette::new(
        args.color
            .should_colorize(io::stderr().is_terminal(), no_color),
    );
    log::init(args.log_level, stderr_palette);

    match run(&args, stdout_palette) {
        Ok(outcome) => {
            if args.fail_on_deadlock && !outcome.is_deadlock_free() {
                process::exit(EXIT_DEADLOCK);
            }
        }
        Err(err) => {
            let report = Report::new(err)
                .palette(stderr_palette)
                .locate_with(locate);
            eprintln!("{report}");
            process::exit(EXIT_FAILURE);
        }
    }
}

fn run(args: &Args, palette: Palette) -> Result<Outcome, GenericError> {
    let totals = read_input(&args.resources)?;
    let allocations = read_input(&args.allocations)?;
    let requests = read_input(&args.requests)?;

    let mut state = input::parse_state(&totals, &allocations, &requests)
        .whatever_context("failed to load resource snapshot")?;
    info!(
        "loaded snapshot: {} processes, {} resource types",
        state.process_count(),
        state.resource_count()
    );

    Ok(analyze(&mut state, palette, args.quiet))
}

fn read_input(path: &Path) -> Result<String, GenericError> {
    trace!("reading {}", path.display());
    fs::read_to_string(path)
        .with_whatever_context(|_| format!("failed to read input, path={}", path.display()))
}

fn analyze(state: &mut SystemState, palette: Palette, quiet: bool) -> Outcome {
    if !quiet {
        print!("{}", ProcessListing(state));
        println!("{}", AvailableTable(state));
    }

    let printer = ProgressPrinter::new(palette, quiet);
    let outcome = ProgressEngine::with_observer(state, printer).run();
    print!("{}", Summary(&outcome, palette));

    if !outcome.is_deadlock_free() {
        warn!("{} processes are deadlocked", outcome.deadlocked().len());
    }
    outcome
}

fn locate(err: &(dyn Error + 'static)) -> Option<Location> {
    if let Some(err) = err.downcast_ref::<GenericError>() {
        return Some(err.location());
    }
    if let Some(err) = err.downcast_ref::<LoadStateError>() {
        return Some(err.location());
    }
    if let Some(err) = err.downcast_ref::<InputFormatError>() {
        return Some(err.location());
    }
    if let Some(err) = err.downcast_ref::<BuildStateError>() {
        return Some(err.location());
    }
    None
}

#[cfg(test)]
mod tests {
    use snafu::ResultExt as _;

    use super::*;

    fn parse_args(args: &[&str]) -> Args {
        Args::from_args(&["deadlock-detect"], args).unwrap()
    }

    #[test]
    fn test_default_args() {
        let args = parse_args(&[]);
        assert_eq!(args.resources, Path::new("resources.txt"));
        assert_eq!(args.allocations, Path::new("allocations.txt"));
        assert_eq!(args.requests, Path::new("requests.txt"));
        assert_eq!(args.color, ColorChoice::Auto);
        assert_eq!(args.log_level, LogLevel::Warn);
        assert!(!args.quiet);
        assert!(!args.fail_on_deadlock);
    }

    #[test]
    fn test_args() {
        let args = parse_args(&[
            "--resources",
            "in/r.txt",
            "--color",
            "never",
            "--log-level",
            "debug",
            "-q",
            "--fail-on-deadlock",
        ]);
        assert_eq!(args.resources, Path::new("in/r.txt"));
        assert_eq!(args.color, ColorChoice::Never);
        assert_eq!(args.log_level, LogLevel::Debug);
        assert!(args.quiet);
        assert!(args.fail_on_deadlock);
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        assert!(Args::from_args(&["deadlock-detect"], &["--color", "rainbow"]).is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let path = Path::new("/nonexistent/deadlock-detect/resources.txt");
        let err = read_input(path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to read input, path=/nonexistent/deadlock-detect/resources.txt"
        );
    }

    #[test]
    fn test_report_locates_library_errors() {
        let err = input::parse_state("1 x", "0 0", "0 0")
            .whatever_context::<_, GenericError>("failed to load resource snapshot")
            .unwrap_err();
        let report = Report::new(err).locate_with(locate).to_string();
        let lines = report.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Error: failed to load resource snapshot");
        assert_eq!(lines[3], "Caused by:");
        assert_eq!(lines[4], "   0: malformed resource totals");
        assert!(lines[5].starts_with("      at "));
        assert_eq!(lines[6], "   1: invalid number at line 1: `x`");
        assert!(lines[7].starts_with("      at "));
    }

    #[test]
    fn test_analyze_quiet() {
        let mut state = input::parse_state("3", "1\n1", "2\n2").unwrap();
        let outcome = analyze(&mut state, Palette::PLAIN, true);
        assert!(outcome.is_deadlock_free());
        assert_eq!(outcome.completion_order().len(), 2);
    }
}
