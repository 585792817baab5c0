use std::io::BufRead;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use log::debug;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use backbone_tool::config::{Config, Verbosity};
use backbone_tool::engine::{Engine, Outcome};
use backbone_tool::oracle::Oracle;
use backbone_tool::report::Reporter;
use backbone_tool::solver::{dimacs, CdclSolver};
use backbone_tool::stats::Stats;

/// Determine the backbone literals of a satisfiable DIMACS CNF instance and
/// print them as `b` lines, followed by `b 0` and the solver status.
#[derive(Parser, Debug)]
#[command(name = "backbone-tool", version)]
struct Cli {
    /// Input CNF in DIMACS format (optionally gzipped); stdin when absent.
    #[arg(value_name = "DIMACS")]
    path: Option<PathBuf>,

    /// Check every backbone and every dropped candidate with a second oracle.
    #[arg(short, long)]
    check: bool,

    /// Extensive logging for debugging.
    #[arg(short, long)]
    logging: bool,

    /// Do not print the backbone `b` lines.
    #[arg(short = 'n', long = "no-print")]
    no_print: bool,

    /// Disable all messages.
    #[arg(short, long)]
    quiet: bool,

    /// Let the oracle report what it is doing.
    #[arg(short, long)]
    report: bool,

    /// Print the full statistics block even for empty time buckets.
    #[arg(short, long)]
    statistics: bool,

    /// Increase verbosity (may be repeated).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Do not drop candidates disagreeing with freshly found models.
    #[arg(long)]
    no_filter: bool,

    /// Do not use root-level fixed literals to resolve candidates.
    #[arg(long)]
    no_fixed: bool,

    /// Do not try to flip candidate literals in found models.
    #[arg(long)]
    no_flip: bool,

    /// Disable inprocessing in the oracle.
    #[arg(long)]
    no_inprocessing: bool,

    /// Refute candidates one at a time instead of constraining.
    #[arg(long)]
    one_by_one: bool,

    /// Bias oracle decision phases towards candidate negations.
    #[arg(long)]
    set_phase: bool,

    /// Disable all optimizations (like all `--no-*` and `--one-by-one`).
    #[arg(long)]
    plain: bool,
}

fn die(message: &str) -> ! {
    eprintln!("backbone-tool: error: {}", message);
    exit(1);
}

fn config_from_cli(cli: &Cli) -> Config {
    let verbosity = if cli.logging {
        Verbosity::Logging
    } else if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose > 0 {
        Verbosity::Verbose(cli.verbose)
    } else {
        Verbosity::Default
    };
    let config = Config {
        print: !cli.no_print,
        check: cli.check,
        no_filter: cli.no_filter,
        no_fixed: cli.no_fixed,
        no_flip: cli.no_flip,
        no_inprocessing: cli.no_inprocessing,
        one_by_one: cli.one_by_one,
        set_phase: cli.set_phase,
        report: cli.report,
        verbosity,
    };
    if cli.plain {
        config.plain()
    } else {
        config
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::try_parse().unwrap_or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{}", err);
            exit(0);
        }
        _ => {
            eprint!("{}", err);
            exit(1);
        }
    });
    debug!("cli = {:?}", cli);

    let config = config_from_cli(&cli);
    let stats = Stats::new();
    let reporter = Reporter::new(config.verbosity, config.print);

    let mut oracle = CdclSolver::new();
    if cli.no_flip && !oracle.has_flip() {
        die("'--no-flip' requires an oracle with flipping support");
    }

    reporter.msg(format_args!("Backbone Tool CNF Backbone Analyzer"));
    reporter.msg(format_args!(
        "Version {} using oracle {}",
        env!("CARGO_PKG_VERSION"),
        oracle.signature()
    ));
    reporter.line();

    // The handler thread only reads the atomic statistics snapshot; the
    // candidate table and the oracle stay untouched.
    {
        let stats = Arc::clone(&stats);
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        std::thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                reporter.msg(format_args!("caught signal {}", signal));
                stats.interrupt();
                reporter.statistics(&stats, false, None);
                exit(128 + signal);
            }
        });
    }

    if config.verbosity.is_quiet() {
        oracle.set_option("quiet", 1);
    } else if config.verbosity.level() > 1 {
        oracle.set_option("verbose", config.verbosity.level() as i32 - 1);
    }
    if config.report || config.verbosity.level() > 1 {
        oracle.set_option("report", 1);
    }
    if config.no_inprocessing {
        oracle.set_option("inprocessing", 0);
    }

    let vars = match &cli.path {
        Some(path) => {
            reporter.msg(format_args!("reading from '{}'", path.display()));
            let mut input = match dimacs::open_path(path) {
                Ok(input) => input,
                Err(err) => die(&format!("could not open '{}': {}", path.display(), err)),
            };
            let name = path.display().to_string();
            oracle.read_dimacs(&mut input, &name)
        }
        None => {
            reporter.msg(format_args!("reading from '<stdin>'"));
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            oracle.read_dimacs(&mut input as &mut dyn BufRead, "<stdin>")
        }
    };
    let vars = match vars {
        Ok(vars) => vars,
        Err(err) => die(&err.to_string()),
    };
    if vars == i32::MAX {
        die(&format!("can not support 'i32::MAX == {}' variables", vars));
    }
    reporter.msg(format_args!("found {} variables", vars));
    reporter.line();

    let mut engine = Engine::new(oracle, vars, config, Arc::clone(&stats), reporter);
    let outcome = match engine.run() {
        Ok(outcome) => outcome,
        Err(err) => die(&err.to_string()),
    };

    reporter.statistics(&stats, cli.statistics, Some(engine.oracle_counters()));

    match outcome {
        Outcome::Satisfiable => exit(10),
        Outcome::Unsatisfiable => exit(20),
    }
}
