use std::fmt;
use std::io::Write;

use crate::config::Verbosity;
use crate::oracle::OracleCounters;
use crate::stats::Stats;

/// All protocol output: `c` comment lines, streamed `b` lines, the final
/// status line and the statistics block. Everything goes to stdout and is
/// flushed eagerly so partial output survives interruption.
#[derive(Debug, Copy, Clone)]
pub struct Reporter {
    verbosity: Verbosity,
    print: bool,
}

fn percent(a: f64, b: f64) -> f64 {
    if b != 0.0 {
        100.0 * a / b
    } else {
        0.0
    }
}

impl Reporter {
    pub fn new(verbosity: Verbosity, print: bool) -> Self {
        Self { verbosity, print }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn msg(&self, args: fmt::Arguments) {
        if self.verbosity.is_quiet() {
            return;
        }
        println!("c {}", args);
        let _ = std::io::stdout().flush();
    }

    pub fn line(&self) {
        if self.verbosity.is_quiet() {
            return;
        }
        println!("c");
        let _ = std::io::stdout().flush();
    }

    pub fn dbg(&self, args: fmt::Arguments) {
        if !self.verbosity.is_logging() {
            return;
        }
        println!("c LOGGING {}", args);
        let _ = std::io::stdout().flush();
    }

    pub fn backbone(&self, lit: i32) {
        if !self.print {
            return;
        }
        println!("b {}", lit);
        let _ = std::io::stdout().flush();
    }

    pub fn terminator(&self) {
        if !self.print {
            return;
        }
        println!("b 0");
        let _ = std::io::stdout().flush();
    }

    pub fn status(&self, satisfiable: bool) {
        if satisfiable {
            println!("s SATISFIABLE");
        } else {
            println!("s UNSATISFIABLE");
        }
        let _ = std::io::stdout().flush();
    }

    /// Render the statistics block. Zero-valued profiling buckets are
    /// omitted unless `force` or a verbose level asks for all of them.
    pub fn statistics(&self, stats: &Stats, force: bool, oracle: Option<OracleCounters>) {
        if self.verbosity.is_quiet() {
            return;
        }
        let verbose = force || self.verbosity.level() > 0;
        let out = std::io::stdout();
        let mut out = out.lock();

        let _ = writeln!(out, "c");
        let _ = writeln!(
            out,
            "c --- [ backbone statistics ] ------------------------------------------------"
        );
        let _ = writeln!(out, "c");
        let _ = writeln!(out, "c found {} backbones", stats.count(&stats.backbones));
        let _ = writeln!(
            out,
            "c dropped {} candidates ({} filtered, {} flipped, {} fixed)",
            stats.count(&stats.dropped),
            stats.count(&stats.filtered),
            stats.count(&stats.flipped),
            stats.count(&stats.fixed),
        );
        if verbose || stats.count(&stats.checked) > 0 {
            let _ = writeln!(out, "c checked {} literals", stats.count(&stats.checked));
        }
        let _ = writeln!(
            out,
            "c called SAT solver {} times ({} SAT, {} UNSAT)",
            stats.count(&stats.calls),
            stats.count(&stats.sat_calls),
            stats.count(&stats.unsat_calls),
        );
        let _ = writeln!(out, "c");
        let _ = writeln!(
            out,
            "c --- [ backbone profiling ] -------------------------------------------------"
        );
        let _ = writeln!(out, "c");

        let solving = stats.seconds(&stats.solving_time);
        let buckets = [
            ("first", stats.seconds(&stats.first_time)),
            ("sat", stats.seconds(&stats.sat_time)),
            ("satmax", stats.seconds(&stats.sat_max_time)),
            ("unsat", stats.seconds(&stats.unsat_time)),
            ("unsatmax", stats.seconds(&stats.unsat_max_time)),
            ("flip", stats.seconds(&stats.flip_time)),
            ("check", stats.seconds(&stats.check_time)),
            ("unknown", stats.seconds(&stats.unknown_time)),
        ];
        for (name, seconds) in buckets {
            if verbose || seconds > 0.0 {
                let _ = writeln!(out, "c   {:10.2} {:6.2} % {}", seconds, percent(seconds, solving), name);
            }
        }
        let _ = writeln!(out, "c ---------------------------------");
        let _ = writeln!(out, "c   {:10.2} 100.00 % solving", solving);
        let _ = writeln!(out, "c");

        if let Some(counters) = oracle {
            if self.verbosity.level() > 0 {
                let _ = writeln!(out, "c oracle: {} conflicts, {} decisions, {} propagations", counters.conflicts, counters.decisions, counters.propagations);
                let _ = writeln!(out, "c");
            }
        }

        let _ = out.flush();
    }
}
