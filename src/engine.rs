use std::sync::Arc;

use snafu::{ensure, Snafu};

use crate::candidates::CandidateTable;
use crate::config::Config;
use crate::oracle::{FixedResponse, LitValue, Oracle, OracleError, SolveResponse};
use crate::report::Reporter;
use crate::stats::{Bucket, Stats, Timer};
use crate::verify::Verifier;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum EngineError {
    #[snafu(display("{source}"), context(false))]
    Oracle { source: OracleError },

    #[snafu(display("check failed: '{}' confirmed as backbone but a model satisfies '{}'", lit, -lit))]
    CheckConfirmed { lit: i32 },

    #[snafu(display("check failed: '{}' refuted but no model satisfies '{}'", lit, -lit))]
    CheckRefuted { lit: i32 },

    #[snafu(display("checked {checked} literals but expected {expected}"))]
    CheckIncomplete { checked: u64, expected: u64 },

    #[snafu(display("solver was interrupted"))]
    Interrupted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfiable,
    Unsatisfiable,
}

/// Why a candidate left the table; only used for statistics attribution.
#[derive(Debug, Copy, Clone)]
enum DropCause {
    /// Refuted directly by the model of the driving solve.
    Model,
    Filtered,
    Flipped,
    Fixed,
}

#[derive(Debug, Copy, Clone)]
enum ConfirmCause {
    Solved,
    Fixed,
}

/// The backbone extraction driver.
///
/// Iterates the variables in ascending order and refines the candidate set
/// through single-assumption and `constrain` queries, routing every model
/// through the filter and the flipper and every candidate through the
/// root-level `fixed` shortcut first.
pub struct Engine<O: Oracle> {
    oracle: O,
    verifier: Option<Verifier<O>>,
    table: CandidateTable,
    vars: i32,
    config: Config,
    stats: Arc<Stats>,
    timer: Timer,
    reporter: Reporter,
    /// Result of the most recent solve; the constrain branch is only taken
    /// while the previous query came back unsatisfiable.
    last: SolveResponse,
    constrain_buffer: Vec<i32>,
    /// First variable whose resolution has not been emitted yet. Backbones
    /// are printed strictly in ascending order, so a variable confirmed
    /// ahead of the loop position is held back until the gap closes.
    emit_frontier: i32,
}

impl<O: Oracle> Engine<O> {
    pub fn new(oracle: O, vars: i32, config: Config, stats: Arc<Stats>, reporter: Reporter) -> Self {
        let timer = Timer::new(Arc::clone(&stats));
        Self {
            oracle,
            verifier: None,
            table: CandidateTable::from_model(0, |_| true),
            vars,
            config,
            stats,
            timer,
            reporter,
            last: SolveResponse::Sat,
            constrain_buffer: Vec::new(),
            emit_frontier: 1,
        }
    }

    pub fn run(&mut self) -> Result<Outcome> {
        self.reporter
            .msg(format_args!("starting solving after {:.2} seconds", self.stats.process_time()));
        let response = self.solve()?;
        if response == SolveResponse::Unsat {
            self.reporter.status(false);
            return Ok(Outcome::Unsatisfiable);
        }
        self.reporter.msg(format_args!(
            "solver determined first model after {:.2} seconds",
            self.stats.process_time()
        ));
        self.reporter.line();

        let vars = self.vars;
        let mut model = Vec::with_capacity(vars as usize);
        for i in 1..=vars {
            model.push(self.oracle.val(i)? == LitValue::True);
        }
        self.table = CandidateTable::from_model(vars, |i| model[i as usize - 1]);

        if self.config.check {
            self.reporter.dbg(format_args!("forking verifier oracle"));
            self.verifier = Some(Verifier::new(self.oracle.copy()));
        }

        self.flip_candidates(1)?;
        self.last = SolveResponse::Sat;

        'outer: for i in 1..=vars {
            if self.table.is_resolved(i) {
                self.reporter.dbg(format_args!("skipping resolved variable {}", i));
                continue;
            }
            loop {
                let lit = self.table.lit(i);
                if lit == 0 {
                    break;
                }
                if self.config.set_phase {
                    self.oracle.phase(-lit);
                }
                if self.fixate(i)? {
                    break;
                }

                if !self.config.one_by_one && self.last == SolveResponse::Unsat {
                    self.constrain_buffer.clear();
                    self.constrain_buffer.push(-lit);
                    for other in (i + 1)..=vars {
                        if self.table.is_resolved(other) {
                            continue;
                        }
                        if self.fixate(other)? {
                            continue;
                        }
                        self.constrain_buffer.push(-self.table.lit(other));
                    }
                    let assumed = self.constrain_buffer.len();
                    if assumed > 1 {
                        self.reporter
                            .dbg(format_args!("constraining {} remaining candidate negations", assumed));
                        let buffer = std::mem::take(&mut self.constrain_buffer);
                        for &negation in &buffer {
                            self.oracle.constrain(negation);
                        }
                        self.oracle.constrain(0);
                        self.constrain_buffer = buffer;

                        let response = self.solve()?;
                        self.last = response;
                        if response == SolveResponse::Unsat {
                            // No model falsifies any remaining candidate:
                            // all of them are backbones.
                            for j in i..=vars {
                                if !self.table.is_resolved(j) {
                                    self.confirm(j, ConfirmCause::Solved)?;
                                }
                            }
                            break 'outer;
                        }
                        let first = self.drop_first_candidate(i)?;
                        self.filter(first + 1)?;
                        self.flip_candidates(i)?;
                        continue;
                    }
                    // Everything else got resolved while assembling the
                    // constraint; fall through to the single assumption.
                }

                self.oracle.assume(-lit)?;
                let response = self.solve()?;
                self.last = response;
                match response {
                    SolveResponse::Unsat => {
                        self.confirm(i, ConfirmCause::Solved)?;
                        break;
                    }
                    _ => {
                        // The model satisfies the assumed negation.
                        self.drop(i, DropCause::Model)?;
                        self.filter(i + 1)?;
                        self.flip_candidates(i + 1)?;
                        break;
                    }
                }
            }
        }

        debug_assert_eq!(self.table.remaining(), 0);
        self.emit_ready();
        if self.verifier.is_some() {
            let checked = self.stats.count(&self.stats.checked);
            ensure!(
                checked == vars as u64,
                CheckIncompleteSnafu {
                    checked,
                    expected: vars as u64
                }
            );
        }
        self.reporter.terminator();
        self.reporter.line();
        self.reporter.status(true);
        Ok(Outcome::Satisfiable)
    }

    /// Timed solve with call accounting.
    fn solve(&mut self) -> Result<SolveResponse> {
        self.stats.solve_started();
        match self.oracle.solve() {
            Ok(SolveResponse::Interrupted) => {
                self.stats.solve_finished(SolveResponse::Interrupted);
                InterruptedSnafu.fail()
            }
            Ok(response) => {
                self.stats.solve_finished(response);
                Ok(response)
            }
            Err(source) => {
                self.stats.interrupt();
                Err(source.into())
            }
        }
    }

    /// Resolve candidate `i` through the oracle's root-level knowledge.
    fn fixate(&mut self, i: i32) -> Result<bool> {
        if self.config.no_fixed {
            return Ok(false);
        }
        let lit = self.table.lit(i);
        debug_assert_ne!(lit, 0);
        match self.oracle.fixed(lit)? {
            FixedResponse::Implied => {
                self.reporter.dbg(format_args!("root-level fixed backbone {}", lit));
                self.confirm(i, ConfirmCause::Fixed)?;
                Ok(true)
            }
            FixedResponse::Negation => {
                self.reporter.dbg(format_args!("root-level fixed negation of candidate {}", lit));
                self.drop(i, DropCause::Fixed)?;
                Ok(true)
            }
            FixedResponse::Unclear => Ok(false),
        }
    }

    /// Drop every candidate from `start` on whose polarity the current model
    /// disagrees with.
    fn filter(&mut self, start: i32) -> Result<()> {
        if self.config.no_filter {
            return Ok(());
        }
        for j in start..=self.vars {
            let lit = self.table.lit(j);
            if lit == 0 {
                continue;
            }
            if self.oracle.val(lit)? == LitValue::False {
                self.drop(j, DropCause::Filtered)?;
            }
        }
        Ok(())
    }

    /// Rounds of in-model flipping over the candidates from `start` on,
    /// until a full pass drops nothing.
    fn flip_candidates(&mut self, start: i32) -> Result<()> {
        if self.config.no_flip || !self.oracle.has_flip() {
            return Ok(());
        }
        self.timer.start(Bucket::Flip);
        loop {
            let mut dropped_any = false;
            for j in start..=self.vars {
                let lit = self.table.lit(j);
                if lit == 0 {
                    continue;
                }
                if self.oracle.flip(lit)? {
                    self.reporter.dbg(format_args!("flipped candidate {}", lit));
                    self.drop(j, DropCause::Flipped)?;
                    dropped_any = true;
                }
            }
            if !dropped_any {
                break;
            }
        }
        self.timer.stop();
        Ok(())
    }

    /// The smallest candidate index at or after `start` refuted by the
    /// current model; the constraint clause guarantees one exists.
    fn drop_first_candidate(&mut self, start: i32) -> Result<i32> {
        for j in start..=self.vars {
            let lit = self.table.lit(j);
            if lit != 0 && self.oracle.val(lit)? == LitValue::False {
                self.drop(j, DropCause::Model)?;
                return Ok(j);
            }
        }
        unreachable!("the constrained model refutes at least one candidate")
    }

    fn drop(&mut self, i: i32, cause: DropCause) -> Result<()> {
        let lit = self.table.drop(i);
        self.stats.bump(&self.stats.dropped);
        match cause {
            DropCause::Model => {}
            DropCause::Filtered => self.stats.bump(&self.stats.filtered),
            DropCause::Flipped => self.stats.bump(&self.stats.flipped),
            DropCause::Fixed => self.stats.bump(&self.stats.fixed),
        }
        if self.config.set_phase {
            self.oracle.unphase(i);
        }
        if let Some(mut verifier) = self.verifier.take() {
            self.timer.start(Bucket::Check);
            let passed = verifier.check_refuted(lit)?;
            self.timer.stop();
            self.verifier = Some(verifier);
            self.stats.bump(&self.stats.checked);
            ensure!(passed, CheckRefutedSnafu { lit });
        }
        self.emit_ready();
        Ok(())
    }

    fn confirm(&mut self, i: i32, cause: ConfirmCause) -> Result<()> {
        let lit = self.table.confirm(i);
        self.stats.bump(&self.stats.backbones);
        if let ConfirmCause::Fixed = cause {
            self.stats.bump(&self.stats.fixed);
        }
        if self.config.set_phase {
            self.oracle.unphase(i);
        }
        if let Some(mut verifier) = self.verifier.take() {
            self.timer.start(Bucket::Check);
            let passed = verifier.check_confirmed(lit)?;
            self.timer.stop();
            self.verifier = Some(verifier);
            self.stats.bump(&self.stats.checked);
            ensure!(passed, CheckConfirmedSnafu { lit });
        }
        self.emit_ready();
        Ok(())
    }

    /// Emit confirmed backbones in ascending variable order: a backbone is
    /// only printed once every smaller variable is resolved as well.
    fn emit_ready(&mut self) {
        while self.emit_frontier <= self.vars && self.table.is_resolved(self.emit_frontier) {
            let lit = self.table.backbone(self.emit_frontier);
            if lit != 0 {
                self.reporter.backbone(lit);
            }
            self.emit_frontier += 1;
        }
    }

    /// Confirmed backbone literals in ascending variable order.
    pub fn backbones(&self) -> Vec<i32> {
        self.table.backbones()
    }

    pub fn oracle_counters(&self) -> crate::oracle::OracleCounters {
        self.oracle.counters()
    }

    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }
}

impl<O: Oracle> std::fmt::Debug for Engine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("vars", &self.vars)
            .field("remaining", &self.table.remaining())
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Verbosity, DEFAULT_CONFIG};
    use crate::solver::CdclSolver;
    use std::io::Cursor;

    fn run_engine(dimacs: &str, config: Config) -> (Option<Vec<i32>>, Arc<Stats>) {
        let mut oracle = CdclSolver::new();
        let vars = oracle.read_dimacs(&mut Cursor::new(dimacs), "<test>").unwrap();
        let stats = Stats::new();
        let reporter = Reporter::new(Verbosity::Quiet, false);
        let mut engine = Engine::new(oracle, vars, config, Arc::clone(&stats), reporter);
        match engine.run().unwrap() {
            Outcome::Satisfiable => (Some(engine.backbones()), stats),
            Outcome::Unsatisfiable => (None, stats),
        }
    }

    #[test]
    fn forced_units_are_backbones() {
        let (backbones, stats) = run_engine("p cnf 2 2\n1 0\n-2 0\n", DEFAULT_CONFIG);
        assert_eq!(backbones.unwrap(), vec![1, -2]);
        assert_eq!(stats.count(&stats.backbones), 2);
        assert_eq!(stats.count(&stats.dropped), 0);
    }

    #[test]
    fn free_variables_are_dropped() {
        let (backbones, stats) = run_engine("p cnf 2 1\n1 2 0\n", DEFAULT_CONFIG);
        assert_eq!(backbones.unwrap(), Vec::<i32>::new());
        assert_eq!(stats.count(&stats.backbones), 0);
        assert_eq!(stats.count(&stats.dropped), 2);
    }

    #[test]
    fn unsat_input_reports_unsatisfiable() {
        let (backbones, _) = run_engine("p cnf 1 2\n1 0\n-1 0\n", DEFAULT_CONFIG);
        assert!(backbones.is_none());
    }

    #[test]
    fn hidden_backbone_is_found() {
        // 3 is forced transitively; 1 and 2 are free.
        let (backbones, stats) = run_engine("p cnf 3 3\n1 2 0\n-1 -2 0\n3 0\n", DEFAULT_CONFIG);
        assert_eq!(backbones.unwrap(), vec![3]);
        let n = 3;
        assert_eq!(stats.count(&stats.backbones) + stats.count(&stats.dropped), n);
    }

    #[test]
    fn check_mode_verifies_every_variable() {
        let config = Config { check: true, ..DEFAULT_CONFIG };
        let (backbones, stats) = run_engine("p cnf 3 3\n1 2 0\n-1 -2 0\n3 0\n", config);
        assert_eq!(backbones.unwrap(), vec![3]);
        assert_eq!(stats.count(&stats.checked), 3);
    }

    #[test]
    fn all_disable_flags_agree_with_default() {
        let inputs = [
            "p cnf 1 1\n1 0\n",
            "p cnf 2 2\n1 0\n-2 0\n",
            "p cnf 2 1\n1 2 0\n",
            "p cnf 3 3\n1 2 0\n-1 -2 0\n3 0\n",
            "p cnf 3 2\n1 2 3 0\n-1 -2 -3 0\n",
            "p cnf 4 4\n1 2 0\n-1 2 0\n-2 3 4 0\n-2 -3 -4 0\n",
        ];
        for dimacs in inputs {
            let (expected, _) = run_engine(dimacs, DEFAULT_CONFIG);
            let variants = [
                DEFAULT_CONFIG.plain(),
                Config { one_by_one: true, ..DEFAULT_CONFIG },
                Config { no_filter: true, ..DEFAULT_CONFIG },
                Config { no_fixed: true, ..DEFAULT_CONFIG },
                Config { no_flip: true, ..DEFAULT_CONFIG },
                Config { set_phase: true, ..DEFAULT_CONFIG },
                Config { check: true, ..DEFAULT_CONFIG },
            ];
            for config in variants {
                let (got, _) = run_engine(dimacs, config);
                assert_eq!(got, expected, "options changed the backbone of {:?}", dimacs);
            }
        }
    }
}
