use std::io::BufRead;

use log::{debug, trace};
use snafu::ensure;

use crate::oracle::{
    FixedResponse, LitValue, LiteralOutOfRangeSnafu, ModelUnavailableSnafu, Oracle, OracleCounters, Result,
    SolveResponse, ZeroLiteralSnafu,
};

use super::assignment::Assignment;
use super::clause::{Clause, ClauseRef};
use super::dimacs;
use super::lbool::LBool;
use super::order::VarOrder;
use super::types::{Lit, LitVec, Var, VarVec};
use super::watch::{WatchList, Watcher};

const SIGNATURE: &str = concat!("cdcl-", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Search {
    Sat,
    Unsat,
    AssumptionsUnsat,
}

enum Decide {
    Made,
    Sat,
    AssumptionConflict,
}

/// Incremental CDCL solver with the extended primitives the backbone engine
/// needs: root-level `fixed` queries, model-preserving `flip`, a one-shot
/// `constrain` clause, phase biasing, and cheap copies for verification.
#[derive(Debug, Clone)]
pub struct CdclSolver {
    clauses: Vec<Clause>,
    watches: WatchList,
    /// Occurrence lists of irredundant clauses, walked by `flip`.
    occs: LitVec<Vec<ClauseRef>>,
    assignment: Assignment,
    order: VarOrder,
    /// Saved phases: `true` means the variable was last assigned false.
    polarity: VarVec<bool>,
    /// Explicit phase bias installed via `phase`, overriding phase saving.
    forced_phase: VarVec<Option<bool>>,
    /// Cleared once an unconditional (root-level) contradiction is derived.
    ok: bool,
    next_var: u32,
    /// User-visible variable range; hidden activation variables live above it.
    external_vars: i32,
    assumptions: Vec<Lit>,
    adding: Vec<i32>,
    constraining: Vec<i32>,
    constraint: Vec<Lit>,
    /// Model of the last satisfiable call, indexed by variable; empty if none.
    model: Vec<LBool>,
    conflicts: u64,
    decisions: u64,
    propagations: u64,
}

impl CdclSolver {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
            watches: WatchList::new(),
            occs: LitVec::new(),
            assignment: Assignment::new(),
            order: VarOrder::new(),
            polarity: VarVec::new(),
            forced_phase: VarVec::new(),
            ok: true,
            next_var: 0,
            external_vars: 0,
            assumptions: Vec::new(),
            adding: Vec::new(),
            constraining: Vec::new(),
            constraint: Vec::new(),
            model: Vec::new(),
            conflicts: 0,
            decisions: 0,
            propagations: 0,
        }
    }

    fn new_var(&mut self) -> Var {
        let var = Var::new(self.next_var);
        self.next_var += 1;
        self.watches.init(var);
        self.occs.init(var);
        self.assignment.init(var);
        self.polarity.push(false);
        self.forced_phase.push(None);
        self.order.init(var);
        var
    }

    /// Make sure all variables up to the external index `var` exist.
    fn reserve(&mut self, var: u32) {
        while self.next_var < var {
            self.new_var();
        }
        self.external_vars = self.external_vars.max(var as i32);
    }

    fn lit_from_external(&mut self, lit: i32) -> Lit {
        self.reserve(lit.unsigned_abs());
        Lit::from_external(lit)
    }

    pub fn add_external_clause(&mut self, lits: &[i32]) {
        let lits: Vec<Lit> = lits.iter().map(|&lit| self.lit_from_external(lit)).collect();
        self.add_original_clause(lits);
    }

    /// Add an irredundant clause, simplifying against the root assignment.
    fn add_original_clause(&mut self, mut lits: Vec<Lit>) {
        if !self.ok {
            return;
        }
        if self.assignment.decision_level() > 0 {
            self.backtrack(0);
        }

        lits.sort_by_key(|lit| lit.slot());
        lits.dedup();
        for pair in lits.windows(2) {
            if pair[0].var() == pair[1].var() {
                trace!("skipping tautological clause");
                return;
            }
        }
        if lits.iter().any(|&lit| self.assignment.fixed(lit) == LBool::True) {
            trace!("skipping root-satisfied clause");
            return;
        }
        lits.retain(|&lit| self.assignment.fixed(lit) != LBool::False);

        match lits.len() {
            0 => {
                debug!("empty clause after root simplification");
                self.ok = false;
            }
            1 => {
                if !self.assignment.enqueue(lits[0], None) {
                    debug!("root conflict on unit {}", lits[0]);
                    self.ok = false;
                }
            }
            _ => {
                let cref = ClauseRef(self.clauses.len() as u32);
                self.watches.insert(lits[0], Watcher { cref, blocker: lits[1] });
                self.watches.insert(lits[1], Watcher { cref, blocker: lits[0] });
                for &lit in &lits {
                    self.occs[lit].push(cref);
                }
                self.clauses.push(Clause::new(lits, false));
            }
        }
    }

    fn attach_learnt(&mut self, lits: Vec<Lit>) -> ClauseRef {
        debug_assert!(lits.len() >= 2);
        let cref = ClauseRef(self.clauses.len() as u32);
        self.watches.insert(lits[0], Watcher { cref, blocker: lits[1] });
        self.watches.insert(lits[1], Watcher { cref, blocker: lits[0] });
        self.clauses.push(Clause::new(lits, true));
        cref
    }

    fn propagate(&mut self) -> Option<ClauseRef> {
        let mut conflict = None;
        while conflict.is_none() {
            let Some(p) = self.assignment.dequeue() else { break };
            self.propagations += 1;
            let false_lit = !p;
            let mut watchers = self.watches.take(false_lit);

            let mut i = 0;
            while i < watchers.len() {
                let Watcher { cref, blocker } = watchers[i];

                // Cheap out if the blocking literal already satisfies the clause.
                if self.assignment.value(blocker) == LBool::True {
                    i += 1;
                    continue;
                }

                let clause = &mut self.clauses[cref.index()];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], false_lit);

                let first = clause[0];
                if first != blocker && self.assignment.value(first) == LBool::True {
                    watchers[i] = Watcher { cref, blocker: first };
                    i += 1;
                    continue;
                }

                // Look for a replacement watch.
                let mut moved = false;
                for k in 2..clause.len() {
                    if self.assignment.value(clause[k]) != LBool::False {
                        clause.swap(1, k);
                        let other = clause[1];
                        self.watches.insert(other, Watcher { cref, blocker: first });
                        watchers.swap_remove(i);
                        moved = true;
                        break;
                    }
                }
                if moved {
                    continue;
                }

                // Clause is unit or conflicting.
                i += 1;
                match self.assignment.value(first) {
                    LBool::Undef => {
                        trace!("propagating {} from clause {:?}", first, cref);
                        self.assignment.unchecked_enqueue(first, Some(cref));
                    }
                    LBool::False => {
                        conflict = Some(cref);
                        self.assignment.qhead = self.assignment.trail.len();
                        break;
                    }
                    LBool::True => unreachable!("satisfied clause was not caught by the blocker checks"),
                }
            }

            self.watches.put_back(false_lit, watchers);
        }
        conflict
    }

    /// First-UIP conflict analysis; returns the learnt clause (asserting
    /// literal first) and the level to backtrack to.
    fn analyze(&mut self, conflict: ClauseRef) -> (Vec<Lit>, usize) {
        debug_assert!(self.assignment.decision_level() > 0);

        let mut lemma = Vec::new();
        let mut seen = vec![false; self.next_var as usize];
        let mut unresolved: u32 = 0;
        let mut reason = conflict;
        let mut index = self.assignment.trail.len();

        loop {
            let clause = &self.clauses[reason.index()];
            let start = if reason == conflict { 0 } else { 1 };
            for k in start..clause.len() {
                let q = clause[k];
                debug_assert_eq!(self.assignment.value(q), LBool::False);
                let var = q.var();
                if !seen[var.index()] && self.assignment.level(var) > 0 {
                    seen[var.index()] = true;
                    self.order.bump(var);
                    if self.assignment.level(var) < self.assignment.decision_level() {
                        lemma.push(q);
                    } else {
                        unresolved += 1;
                    }
                }
            }

            // Walk the trail back to the next marked literal of this level.
            loop {
                index -= 1;
                if seen[self.assignment.trail[index].var().index()] {
                    break;
                }
            }
            let p = self.assignment.trail[index];
            seen[p.var().index()] = false;
            unresolved -= 1;
            if unresolved == 0 {
                lemma.insert(0, !p);
                break;
            }
            reason = self.assignment.reason(p.var()).expect("propagated literal has a reason");
        }

        // Local minimization: drop literals implied by the rest of the lemma.
        let head = lemma[0];
        let mut kept: Vec<Lit> = vec![head];
        kept.extend(lemma[1..].iter().copied().filter(|&lit| !self.lit_redundant(lit, &seen)));
        let mut lemma = kept;

        let backtrack_level = if lemma.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..lemma.len() {
                if self.assignment.level(lemma[i].var()) > self.assignment.level(lemma[max_i].var()) {
                    max_i = i;
                }
            }
            lemma.swap(1, max_i);
            self.assignment.level(lemma[1].var())
        };

        (lemma, backtrack_level)
    }

    fn lit_redundant(&self, lit: Lit, seen: &[bool]) -> bool {
        match self.assignment.reason(lit.var()) {
            None => false,
            Some(cref) => {
                let clause = &self.clauses[cref.index()];
                clause
                    .iter()
                    .skip(1)
                    .all(|&other| seen[other.var().index()] || self.assignment.level(other.var()) == 0)
            }
        }
    }

    fn backtrack(&mut self, level: usize) {
        if self.assignment.decision_level() <= level {
            return;
        }
        trace!("backtracking from level {} to {}", self.assignment.decision_level(), level);
        let keep = self.assignment.trail_lim[level];
        for i in (keep..self.assignment.trail.len()).rev() {
            let var = self.assignment.trail[i].var();
            let value = self.assignment.value_var(var).as_bool().expect("trail literal is assigned");
            self.polarity[var] = !value;
            self.assignment.unassign(var);
            self.order.insert(var);
        }
        self.assignment.qhead = keep;
        self.assignment.trail.truncate(keep);
        self.assignment.trail_lim.truncate(level);
    }

    fn decide(&mut self) -> Decide {
        // Pending assumptions come first, one decision level per assumption.
        while self.assignment.decision_level() < self.assumptions.len() {
            let assumption = self.assumptions[self.assignment.decision_level()];
            match self.assignment.value(assumption) {
                LBool::True => {
                    self.assignment.new_decision_level();
                }
                LBool::False => return Decide::AssumptionConflict,
                LBool::Undef => {
                    self.decisions += 1;
                    self.assignment.new_decision_level();
                    self.assignment.unchecked_enqueue(assumption, None);
                    return Decide::Made;
                }
            }
        }

        match self.order.pick_branching_variable(&self.assignment) {
            Some(var) => {
                self.decisions += 1;
                let negative = self.forced_phase[var].unwrap_or(self.polarity[var]);
                let decision = Lit::new(var, negative);
                trace!("deciding {}", decision);
                self.assignment.new_decision_level();
                self.assignment.unchecked_enqueue(decision, None);
                Decide::Made
            }
            None => Decide::Sat,
        }
    }

    /// Propagate; on conflict analyze, backjump and assert the learnt clause.
    /// Returns `false` on a root-level conflict.
    fn propagate_analyze_backtrack(&mut self) -> bool {
        while let Some(conflict) = self.propagate() {
            self.conflicts += 1;
            if self.assignment.decision_level() == 0 {
                return false;
            }
            let (lemma, backtrack_level) = self.analyze(conflict);
            self.backtrack(backtrack_level);
            if lemma.len() == 1 {
                debug_assert_eq!(self.assignment.decision_level(), 0);
                self.assignment.unchecked_enqueue(lemma[0], None);
            } else {
                let asserting = lemma[0];
                let cref = self.attach_learnt(lemma);
                self.assignment.unchecked_enqueue(asserting, Some(cref));
            }
            self.order.decay();
        }
        true
    }

    fn search(&mut self) -> Search {
        loop {
            if !self.propagate_analyze_backtrack() {
                return Search::Unsat;
            }
            match self.decide() {
                Decide::Made => {}
                Decide::Sat => {
                    self.save_model();
                    return Search::Sat;
                }
                Decide::AssumptionConflict => return Search::AssumptionsUnsat,
            }
        }
    }

    fn save_model(&mut self) {
        self.model.clear();
        for index in 0..self.next_var {
            let value = self.assignment.value_var(Var::new(index));
            debug_assert!(!value.is_undef());
            self.model.push(value);
        }
    }

    fn model_value(&self, lit: Lit) -> LBool {
        self.model[lit.var().index()] ^ lit.is_negative()
    }

    pub fn solve_raw(&mut self) -> SolveResponse {
        if !self.ok {
            self.assumptions.clear();
            self.constraint.clear();
            return SolveResponse::Unsat;
        }
        if self.assignment.decision_level() > 0 {
            self.backtrack(0);
        }
        self.model.clear();

        // Install the one-shot constraint behind a fresh activation literal:
        // the clause `C v act` is permanent, `-act` is assumed for this call,
        // and `act` is fixed at the root afterwards, which makes the clause
        // inert for all later calls.
        let mut activation = None;
        if !self.constraint.is_empty() {
            let mut lits = std::mem::take(&mut self.constraint);
            let act = Lit::positive(self.new_var());
            lits.push(act);
            self.add_original_clause(lits);
            self.assumptions.push(!act);
            activation = Some(act);
        }

        let outcome = if self.ok { self.search() } else { Search::Unsat };
        self.backtrack(0);
        self.assumptions.clear();

        if outcome == Search::Unsat {
            self.ok = false;
        }
        if let Some(act) = activation {
            if self.ok && !self.assignment.enqueue(act, None) {
                self.ok = false;
            }
            if outcome == Search::Sat {
                self.model[act.var().index()] = LBool::True;
            }
        }

        match outcome {
            Search::Sat => SolveResponse::Sat,
            Search::Unsat | Search::AssumptionsUnsat => SolveResponse::Unsat,
        }
    }
}

impl Default for CdclSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle for CdclSolver {
    fn signature(&self) -> &'static str {
        SIGNATURE
    }

    fn add(&mut self, lit_or_zero: i32) {
        if lit_or_zero == 0 {
            let lits = std::mem::take(&mut self.adding);
            self.add_external_clause(&lits);
        } else {
            self.adding.push(lit_or_zero);
        }
    }

    fn assume(&mut self, lit: i32) -> Result<()> {
        ensure!(lit != 0, ZeroLiteralSnafu);
        let lit = self.lit_from_external(lit);
        self.assumptions.push(lit);
        Ok(())
    }

    fn constrain(&mut self, lit_or_zero: i32) {
        if lit_or_zero == 0 {
            let lits = std::mem::take(&mut self.constraining);
            let mut constraint = Vec::with_capacity(lits.len());
            for lit in lits {
                constraint.push(self.lit_from_external(lit));
            }
            self.constraint = constraint;
        } else {
            self.constraining.push(lit_or_zero);
        }
    }

    fn solve(&mut self) -> Result<SolveResponse> {
        Ok(self.solve_raw())
    }

    fn val(&self, lit: i32) -> Result<LitValue> {
        ensure!(lit != 0, ZeroLiteralSnafu);
        ensure!(!self.model.is_empty(), ModelUnavailableSnafu);
        let external = lit;
        let lit = Lit::from_external(lit);
        ensure!(lit.var().index() < self.model.len(), LiteralOutOfRangeSnafu { lit: external });
        match self.model_value(lit) {
            LBool::True => Ok(LitValue::True),
            LBool::False => Ok(LitValue::False),
            LBool::Undef => ModelUnavailableSnafu.fail(),
        }
    }

    fn fixed(&self, lit: i32) -> Result<FixedResponse> {
        ensure!(lit != 0, ZeroLiteralSnafu);
        let lit = Lit::from_external(lit);
        if lit.var().index() >= self.next_var as usize {
            return Ok(FixedResponse::Unclear);
        }
        match self.assignment.fixed(lit) {
            LBool::True => Ok(FixedResponse::Implied),
            LBool::False => Ok(FixedResponse::Negation),
            LBool::Undef => Ok(FixedResponse::Unclear),
        }
    }

    fn has_flip(&self) -> bool {
        true
    }

    fn flip(&mut self, lit: i32) -> Result<bool> {
        ensure!(lit != 0, ZeroLiteralSnafu);
        if self.model.is_empty() {
            return Ok(false);
        }
        let var = Lit::from_external(lit).var();
        if var.index() >= self.next_var as usize {
            return Ok(false);
        }
        // Root-fixed variables can never be flipped.
        if !self.assignment.fixed(Lit::positive(var)).is_undef() {
            return Ok(false);
        }

        // The literal of `var` the current model satisfies: every clause
        // watching its truth must be satisfied twice, otherwise the flip
        // would falsify it.
        let value = self.model[var.index()];
        let satisfied = Lit::new(var, value == LBool::False);
        for &cref in &self.occs[satisfied] {
            let clause = &self.clauses[cref.index()];
            let doubly = clause
                .iter()
                .any(|&other| other != satisfied && self.model_value(other) == LBool::True);
            if !doubly {
                return Ok(false);
            }
        }

        self.model[var.index()] = value ^ true;
        Ok(true)
    }

    fn phase(&mut self, lit: i32) {
        if lit == 0 {
            return;
        }
        let lit = self.lit_from_external(lit);
        self.forced_phase[lit.var()] = Some(lit.is_negative());
    }

    fn unphase(&mut self, var: i32) {
        if var <= 0 || var as u32 > self.next_var {
            return;
        }
        self.forced_phase[Var::from_external(var as u32)] = None;
    }

    fn copy(&self) -> Self {
        let mut copy = self.clone();
        copy.assumptions.clear();
        copy.adding.clear();
        copy.constraining.clear();
        copy.constraint.clear();
        copy.model.clear();
        copy.conflicts = 0;
        copy.decisions = 0;
        copy.propagations = 0;
        copy
    }

    fn set_option(&mut self, name: &str, value: i32) {
        // The bundled solver has no inprocessing or reporting machinery;
        // recognized options are accepted so callers can pass them through
        // unconditionally.
        match name {
            "inprocessing" | "report" | "quiet" | "verbose" => {
                debug!("option '{}' = {} accepted", name, value);
            }
            _ => debug!("ignoring unknown option '{}'", name),
        }
    }

    fn read_dimacs(&mut self, input: &mut dyn BufRead, name: &str) -> Result<i32> {
        let dimacs = dimacs::parse(input, name)?;
        // `dimacs.vars` already covers literals above the declared count.
        if dimacs.vars > 0 {
            self.reserve(dimacs.vars as u32);
        }
        for clause in &dimacs.clauses {
            self.add_external_clause(clause);
        }
        Ok(dimacs.vars)
    }

    fn vars(&self) -> i32 {
        self.external_vars
    }

    fn counters(&self) -> OracleCounters {
        OracleCounters {
            conflicts: self.conflicts,
            decisions: self.decisions,
            propagations: self.propagations,
        }
    }
}
