use std::io::BufRead;

use snafu::Snafu;

use crate::solver::dimacs::DimacsError;

pub type Result<T, E = OracleError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OracleError {
    #[snafu(display("literal must be non-zero"))]
    ZeroLiteral,

    #[snafu(display("literal {lit} is out of range"))]
    LiteralOutOfRange { lit: i32 },

    #[snafu(display("no model available from the last call to `solve()`"))]
    ModelUnavailable,

    #[snafu(display("{source}"), context(false))]
    Dimacs { source: DimacsError },
}

/// Possible responses from a call to `solve`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SolveResponse {
    /// The formula (under the given assumptions and constraint) is satisfiable.
    Sat = 10,
    /// The formula (under the given assumptions and constraint) is unsatisfiable.
    Unsat = 20,
    /// The solver was interrupted before reaching a verdict.
    Interrupted = 0,
}

/// Possible literal values from a call to `val`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LitValue {
    True,
    False,
}

impl From<LitValue> for bool {
    fn from(value: LitValue) -> Self {
        match value {
            LitValue::True => true,
            LitValue::False => false,
        }
    }
}

/// Possible responses from a call to `fixed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FixedResponse {
    /// The literal is implied by the formula at the root level.
    Implied,
    /// The negation of the literal is implied at the root level.
    Negation,
    /// Root-level propagation has not decided the literal either way.
    Unclear,
}

/// Search counters exposed for the statistics block.
#[derive(Debug, Default, Copy, Clone)]
pub struct OracleCounters {
    pub conflicts: u64,
    pub decisions: u64,
    pub propagations: u64,
}

/// The capability set the backbone engine requires from a SAT oracle.
///
/// The shape follows incremental solver APIs: clauses and the one-shot
/// constraint are pushed literal by literal with a zero terminator,
/// assumptions and the constraint live only until the next `solve`, and
/// `val`/`flip` refer to the model of the most recent satisfiable call.
pub trait Oracle {
    fn signature(&self) -> &'static str;

    /// Add a literal of the current clause, or zero to terminate it.
    fn add(&mut self, lit_or_zero: i32);

    fn add_clause<I>(&mut self, lits: I)
    where
        I: IntoIterator<Item = i32>,
    {
        for lit in lits {
            self.add(lit);
        }
        self.add(0);
    }

    /// Assume `lit` for the next call to `solve`.
    fn assume(&mut self, lit: i32) -> Result<()>;

    /// Add a literal of the one-shot constraint clause, or zero to terminate
    /// it. The constraint is active only during the next `solve`; a new
    /// constraint replaces the old.
    fn constrain(&mut self, lit_or_zero: i32);

    fn solve(&mut self) -> Result<SolveResponse>;

    /// Value of `lit` in the model of the last satisfiable `solve`.
    fn val(&self, lit: i32) -> Result<LitValue>;

    /// Root-level status of `lit`.
    fn fixed(&self, lit: i32) -> Result<FixedResponse>;

    /// Whether this oracle supports the model-preserving `flip` primitive.
    fn has_flip(&self) -> bool;

    /// Try to flip `lit` in the current model without a new search. On
    /// success the oracle holds a different model in which `lit` is false.
    fn flip(&mut self, lit: i32) -> Result<bool>;

    /// Bias the decision phase of `|lit|` towards the sign of `lit`.
    fn phase(&mut self, lit: i32);

    /// Remove the phase bias of variable `var`.
    fn unphase(&mut self, var: i32);

    /// Fork an independent oracle over the same clause database. Pending
    /// assumptions, constraint and model are not carried over.
    fn copy(&self) -> Self
    where
        Self: Sized;

    /// Best-effort option pass-through; unknown options are ignored.
    fn set_option(&mut self, name: &str, value: i32);

    /// Read a DIMACS CNF into the solver and return the number of variables.
    fn read_dimacs(&mut self, input: &mut dyn BufRead, name: &str) -> Result<i32>;

    /// Number of variables (the declared input range).
    fn vars(&self) -> i32;

    fn counters(&self) -> OracleCounters;
}
