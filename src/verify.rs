use log::debug;

use crate::oracle::{Oracle, Result, SolveResponse};

/// Independent checker over a copy of the main oracle's clause database,
/// forked right after the first model so it reflects exactly the input.
#[derive(Debug)]
pub struct Verifier<O> {
    oracle: O,
}

impl<O: Oracle> Verifier<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// A confirmed backbone `lit` admits no model of its negation.
    pub fn check_confirmed(&mut self, lit: i32) -> Result<bool> {
        debug!("checking confirmed backbone {}", lit);
        self.oracle.assume(-lit)?;
        Ok(self.oracle.solve()? == SolveResponse::Unsat)
    }

    /// A refuted candidate `lit` has a model of its negation.
    pub fn check_refuted(&mut self, lit: i32) -> Result<bool> {
        debug!("checking refuted candidate {}", lit);
        self.oracle.assume(-lit)?;
        Ok(self.oracle.solve()? == SolveResponse::Sat)
    }
}
