//! Backbone extraction for CNF formulas.
//!
//! A literal is a backbone of a satisfiable formula if every model agrees on
//! it. The [`engine::Engine`] refines one candidate per variable, seeded from
//! the first model, through incremental SAT queries against an [`oracle::Oracle`],
//! using model filtering, in-model flipping, root-level fixed literals and
//! disjunctive `constrain` queries to keep the number of solves small.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod oracle;
pub mod report;
pub mod solver;
pub mod stats;
pub mod verify;

pub use config::{Config, Verbosity, DEFAULT_CONFIG};
pub use engine::{Engine, Outcome};
pub use oracle::Oracle;
pub use solver::CdclSolver;
