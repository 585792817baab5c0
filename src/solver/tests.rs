use std::io::Cursor;

use test_log::test;

use crate::oracle::{FixedResponse, LitValue, Oracle, SolveResponse};

use super::CdclSolver;

fn solver_from(dimacs: &str) -> CdclSolver {
    let mut solver = CdclSolver::new();
    let vars = solver.read_dimacs(&mut Cursor::new(dimacs), "<test>").unwrap();
    assert_eq!(vars, solver.vars());
    solver
}

#[test]
fn sat_and_unsat_under_assumptions() {
    let mut solver = CdclSolver::new();

    // (-1 or 2) and (1 or 2) and (-1 or -2)
    solver.add_clause([-1, 2]);
    solver.add_clause([1, 2]);
    solver.add_clause([-1, -2]);

    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(1).unwrap(), LitValue::False);
    assert_eq!(solver.val(2).unwrap(), LitValue::True);

    // Assuming 1 makes it unsatisfiable.
    solver.assume(1).unwrap();
    assert_eq!(solver.solve().unwrap(), SolveResponse::Unsat);

    // `solve` resets assumptions, so a plain call is satisfiable again.
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    // Forcing 1 permanently flips the verdict for good.
    solver.add_clause([1]);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Unsat);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Unsat);
}

#[test]
fn fixed_reports_root_units() {
    let mut solver = solver_from("p cnf 3 2\n1 0\n-1 2 0\n");
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    assert_eq!(solver.fixed(1).unwrap(), FixedResponse::Implied);
    assert_eq!(solver.fixed(-1).unwrap(), FixedResponse::Negation);
    assert_eq!(solver.fixed(2).unwrap(), FixedResponse::Implied);
    assert_eq!(solver.fixed(3).unwrap(), FixedResponse::Unclear);
    assert_eq!(solver.fixed(-3).unwrap(), FixedResponse::Unclear);
}

#[test]
fn flip_respects_clauses() {
    // 3 is free, 1 is forced, and (1 or 2) pins nothing else.
    let mut solver = solver_from("p cnf 3 2\n1 0\n1 2 0\n");
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    // A root-fixed variable can never be flipped.
    assert!(!solver.flip(1).unwrap());

    // A variable without constraints always flips, in both directions.
    let before = bool::from(solver.val(3).unwrap());
    assert!(solver.flip(3).unwrap());
    assert_eq!(bool::from(solver.val(3).unwrap()), !before);
    assert!(solver.flip(3).unwrap());
    assert_eq!(bool::from(solver.val(3).unwrap()), before);

    // 2 is flippable because (1 or 2) stays satisfied through 1.
    let before = bool::from(solver.val(2).unwrap());
    assert!(solver.flip(2).unwrap());
    assert_eq!(bool::from(solver.val(2).unwrap()), !before);
}

#[test]
fn flip_fails_on_singly_satisfied_clause() {
    let mut solver = solver_from("p cnf 2 1\n1 2 0\n");
    // Force the model 1=true, 2=false via assumptions to make it deterministic.
    solver.assume(1).unwrap();
    solver.assume(-2).unwrap();
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    // (1 or 2) is satisfied only by 1 while 2 is false: 1 must not flip.
    assert!(!solver.flip(1).unwrap());
    // Flipping 2 to true is fine and afterwards 1 becomes flippable.
    assert!(solver.flip(2).unwrap());
    assert!(solver.flip(1).unwrap());
    assert_eq!(solver.val(1).unwrap(), LitValue::False);
    assert_eq!(solver.val(2).unwrap(), LitValue::True);
}

#[test]
fn constrain_lives_for_one_call() {
    let mut solver = solver_from("p cnf 2 1\n1 2 0\n");

    // The one-shot clause (-1) contradicts the assumption 1.
    solver.constrain(-1);
    solver.constrain(0);
    solver.assume(1).unwrap();
    assert_eq!(solver.solve().unwrap(), SolveResponse::Unsat);

    // The constraint is gone afterwards.
    solver.assume(1).unwrap();
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(1).unwrap(), LitValue::True);
}

#[test]
fn constrain_refutes_a_candidate() {
    let mut solver = solver_from("p cnf 2 1\n1 2 0\n");

    // At least one of the two variables must go false in the next model.
    solver.constrain(-1);
    solver.constrain(-2);
    solver.constrain(0);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    let one = bool::from(solver.val(1).unwrap());
    let two = bool::from(solver.val(2).unwrap());
    assert!(!one || !two);
    assert!(one || two, "the original clause must stay satisfied");
}

#[test]
fn phase_biases_decisions() {
    let mut solver = solver_from("p cnf 2 1\n1 2 0\n");

    solver.phase(1);
    solver.phase(2);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(1).unwrap(), LitValue::True);
    assert_eq!(solver.val(2).unwrap(), LitValue::True);

    solver.phase(-1);
    solver.unphase(2);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(1).unwrap(), LitValue::False);
}

#[test]
fn copy_is_independent() {
    let mut solver = solver_from("p cnf 2 2\n1 2 0\n-1 2 0\n");
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    let mut fork = solver.copy();
    fork.add_clause([-2]);
    assert_eq!(fork.solve().unwrap(), SolveResponse::Unsat);

    // The original is unaffected by clauses added to the fork.
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(2).unwrap(), LitValue::True);
}

#[test]
fn larger_pigeonhole_is_unsat() {
    // Three pigeons, two holes.
    let mut solver = CdclSolver::new();
    let hole = |pigeon: i32, slot: i32| pigeon * 2 + slot - 2; // vars 1..=6
    for pigeon in 1..=3 {
        solver.add_clause([hole(pigeon, 1), hole(pigeon, 2)]);
    }
    for slot in 1..=2 {
        for a in 1..=3 {
            for b in (a + 1)..=3 {
                solver.add_clause([-hole(a, slot), -hole(b, slot)]);
            }
        }
    }
    assert_eq!(solver.solve().unwrap(), SolveResponse::Unsat);
}

#[test]
fn under_declared_header_grows_the_range() {
    let mut solver = solver_from("p cnf 1 2\n1 0\n1 2 0\n");
    assert_eq!(solver.vars(), 2);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.fixed(1).unwrap(), FixedResponse::Implied);
    assert_eq!(solver.fixed(2).unwrap(), FixedResponse::Unclear);
    solver.val(2).unwrap();
}

#[test]
fn incremental_adds_after_solves() {
    let mut solver = solver_from("p cnf 3 1\n1 2 3 0\n");
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);

    solver.add_clause([-1]);
    solver.add_clause([-2]);
    assert_eq!(solver.solve().unwrap(), SolveResponse::Sat);
    assert_eq!(solver.val(3).unwrap(), LitValue::True);
    assert_eq!(solver.fixed(3).unwrap(), FixedResponse::Implied);
}
