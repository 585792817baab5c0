use super::clause::ClauseRef;
use super::lbool::LBool;
use super::types::{Lit, Var, VarVec};

#[derive(Debug, Clone)]
pub struct VarData {
    pub(crate) reason: Option<ClauseRef>,
    pub(crate) level: usize,
}

/// Trail-based assignment with decision levels.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) values: VarVec<LBool>,
    pub(crate) var_data: VarVec<VarData>,
    pub(crate) trail: Vec<Lit>,
    pub(crate) trail_lim: Vec<usize>,
    pub(crate) qhead: usize,
}

impl Assignment {
    pub const fn new() -> Self {
        Self {
            values: VarVec::new(),
            var_data: VarVec::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
        }
    }

    pub fn init(&mut self, var: Var) {
        debug_assert_eq!(self.values.len(), var.index());
        self.values.push(LBool::Undef);
        self.var_data.push(VarData { reason: None, level: 0 });
    }

    pub fn value(&self, lit: Lit) -> LBool {
        self.values[lit.var()] ^ lit.is_negative()
    }

    pub fn value_var(&self, var: Var) -> LBool {
        self.values[var]
    }

    pub fn reason(&self, var: Var) -> Option<ClauseRef> {
        self.var_data[var].reason
    }

    pub fn level(&self, var: Var) -> usize {
        self.var_data[var].level
    }

    /// Root-level (decision level 0) value of `lit`, `Undef` if not fixed there.
    pub fn fixed(&self, lit: Lit) -> LBool {
        if self.level(lit.var()) > 0 {
            LBool::Undef
        } else {
            self.value(lit)
        }
    }

    pub fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    pub fn unassign(&mut self, var: Var) {
        self.values[var] = LBool::Undef;
    }

    pub fn unchecked_enqueue(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        debug_assert_eq!(self.value(lit), LBool::Undef);
        self.values[lit.var()] = LBool::from(!lit.is_negative());
        self.var_data[lit.var()] = VarData {
            reason,
            level: self.decision_level(),
        };
        self.trail.push(lit);
    }

    /// Enqueue `lit` unless it is already assigned; `false` signals a conflict
    /// with the existing assignment.
    pub fn enqueue(&mut self, lit: Lit, reason: Option<ClauseRef>) -> bool {
        match self.value(lit) {
            LBool::Undef => {
                self.unchecked_enqueue(lit, reason);
                true
            }
            LBool::True => true,
            LBool::False => false,
        }
    }

    pub fn dequeue(&mut self) -> Option<Lit> {
        if self.qhead < self.trail.len() {
            let lit = self.trail[self.qhead];
            self.qhead += 1;
            Some(lit)
        } else {
            None
        }
    }
}
