/// Per-variable backbone state: each variable is either still a candidate
/// (`candidates[i]` holds the hypothesized literal), refuted (both slots
/// zero), or a confirmed backbone (`fixed_out[i]` holds the literal).
///
/// At most one of the two slots is non-zero per variable, and
/// `confirmed + dropped + remaining` always equals the variable count.
#[derive(Debug)]
pub struct CandidateTable {
    candidates: Vec<i32>,
    fixed_out: Vec<i32>,
    remaining: usize,
    confirmed: usize,
    dropped: usize,
}

impl CandidateTable {
    /// Build the table from the first model: variable `i` starts out as the
    /// candidate literal `+i` or `-i`, matching its model polarity.
    pub fn from_model<F>(vars: i32, mut model: F) -> Self
    where
        F: FnMut(i32) -> bool,
    {
        let len = vars as usize + 1;
        let mut candidates = vec![0; len];
        for i in 1..=vars {
            candidates[i as usize] = if model(i) { i } else { -i };
        }
        Self {
            candidates,
            fixed_out: vec![0; len],
            remaining: vars as usize,
            confirmed: 0,
            dropped: 0,
        }
    }

    pub fn vars(&self) -> i32 {
        self.candidates.len() as i32 - 1
    }

    /// The candidate literal of variable `i`, or zero once resolved.
    pub fn lit(&self, i: i32) -> i32 {
        self.candidates[i as usize]
    }

    /// The confirmed backbone literal of variable `i`, or zero.
    pub fn backbone(&self, i: i32) -> i32 {
        self.fixed_out[i as usize]
    }

    pub fn is_resolved(&self, i: i32) -> bool {
        self.candidates[i as usize] == 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Refute candidate `i`: a model witnessing its negation exists.
    pub fn drop(&mut self, i: i32) -> i32 {
        let lit = self.candidates[i as usize];
        debug_assert_ne!(lit, 0, "only candidates can be dropped");
        self.candidates[i as usize] = 0;
        self.remaining -= 1;
        self.dropped += 1;
        lit
    }

    /// Confirm candidate `i` as a backbone.
    pub fn confirm(&mut self, i: i32) -> i32 {
        let lit = self.candidates[i as usize];
        debug_assert_ne!(lit, 0, "only candidates can be confirmed");
        debug_assert_eq!(self.fixed_out[i as usize], 0);
        self.candidates[i as usize] = 0;
        self.fixed_out[i as usize] = lit;
        self.remaining -= 1;
        self.confirmed += 1;
        lit
    }

    /// All confirmed backbone literals in ascending variable order.
    pub fn backbones(&self) -> Vec<i32> {
        self.fixed_out.iter().copied().filter(|&lit| lit != 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_keep_counts_consistent() {
        let mut table = CandidateTable::from_model(4, |i| i % 2 == 0);
        assert_eq!(table.lit(1), -1);
        assert_eq!(table.lit(2), 2);
        assert_eq!(table.remaining(), 4);

        let lit = table.drop(1);
        assert_eq!(lit, -1);
        assert!(table.is_resolved(1));
        assert_eq!(table.backbone(1), 0);

        let lit = table.confirm(2);
        assert_eq!(lit, 2);
        assert_eq!(table.backbone(2), 2);

        assert_eq!(table.remaining(), 2);
        assert_eq!(table.confirmed() + table.dropped() + table.remaining(), 4);
        assert_eq!(table.backbones(), vec![2]);
    }

    #[test]
    #[should_panic]
    fn double_drop_is_rejected() {
        let mut table = CandidateTable::from_model(1, |_| true);
        table.drop(1);
        table.drop(1);
    }
}
