use super::clause::ClauseRef;
use super::types::{Lit, LitVec, Var};

#[derive(Debug, Copy, Clone)]
pub struct Watcher {
    pub(crate) cref: ClauseRef,
    /// Some other literal of the clause; if it is true, the clause needs no inspection.
    pub(crate) blocker: Lit,
}

#[derive(Debug, Clone)]
pub struct WatchList {
    watches: LitVec<Vec<Watcher>>,
}

impl WatchList {
    pub const fn new() -> Self {
        Self { watches: LitVec::new() }
    }

    pub fn init(&mut self, var: Var) {
        self.watches.init(var);
    }

    pub fn insert(&mut self, lit: Lit, watcher: Watcher) {
        self.watches[lit].push(watcher);
    }

    /// Detach the watcher vector of `lit` for in-place compaction during propagation.
    pub fn take(&mut self, lit: Lit) -> Vec<Watcher> {
        std::mem::take(&mut self.watches[lit])
    }

    pub fn put_back(&mut self, lit: Lit, watchers: Vec<Watcher>) {
        debug_assert!(self.watches[lit].is_empty());
        self.watches[lit] = watchers;
    }
}
