/// Message verbosity: `Quiet` suppresses all `c` lines, `Logging` enables
/// the `c LOGGING` trace of every engine step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Default,
    Verbose(u8),
    Logging,
}

impl Verbosity {
    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }

    pub fn is_logging(self) -> bool {
        self == Verbosity::Logging
    }

    pub fn level(self) -> u8 {
        match self {
            Verbosity::Quiet | Verbosity::Default => 0,
            Verbosity::Verbose(level) => level,
            Verbosity::Logging => u8::MAX,
        }
    }
}

/// Run configuration, immutable once the command line has been parsed.
#[derive(Debug, Copy, Clone)]
pub struct Config {
    /// Emit `b` lines for backbone literals.
    pub print: bool,
    /// Verify every confirmation and refutation on an independent oracle copy.
    pub check: bool,
    /// Disable model-based filtering of candidates.
    pub no_filter: bool,
    /// Disable the root-level `fixed` shortcut.
    pub no_fixed: bool,
    /// Disable in-model literal flipping.
    pub no_flip: bool,
    /// Forward "no inprocessing" to the oracle.
    pub no_inprocessing: bool,
    /// Refute candidates one variable at a time, never through `constrain`.
    pub one_by_one: bool,
    /// Bias the oracle's decision phases towards the candidate negations.
    pub set_phase: bool,
    /// Let the oracle report its own progress.
    pub report: bool,
    pub verbosity: Verbosity,
}

pub const DEFAULT_CONFIG: Config = Config {
    print: true,
    check: false,
    no_filter: false,
    no_fixed: false,
    no_flip: false,
    no_inprocessing: false,
    one_by_one: false,
    set_phase: false,
    report: false,
    verbosity: Verbosity::Default,
};

impl Config {
    /// Disable every optimization, as `--plain` does.
    pub fn plain(mut self) -> Self {
        self.no_filter = true;
        self.no_fixed = true;
        self.no_flip = true;
        self.no_inprocessing = true;
        self.one_by_one = true;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
