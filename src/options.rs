//! Static, read-only configuration attached to the engine that owns the
//! compilation pipeline.

use crate::source::Flavor;

/// Configuration consumed read-only by every stage of a compilation
/// request. Built once by the engine layer and shared across many requests.
#[derive(Debug, Clone)]
pub struct RegexOptions {
    /// Which syntax flavor incoming patterns are written in.
    pub flavor: Flavor,
    /// Forces `compile_eager_dfa_executor`'s path wherever the engine layer
    /// would otherwise pick the lazy path. Used by regression test suites
    /// that want every pattern compiled to a single capture-tracking DFA.
    pub regression_test_mode: bool,
    /// When set, the automaton dump hook writes the AST/NFA/DFA graph and
    /// JSON files to `dump_dir`.
    pub dump_automata: bool,
    /// Directory dump files are written to when `dump_automata` is set.
    pub dump_dir: std::path::PathBuf,
    /// Enables the `TraceFinder` fast path in `compile_lazy_dfa_executor`.
    pub trace_finder_enabled: bool,
    /// Upper bound (inclusive) on a counted repetition's upper quantifier;
    /// patterns exceeding it trip the Feature Gate's
    /// "bounds of range quantifier too high" check.
    pub max_repetition_bound: u32,
}

impl Default for RegexOptions {
    fn default() -> Self {
        Self {
            flavor: Flavor::Ecmascript,
            regression_test_mode: false,
            dump_automata: false,
            dump_dir: std::path::PathBuf::from("."),
            trace_finder_enabled: true,
            max_repetition_bound: 1000,
        }
    }
}

impl RegexOptions {
    /// Creates options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for `flavor`.
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Builder-style setter for `regression_test_mode`.
    pub fn with_regression_test_mode(mut self, enabled: bool) -> Self {
        self.regression_test_mode = enabled;
        self
    }

    /// Builder-style setter for `dump_automata` and `dump_dir`.
    pub fn with_dump_automata(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.dump_automata = true;
        self.dump_dir = dir.into();
        self
    }

    /// Builder-style setter for `trace_finder_enabled`.
    pub fn with_trace_finder_enabled(mut self, enabled: bool) -> Self {
        self.trace_finder_enabled = enabled;
        self
    }

    /// Builder-style setter for `max_repetition_bound`.
    pub fn with_max_repetition_bound(mut self, bound: u32) -> Self {
        self.max_repetition_bound = bound;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_trace_finder_and_disables_dumps() {
        let options = RegexOptions::default();
        assert!(options.trace_finder_enabled);
        assert!(!options.dump_automata);
        assert!(!options.regression_test_mode);
    }

    #[test]
    fn builder_chains() {
        let options = RegexOptions::new()
            .with_regression_test_mode(true)
            .with_trace_finder_enabled(false)
            .with_max_repetition_bound(50);
        assert!(options.regression_test_mode);
        assert!(!options.trace_finder_enabled);
        assert_eq!(options.max_repetition_bound, 50);
    }
}
