//! The TraceFinder Builder: turns a loop-free `Nfa` into a `TraceFinderNfa`
//! carrying a finite enumeration of pre-calculated result templates, so the
//! lazy-DFA path can avoid building a capture-tracking DFA when feasible.

use crate::errors::{RegexError, Result};
use crate::ids::StateID;
use crate::nfa::Nfa;

/// A template that, given a matched prefix ending at `end_state`, reports
/// the full match span directly — `length` characters, starting at the
/// match's start — without walking a separate capture-tracking automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreCalculatedResultFactory {
    /// The accepting path's states, start to end, inclusive.
    pub path: Vec<StateID>,
    /// Number of characters consumed along this path (labeled transitions
    /// only; epsilon hops are free).
    pub length: u32,
}

/// Caps the number of distinct accepting paths enumerated before bailing
/// out with `Unsupported` — guards against a loop-free but combinatorially
/// wide AST (e.g. a long alternation chain) blowing up the template table.
pub const MAX_PRECALCULATED_RESULTS: usize = 4096;

/// A specialized reverse NFA that recognizes a finite set of match shapes
/// directly, without a capture-tracking DFA.
#[derive(Debug, Clone)]
pub struct TraceFinderNfa {
    pre_calculated_results: Vec<PreCalculatedResultFactory>,
    reverse: Nfa,
}

impl TraceFinderNfa {
    /// The enumerated templates, one per distinct accepting path.
    pub fn pre_calculated_results(&self) -> &[PreCalculatedResultFactory] {
        &self.pre_calculated_results
    }

    /// The reverse state graph of the NFA this table was enumerated from —
    /// what a backward DFA must be built over when the table holds more
    /// than one template, since the main NFA's own reverse traversal can't
    /// tell which accepting path the forward match actually took.
    pub fn reverse_nfa(&self) -> &Nfa {
        &self.reverse
    }
}

/// Generates a `TraceFinderNfa` from a loop-free `Nfa`.
pub struct NfaTraceFinder;

impl NfaTraceFinder {
    /// Enumerates every accepting path through `nfa` into a finite template
    /// table. The caller (the coordinator) must already have checked
    /// `¬properties.has_loops`; this function does not re-check it, since a
    /// cyclic graph would simply never terminate enumeration if it did
    /// reach one, and the coordinator's precondition makes that unreachable
    /// in practice.
    pub fn generate(nfa: &Nfa) -> Result<TraceFinderNfa> {
        let mut results = Vec::new();
        let mut path = vec![nfa.start_state()];
        enumerate(nfa, nfa.start_state(), 0, &mut path, &mut results)?;
        Ok(TraceFinderNfa {
            pre_calculated_results: results,
            reverse: nfa.reversed(),
        })
    }
}

fn enumerate(
    nfa: &Nfa,
    state: StateID,
    length: u32,
    path: &mut Vec<StateID>,
    results: &mut Vec<PreCalculatedResultFactory>,
) -> Result<()> {
    if results.len() > MAX_PRECALCULATED_RESULTS {
        return Err(RegexError::unsupported(
            "TraceFinder template table exceeds its size limit",
        ));
    }
    if state == nfa.end_state() {
        results.push(PreCalculatedResultFactory {
            path: path.clone(),
            length,
        });
    }
    for &next in &nfa.states()[state.as_usize()].epsilon_transitions {
        path.push(next);
        enumerate(nfa, next, length, path, results)?;
        path.pop();
    }
    for transition in &nfa.states()[state.as_usize()].transitions {
        path.push(transition.target);
        enumerate(nfa, transition.target, length + 1, path, results)?;
        path.pop();
    }
    Ok(())
}
