//! The DFA Builder Adapter: subset construction from an `Nfa` into a
//! `DfaExecutor` via `epsilon_closure`/`move_set`/work-list driven state
//! discovery, generalized over an orthogonal `(direction, searching,
//! capture_tracking)` parameter space.

use crate::ast::RegexProperties;
use crate::buffer::CompilationBuffer;
use crate::errors::Result;
use crate::ids::{CharClassID, StateID};
use crate::nfa::{CharMatcher, Nfa};
use crate::options::RegexOptions;

/// Which way the automaton consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Scans left to right, as a normal match would.
    Forward,
    /// Scans right to left, used to locate the start of a match once its
    /// end has been found, or to build a TraceFinder-backed backward
    /// locator.
    Backward,
}

/// The compiled DFA handed back to the matcher variant that requested it.
/// Execution itself (walking `transitions` against an input string) is an
/// out-of-scope runtime matcher executor; this type carries only what the
/// coordinator and the observability hooks need: shape and size.
#[derive(Debug, Clone)]
pub struct DfaExecutor {
    direction: Direction,
    searching: bool,
    capture_tracking: bool,
    name: String,
    state_count: usize,
    states: Vec<DfaState>,
}

impl DfaExecutor {
    /// The automaton's direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this executor searches for a match start (`true`) or
    /// assumes the match begins at the input position it is invoked at
    /// (`false`, "anchored").
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// Whether this executor tracks capture-group spans while matching.
    pub fn has_capture_tracking(&self) -> bool {
        self.capture_tracking
    }

    /// The debug name assigned by `DfaGenerator::debug_name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of DFA states, for the automaton-size observability record.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Number of accepting states, for the automaton-size observability
    /// record.
    pub fn accepting_state_count(&self) -> usize {
        self.states.iter().filter(|s| s.accepting).count()
    }
}

#[derive(Debug, Clone, Default)]
struct DfaState {
    nfa_states: Vec<StateID>,
    accepting: bool,
    transitions: Vec<(usize, usize)>,
}

/// The back-reference the DFA builder holds to the request that invoked it,
/// so it may recursively schedule subordinate executors. Deliberately
/// narrow: it exposes only the one re-entry point a DFA build might need.
pub trait DfaRequestHandle {
    /// Re-enters the owning request to compile a subordinate DFA executor
    /// for `nfa` with the given direction/searching/capture-tracking
    /// parameters, named `name`.
    fn create_dfa_executor(
        &self,
        nfa: &Nfa,
        props: &RegexProperties,
        direction: Direction,
        searching: bool,
        capture_tracking: bool,
        name: &str,
    ) -> Result<DfaExecutor>;
}

/// Builds a `DfaExecutor` from an `Nfa` via subset construction.
pub struct DfaGenerator<'a> {
    /// The back-reference to the owning request; unused by the subset
    /// construction itself, held only so a more elaborate generator could
    /// recursively request subordinate executors.
    #[allow(dead_code)]
    request: &'a dyn DfaRequestHandle,
    nfa: &'a Nfa,
    #[allow(dead_code)]
    props: &'a RegexProperties,
    buffer: &'a mut CompilationBuffer,
    #[allow(dead_code)]
    options: &'a RegexOptions,
    direction: Direction,
    searching: bool,
    capture_tracking: bool,
    matchers: Vec<(CharClassID, CharMatcher)>,
    states: Vec<DfaState>,
}

impl<'a> DfaGenerator<'a> {
    /// Builds a generator for one `(direction, searching, capture_tracking)`
    /// combination; not every cell of that 2×2×2 space is reachable from
    /// the coordinator (e.g. backward + capture-tracking is never
    /// requested).
    pub fn new(
        request: &'a dyn DfaRequestHandle,
        nfa: &'a Nfa,
        props: &'a RegexProperties,
        buffer: &'a mut CompilationBuffer,
        options: &'a RegexOptions,
        direction: Direction,
        searching: bool,
        capture_tracking: bool,
    ) -> Self {
        Self {
            request,
            nfa,
            props,
            buffer,
            options,
            direction,
            searching,
            capture_tracking,
            matchers: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Runs subset construction. Deterministic; no `Unsupported` is raised
    /// here (unsupported features would have been gated by `FeatureGate`
    /// before this stage runs).
    pub fn calc_dfa(&mut self) -> Result<()> {
        self.matchers = distinct_matchers(self.nfa, self.buffer);
        let (start, accept) = match self.direction {
            Direction::Forward => (self.nfa.start_state(), self.nfa.end_state()),
            Direction::Backward => (self.nfa.end_state(), self.nfa.start_state()),
        };

        let initial_nfa_states = self.closure(start);
        let mut states = vec![DfaState {
            accepting: initial_nfa_states.contains(&accept),
            nfa_states: initial_nfa_states,
            transitions: Vec::new(),
        }];
        let mut work_list = vec![0usize];
        let mut marked = vec![true];

        while let Some(dfa_state_idx) = work_list.pop() {
            let nfa_states = states[dfa_state_idx].nfa_states.clone();
            for (matcher_idx, (_, matcher)) in self.matchers.clone().iter().enumerate() {
                let moved = self.move_on(&nfa_states, matcher);
                if moved.is_empty() {
                    continue;
                }
                let target_states = self.closure_set(moved);
                let target_idx = match states.iter().position(|s| s.nfa_states == target_states) {
                    Some(idx) => idx,
                    None => {
                        states.push(DfaState {
                            accepting: target_states.contains(&accept),
                            nfa_states: target_states,
                            transitions: Vec::new(),
                        });
                        marked.push(false);
                        states.len() - 1
                    }
                };
                states[dfa_state_idx]
                    .transitions
                    .push((matcher_idx, target_idx));
                if !marked[target_idx] {
                    marked[target_idx] = true;
                    work_list.push(target_idx);
                }
            }
        }

        self.states = states;
        Ok(())
    }

    fn closure(&mut self, state: StateID) -> Vec<StateID> {
        match self.direction {
            Direction::Forward => self.nfa.epsilon_closure(state),
            Direction::Backward => reverse_epsilon_closure(self.nfa, self.buffer, state),
        }
    }

    fn closure_set(&mut self, states: Vec<StateID>) -> Vec<StateID> {
        match self.direction {
            Direction::Forward => self.nfa.epsilon_closure_set(states),
            Direction::Backward => {
                let mut all = Vec::new();
                for s in states {
                    for r in reverse_epsilon_closure(self.nfa, self.buffer, s) {
                        if !all.contains(&r) {
                            all.push(r);
                        }
                    }
                }
                all.sort_unstable_by_key(StateID::raw);
                all.dedup();
                all
            }
        }
    }

    fn move_on(&mut self, states: &[StateID], matcher: &CharMatcher) -> Vec<StateID> {
        match self.direction {
            Direction::Forward => {
                let mut out = Vec::new();
                for &state in states {
                    for t in &self.nfa.states()[state.as_usize()].transitions {
                        if &t.matcher == matcher && !out.contains(&t.target) {
                            out.push(t.target);
                        }
                    }
                }
                out
            }
            Direction::Backward => {
                let scratch = self.buffer.state_set_scratch();
                for (from_idx, from_state) in self.nfa.states().iter().enumerate() {
                    for t in &from_state.transitions {
                        if &t.matcher == matcher
                            && states.contains(&t.target)
                            && !scratch.contains(&StateID::new(from_idx as u32))
                        {
                            scratch.push(StateID::new(from_idx as u32));
                        }
                    }
                }
                scratch.clone()
            }
        }
    }

    /// Finalizes the states built by `calc_dfa` into a `DfaExecutor`.
    pub fn create_executor(&self) -> DfaExecutor {
        let name = self.debug_name("dfa");
        DfaExecutor {
            direction: self.direction,
            searching: self.searching,
            capture_tracking: self.capture_tracking,
            name,
            state_count: self.states.len(),
            states: self.states.clone(),
        }
    }

    /// Builds a name for dump files and log messages from a suggested
    /// prefix plus this generator's direction/mode/capture-tracking flags.
    pub fn debug_name(&self, suggested: &str) -> String {
        let dir = match self.direction {
            Direction::Forward => "fwd",
            Direction::Backward => "bck",
        };
        let mode = if self.searching { "searching" } else { "anchored" };
        let cg = if self.capture_tracking { "_cg" } else { "" };
        format!("{suggested}_{dir}_{mode}{cg}")
    }
}

/// Collects each distinct matcher the NFA's transitions use, tagging it
/// with a fresh `CharClassID` allocated from the request's shared buffer —
/// the equivalence classes subset construction partitions the input
/// alphabet into.
fn distinct_matchers(nfa: &Nfa, buffer: &mut CompilationBuffer) -> Vec<(CharClassID, CharMatcher)> {
    let mut out: Vec<(CharClassID, CharMatcher)> = Vec::new();
    for state in nfa.states() {
        for t in &state.transitions {
            if !out.iter().any(|(_, m)| m == &t.matcher) {
                out.push((buffer.alloc_char_class(), t.matcher.clone()));
            }
        }
    }
    out
}

fn reverse_epsilon_closure(nfa: &Nfa, buffer: &mut CompilationBuffer, state: StateID) -> Vec<StateID> {
    let scratch = buffer.state_set_scratch();
    scratch.push(state);
    let mut i = 0;
    while i < scratch.len() {
        let current = scratch[i];
        for (from_idx, from_state) in nfa.states().iter().enumerate() {
            if from_state.epsilon_transitions.contains(&current) {
                let from = StateID::new(from_idx as u32);
                if !scratch.contains(&from) {
                    scratch.push(from);
                }
            }
        }
        i += 1;
    }
    scratch.sort_unstable_by_key(StateID::raw);
    scratch.dedup();
    scratch.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parser::Parser;
    use crate::ast::RegexAst;
    use crate::buffer::CompilationBuffer;
    use crate::nfa::NfaBuilder;
    use crate::source::{RegexFlags, RegexSource};

    struct NoopHandle;
    impl DfaRequestHandle for NoopHandle {
        fn create_dfa_executor(
            &self,
            _nfa: &Nfa,
            _props: &RegexProperties,
            _direction: Direction,
            _searching: bool,
            _capture_tracking: bool,
            _name: &str,
        ) -> Result<DfaExecutor> {
            unreachable!("not exercised in these tests")
        }
    }

    fn build(pattern: &str) -> (RegexAst, Nfa) {
        let source = RegexSource::new(pattern, RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = Parser::new(&source, &options, &mut buffer).parse().unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        (ast, nfa)
    }

    #[test]
    fn literal_pattern_builds_one_dfa_state_per_char_plus_accept() {
        let (ast, nfa) = build("ab");
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let handle = NoopHandle;
        let mut gen = DfaGenerator::new(
            &handle,
            &nfa,
            ast.properties(),
            &mut buffer,
            &options,
            Direction::Forward,
            true,
            false,
        );
        gen.calc_dfa().unwrap();
        let executor = gen.create_executor();
        assert_eq!(executor.state_count(), 3);
        assert!(!executor.has_capture_tracking());
        assert!(executor.is_searching());
    }

    #[test]
    fn debug_name_encodes_parameters() {
        let (_ast, nfa) = build("a");
        let props = RegexProperties::default();
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let handle = NoopHandle;
        let gen = DfaGenerator::new(
            &handle,
            &nfa,
            &props,
            &mut buffer,
            &options,
            Direction::Backward,
            false,
            true,
        );
        assert_eq!(gen.debug_name("dfa"), "dfa_bck_anchored_cg");
    }
}
