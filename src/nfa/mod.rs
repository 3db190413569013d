//! The NFA Builder Adapter: Thompson construction from a `RegexAst` into an
//! `Nfa` via fragment-splicing combinators (`concat`, `alternation`,
//! `zero_or_one`, `zero_or_more`, `one_or_more`, `shift_ids`, `append`).

pub mod tracefinder;

use crate::ast::{
    Ast, AssertionKind, ClassBracketed, GroupKind, PerlClass, RepetitionOp, RepetitionRange,
};
use crate::buffer::CompilationBuffer;
use crate::errors::{RegexError, Result};
use crate::ids::StateID;

/// A single construction exceeding this many states raises `Unsupported`.
pub const MAX_NFA_STATES: usize = 50_000;

/// What a single NFA transition matches on one input character.
#[derive(Debug, Clone, PartialEq)]
pub enum CharMatcher {
    /// A single literal character.
    Literal(char),
    /// `.`
    Dot,
    /// A Perl class shorthand.
    Perl(PerlClass),
    /// A bracketed character class.
    Class(ClassBracketed),
}

impl CharMatcher {
    /// Evaluates the matcher against one input character.
    pub fn matches(&self, c: char) -> bool {
        match self {
            CharMatcher::Literal(lit) => *lit == c,
            CharMatcher::Dot => c != '\n',
            CharMatcher::Perl(p) => {
                let positive = match p {
                    PerlClass::Digit(_) => c.is_ascii_digit(),
                    PerlClass::Word(_) => c.is_alphanumeric() || c == '_',
                    PerlClass::Space(_) => c.is_whitespace(),
                };
                positive != p.negated()
            }
            CharMatcher::Class(class) => {
                let hit = class.items.iter().any(|item| match item {
                    crate::ast::ClassItem::Char(ch) => *ch == c,
                    crate::ast::ClassItem::Range(lo, hi) => (*lo..=*hi).contains(&c),
                    crate::ast::ClassItem::Perl(p) => {
                        CharMatcher::Perl(*p).matches(c)
                    }
                });
                hit != class.negated
            }
        }
    }
}

/// A labeled transition out of an `NfaState`.
#[derive(Debug, Clone)]
pub struct NfaTransition {
    /// What this transition matches.
    pub matcher: CharMatcher,
    /// The target state.
    pub target: StateID,
}

/// One state of the NFA: zero or more epsilon transitions and zero or more
/// labeled transitions.
#[derive(Debug, Clone, Default)]
pub struct NfaState {
    /// Epsilon (unlabeled) transitions.
    pub epsilon_transitions: Vec<StateID>,
    /// Labeled transitions.
    pub transitions: Vec<NfaTransition>,
}

impl NfaState {
    fn offset(&mut self, offset: usize) {
        for e in &mut self.epsilon_transitions {
            *e = StateID::new(e.raw() + offset as u32);
        }
        for t in &mut self.transitions {
            t.target = StateID::new(t.target.raw() + offset as u32);
        }
    }
}

/// The NFA produced by the NFA Builder Adapter.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<NfaState>,
    start_state: StateID,
    end_state: StateID,
    dead: bool,
    has_reverse_unanchored_entry: bool,
}

impl Nfa {
    fn empty_fragment() -> Self {
        Self {
            states: vec![NfaState::default()],
            start_state: StateID::default(),
            end_state: StateID::default(),
            dead: false,
            has_reverse_unanchored_entry: true,
        }
    }

    fn is_empty(&self) -> bool {
        self.start_state == self.end_state
            && self.states.len() == 1
            && self.states[0].epsilon_transitions.is_empty()
            && self.states[0].transitions.is_empty()
    }

    fn new_state(&mut self, buffer: &mut CompilationBuffer) -> Result<StateID> {
        let id = StateID::new(self.states.len() as u32);
        self.states.push(NfaState::default());
        if buffer.alloc_state().as_usize() >= MAX_NFA_STATES {
            return Err(RegexError::unsupported(format!(
                "NFA exceeds the {MAX_NFA_STATES}-state construction limit"
            )));
        }
        Ok(id)
    }

    fn add_epsilon_transition(&mut self, from: StateID, to: StateID) {
        self.states[from.as_usize()].epsilon_transitions.push(to);
    }

    fn add_transition(&mut self, from: StateID, matcher: CharMatcher, to: StateID) {
        self.states[from.as_usize()]
            .transitions
            .push(NfaTransition { matcher, target: to });
    }

    fn shift_ids(&mut self, offset: usize) -> (StateID, StateID) {
        for state in &mut self.states {
            state.offset(offset);
        }
        self.start_state = StateID::new(self.start_state.raw() + offset as u32);
        self.end_state = StateID::new(self.end_state.raw() + offset as u32);
        (self.start_state, self.end_state)
    }

    fn append(&mut self, mut other: Nfa) {
        self.states.append(&mut other.states);
    }

    fn concat(&mut self, other: Nfa) {
        if self.is_empty() {
            *self = other;
            return;
        }
        let mut other = other;
        let (other_start, other_end) = other.shift_ids(self.states.len());
        let old_end = self.end_state;
        self.append(other);
        self.add_epsilon_transition(old_end, other_start);
        self.end_state = other_end;
    }

    fn alternation(&mut self, other: Nfa, buffer: &mut CompilationBuffer) -> Result<()> {
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        let mut other = other;
        let (other_start, other_end) = other.shift_ids(self.states.len());
        self.append(other);

        let start = self.new_state(buffer)?;
        self.add_epsilon_transition(start, self.start_state);
        self.add_epsilon_transition(start, other_start);

        let end = self.new_state(buffer)?;
        self.add_epsilon_transition(self.end_state, end);
        self.add_epsilon_transition(other_end, end);

        self.start_state = start;
        self.end_state = end;
        Ok(())
    }

    fn zero_or_one(&mut self, buffer: &mut CompilationBuffer) -> Result<()> {
        let start = self.new_state(buffer)?;
        self.add_epsilon_transition(start, self.start_state);
        self.add_epsilon_transition(start, self.end_state);
        self.start_state = start;
        Ok(())
    }

    fn zero_or_more(&mut self, buffer: &mut CompilationBuffer) -> Result<()> {
        let start = self.new_state(buffer)?;
        self.add_epsilon_transition(start, self.start_state);
        self.add_epsilon_transition(start, self.end_state);

        let end = self.new_state(buffer)?;
        self.add_epsilon_transition(self.end_state, end);
        self.add_epsilon_transition(self.end_state, self.start_state);

        self.start_state = start;
        self.end_state = end;
        Ok(())
    }

    fn one_or_more(&mut self, buffer: &mut CompilationBuffer) -> Result<()> {
        let start = self.new_state(buffer)?;
        self.add_epsilon_transition(start, self.start_state);

        let end = self.new_state(buffer)?;
        self.add_epsilon_transition(self.end_state, end);
        self.add_epsilon_transition(self.end_state, self.start_state);

        self.start_state = start;
        self.end_state = end;
        Ok(())
    }

    /// The states of the NFA, state 0 need not be the start state once
    /// fragments have been spliced together; use `start_state`/`end_state`.
    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    /// The start state.
    pub fn start_state(&self) -> StateID {
        self.start_state
    }

    /// The accepting state.
    pub fn end_state(&self) -> StateID {
        self.end_state
    }

    /// True when no input reaches `end_state` from `start_state` — the NFA
    /// can never produce a match.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// True when the pattern does not force its match to begin exactly at
    /// the input's start, i.e. a backward DFA scanning for the leftmost
    /// match start needs to consider more than one entry point. Computed
    /// once at construction time from whether the AST's root begins with
    /// an unconditional `^` anchor.
    pub fn has_reverse_unanchored_entry(&self) -> bool {
        self.has_reverse_unanchored_entry
    }

    /// Number of states, for the automaton-size observability record.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Number of labeled (non-epsilon) transitions, for the automaton-size
    /// observability record.
    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Builds the graph with every transition flipped and start/end swapped,
    /// so a forward traversal of the result walks the original NFA
    /// backward. Used by the TraceFinder builder, which needs an actual
    /// reverse state graph rather than the `Direction::Backward` traversal
    /// `DfaGenerator` performs in place over the forward graph.
    pub fn reversed(&self) -> Nfa {
        let mut states = vec![NfaState::default(); self.states.len()];
        for (from_idx, state) in self.states.iter().enumerate() {
            let from = StateID::new(from_idx as u32);
            for &to in &state.epsilon_transitions {
                states[to.as_usize()].epsilon_transitions.push(from);
            }
            for t in &state.transitions {
                states[t.target.as_usize()].transitions.push(NfaTransition {
                    matcher: t.matcher.clone(),
                    target: from,
                });
            }
        }
        Nfa {
            states,
            start_state: self.end_state,
            end_state: self.start_state,
            dead: self.dead,
            has_reverse_unanchored_entry: self.has_reverse_unanchored_entry,
        }
    }

    /// The epsilon closure of a single state.
    pub fn epsilon_closure(&self, state: StateID) -> Vec<StateID> {
        self.epsilon_closure_set(std::iter::once(state))
    }

    /// The epsilon closure of a set of states.
    pub fn epsilon_closure_set(&self, states: impl IntoIterator<Item = StateID>) -> Vec<StateID> {
        let mut closure: Vec<StateID> = states.into_iter().collect();
        let mut i = 0;
        while i < closure.len() {
            let current = closure[i];
            for &next in &self.states[current.as_usize()].epsilon_transitions {
                if !closure.contains(&next) {
                    closure.push(next);
                }
            }
            i += 1;
        }
        closure.sort_unstable_by_key(StateID::raw);
        closure.dedup();
        closure
    }

    /// `move(T, c)`: the set of states reachable from `states` by matching
    /// character `c`.
    pub fn move_on(&self, states: &[StateID], c: char) -> Vec<StateID> {
        let mut out = Vec::new();
        for &state in states {
            for transition in &self.states[state.as_usize()].transitions {
                if transition.matcher.matches(c) && !out.contains(&transition.target) {
                    out.push(transition.target);
                }
            }
        }
        out
    }

    fn compute_dead(&self) -> bool {
        !self
            .epsilon_closure_reachable_via_any_transition()
            .contains(&self.end_state)
    }

    /// BFS over epsilon transitions and labeled transitions (any label
    /// counts as traversable — we only need reachability, not which
    /// characters reach it) from `start_state`.
    fn epsilon_closure_reachable_via_any_transition(&self) -> Vec<StateID> {
        let mut seen = vec![self.start_state];
        let mut i = 0;
        while i < seen.len() {
            let current = seen[i];
            let state = &self.states[current.as_usize()];
            for &e in &state.epsilon_transitions {
                if !seen.contains(&e) {
                    seen.push(e);
                }
            }
            for t in &state.transitions {
                if !seen.contains(&t.target) {
                    seen.push(t.target);
                }
            }
            i += 1;
        }
        seen
    }
}

/// Builds an `Nfa` from a `RegexAst`'s root expression.
pub struct NfaBuilder;

impl NfaBuilder {
    /// Builds the NFA for `ast`'s root expression. Deterministic in the
    /// AST; may raise `Unsupported` if construction exceeds
    /// `MAX_NFA_STATES`.
    pub fn create(ast: &crate::ast::RegexAst, buffer: &mut CompilationBuffer) -> Result<Nfa> {
        let mut nfa = Self::from_ast(ast.root(), buffer)?;
        if nfa.states.len() > MAX_NFA_STATES {
            return Err(RegexError::unsupported(format!(
                "NFA exceeds the {MAX_NFA_STATES}-state construction limit"
            )));
        }
        nfa.has_reverse_unanchored_entry = !starts_with_unconditional_anchor(ast.root());
        nfa.dead = nfa.compute_dead();
        Ok(nfa)
    }

    fn from_ast(ast: &Ast, buffer: &mut CompilationBuffer) -> Result<Nfa> {
        match ast {
            Ast::Empty => Ok(Nfa::empty_fragment()),
            Ast::Literal(c) => Self::single_transition(CharMatcher::Literal(*c), buffer),
            Ast::Dot => Self::single_transition(CharMatcher::Dot, buffer),
            Ast::ClassPerl(p) => Self::single_transition(CharMatcher::Perl(*p), buffer),
            Ast::ClassBracketed(c) => Self::single_transition(CharMatcher::Class(c.clone()), buffer),
            Ast::Backreference(_) => Ok(Nfa::empty_fragment()),
            Ast::Assertion(_) => Ok(Nfa::empty_fragment()),
            Ast::Concat(asts) => {
                let mut nfa = Nfa::empty_fragment();
                for a in asts {
                    nfa.concat(Self::from_ast(a, buffer)?);
                }
                Ok(nfa)
            }
            Ast::Alternation(asts) => {
                let mut nfa = Nfa::empty_fragment();
                for a in asts {
                    let branch = Self::from_ast(a, buffer)?;
                    nfa.alternation(branch, buffer)?;
                }
                Ok(nfa)
            }
            Ast::Group(g) => {
                debug_assert!(matches!(
                    g.kind,
                    GroupKind::Capturing(..) | GroupKind::NonCapturing
                ));
                Self::from_ast(&g.ast, buffer)
            }
            Ast::Repetition(r) => {
                let body = Self::from_ast(&r.ast, buffer)?;
                Ok(match r.op {
                    RepetitionOp::ZeroOrOne => {
                        let mut nfa = body;
                        nfa.zero_or_one(buffer)?;
                        nfa
                    }
                    RepetitionOp::ZeroOrMore => {
                        let mut nfa = body;
                        nfa.zero_or_more(buffer)?;
                        nfa
                    }
                    RepetitionOp::OneOrMore => {
                        let mut nfa = body;
                        nfa.one_or_more(buffer)?;
                        nfa
                    }
                    RepetitionOp::Range(RepetitionRange::Exactly(m)) => {
                        let mut nfa = Nfa::empty_fragment();
                        for _ in 0..m {
                            nfa.concat(body.clone());
                        }
                        nfa
                    }
                    RepetitionOp::Range(RepetitionRange::AtLeast(m)) => {
                        let mut nfa = Nfa::empty_fragment();
                        for _ in 0..m {
                            nfa.concat(body.clone());
                        }
                        let mut tail = body;
                        tail.zero_or_more(buffer)?;
                        nfa.concat(tail);
                        nfa
                    }
                    RepetitionOp::Range(RepetitionRange::Bounded(least, most)) => {
                        let mut nfa = Nfa::empty_fragment();
                        for _ in 0..least {
                            nfa.concat(body.clone());
                        }
                        let mut optional = body;
                        optional.zero_or_one(buffer)?;
                        for _ in least..most {
                            nfa.concat(optional.clone());
                        }
                        nfa
                    }
                })
            }
        }
    }

    fn single_transition(matcher: CharMatcher, buffer: &mut CompilationBuffer) -> Result<Nfa> {
        let mut nfa = Nfa::empty_fragment();
        let end = nfa.new_state(buffer)?;
        nfa.add_transition(nfa.start_state, matcher, end);
        nfa.end_state = end;
        Ok(nfa)
    }
}

/// Whether `ast`'s leftmost leaf is an unconditional `^` anchor (i.e. not
/// under alternation, so every accepted path truly requires the match to
/// start at input position 0).
fn starts_with_unconditional_anchor(ast: &Ast) -> bool {
    match ast {
        Ast::Assertion(AssertionKind::StartLine) => true,
        Ast::Concat(asts) => asts.first().is_some_and(starts_with_unconditional_anchor),
        Ast::Group(g) => starts_with_unconditional_anchor(&g.ast),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RegexAst;
    use crate::source::RegexFlags;

    fn build(pattern: &str) -> Nfa {
        let source = crate::source::RegexSource::new(pattern, RegexFlags::default());
        let options = crate::options::RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        NfaBuilder::create(&ast, &mut buffer).unwrap()
    }

    #[test]
    fn literal_pattern_is_not_dead_and_has_one_transition_per_char() {
        let nfa = build("abc");
        assert!(!nfa.is_dead());
        assert_eq!(nfa.num_transitions(), 3);
    }

    #[test]
    fn alternation_pattern_is_not_dead() {
        let nfa = build("a|b");
        assert!(!nfa.is_dead());
    }

    #[test]
    fn star_pattern_builds_a_cycle_and_is_not_dead() {
        let nfa = build("a*b");
        assert!(!nfa.is_dead());
    }

    #[test]
    fn reversed_swaps_start_and_end_states() {
        let nfa = build("ab");
        let reverse = nfa.reversed();
        assert_eq!(reverse.start_state(), nfa.end_state());
        assert_eq!(reverse.end_state(), nfa.start_state());
        assert_eq!(reverse.num_states(), nfa.num_states());
        assert_eq!(reverse.num_transitions(), nfa.num_transitions());
    }

    #[test]
    fn anchored_pattern_has_no_reverse_unanchored_entry() {
        assert!(!build("^abc").has_reverse_unanchored_entry());
        assert!(build("abc").has_reverse_unanchored_entry());
    }

    #[test]
    fn dead_ast_is_never_handed_to_the_builder_but_builder_detects_unreachable_end_too() {
        // A concat where a later literal is spliced past an unreachable
        // fragment would show up as a dead NFA; exercised structurally via
        // the dead-AST boundary case in `ast::tests` instead, since the
        // coordinator never calls `NfaBuilder::create` on a dead AST.
        let nfa = build("a");
        assert!(!nfa.is_dead());
    }
}
