//! The five-variant matcher sum type produced by a compilation request, and
//! the Literal Engine that recognizes constant-substring patterns before any
//! automaton is built.

use std::sync::Arc;

use crate::ast::{Ast, RegexAst};
use crate::dfa::DfaExecutor;
use crate::nfa::tracefinder::PreCalculatedResultFactory;
use crate::nfa::Nfa;

/// A specialized scanner for a constant substring pattern — the cheapest
/// possible matcher, requiring neither an NFA nor a DFA.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralMatcher {
    pattern: String,
    case_insensitive: bool,
}

impl LiteralMatcher {
    /// The literal substring this matcher recognizes.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the match is case-insensitive.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

/// Recognizes patterns whose AST is nothing but a run of literal
/// characters, with no alternation, repetition, group, class, or
/// assertion. `_lang` is the out-of-scope engine language handle; this
/// pipeline never inspects it, since literal recognition depends only on
/// the AST shape and flags.
pub struct LiteralEngine;

impl LiteralEngine {
    /// Attempts to recognize `ast` as a constant substring pattern.
    pub fn try_create(_lang: &crate::coordinator::HostRoot, ast: &RegexAst) -> Option<LiteralMatcher> {
        let pattern = literal_string(ast.root())?;
        Some(LiteralMatcher {
            pattern,
            case_insensitive: ast.flags().case_insensitive,
        })
    }
}

fn literal_string(ast: &Ast) -> Option<String> {
    match ast {
        Ast::Empty => Some(String::new()),
        Ast::Literal(c) => Some(c.to_string()),
        Ast::Concat(asts) => {
            let mut out = String::new();
            for a in asts {
                out.push_str(&literal_string(a)?);
            }
            Some(out)
        }
        _ => None,
    }
}

/// Forward searcher + optional backward anchor locator + optional
/// capture-group tracker, plus an optional pre-calculated result table.
#[derive(Debug, Clone)]
pub struct LazyDfaSearch {
    /// One entry per distinct match shape the TraceFinder (or the
    /// single-factory fast path) recognized directly, if any.
    pub pre_calc: Option<Vec<PreCalculatedResultFactory>>,
    /// The forward searching DFA, built unconditionally.
    pub forward: DfaExecutor,
    /// The backward locator DFA, built when `compile_lazy_dfa_executor`'s
    /// rules call for one.
    pub backward: Option<DfaExecutor>,
    /// The forward anchored capture-tracking DFA, built only when
    /// `needCaptureTracker` held and no pre-calc table made it unnecessary.
    pub capture_tracker: Option<DfaExecutor>,
}

/// The matcher variant produced by a compilation request — exactly one per
/// successful request.
#[derive(Debug, Clone)]
pub enum CompiledMatcher {
    /// Accepts nothing.
    Dead,
    /// A specialized constant-substring scanner.
    Literal(LiteralMatcher),
    /// Interpreter over the NFA, the fallback when no DFA has been built.
    NfaExec {
        /// The compiled NFA.
        nfa: Arc<Nfa>,
        /// Number of capture groups the NFA's interpreter must track.
        number_of_capture_groups: u32,
    },
    /// The lazily-compiled DFA search bundle.
    LazyDfaSearch(LazyDfaSearch),
    /// A single eagerly-built DFA with capture tracking baked in
    /// (regression/test mode).
    EagerDfa(DfaExecutor),
}

impl CompiledMatcher {
    /// A short tag naming the variant, used by the automaton-size
    /// observability record's `compilerResult` field.
    pub fn result_tag(&self) -> &'static str {
        match self {
            CompiledMatcher::Dead => "dead",
            CompiledMatcher::Literal(_) => "literal",
            CompiledMatcher::NfaExec { .. }
            | CompiledMatcher::LazyDfaSearch(_)
            | CompiledMatcher::EagerDfa(_) => "tregex",
        }
    }
}
