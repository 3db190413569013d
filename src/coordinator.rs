//! The Request Coordinator: the single entry point that owns a compilation
//! request end to end, wrapping parsing, NFA construction, and DFA
//! construction behind one request-scoped object that selects among the
//! matcher variants.

use std::cell::RefCell;
use std::sync::Arc;

use log::{debug, warn};

use crate::ast::{RegexAst, RegexProperties};
use crate::buffer::CompilationBuffer;
use crate::dfa::{DfaExecutor, DfaGenerator, DfaRequestHandle, Direction};
use crate::errors::Result;
use crate::feature_gate::FeatureGate;
use crate::flavor::FlavorDispatch;
use crate::matcher::{CompiledMatcher, LazyDfaSearch, LiteralEngine};
use crate::nfa::tracefinder::{NfaTraceFinder, PreCalculatedResultFactory, TraceFinderNfa};
use crate::nfa::{Nfa, NfaBuilder};
use crate::observability::{
    AutomatonSizeRecord, DumpWriter, NullDumpWriter, PhaseTimer, LOG_BAILOUT_MESSAGES,
};
use crate::options::RegexOptions;
use crate::source::RegexSource;

/// Placeholder for whatever root object the embedding engine's language
/// layer hands the literal-matcher and lazy-search assembly steps. This
/// pipeline never inspects it.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostRoot;

/// Owns one compilation request from source to matcher variant. Holds its
/// `CompilationBuffer` in a `RefCell` so the lazy-DFA assembly stage can
/// reuse the same buffer across several DFA builds through a shared `&self`
/// API; never behind `Arc`/`Mutex` — single-threaded-per-request,
/// parallel-across-requests, no cross-thread synchronization.
pub struct RequestCoordinator {
    source: RegexSource,
    options: RegexOptions,
    buffer: RefCell<CompilationBuffer>,
    dump_writer: Box<dyn DumpWriter>,
}

impl RequestCoordinator {
    /// Builds a coordinator for `source` under `options`, with automaton
    /// dumping wired to a `FileDumpWriter` rooted at `options.dump_dir` when
    /// `options.dump_automata` is set, or to `NullDumpWriter` otherwise.
    pub fn new(source: RegexSource, options: RegexOptions) -> Self {
        let dump_writer: Box<dyn DumpWriter> = if options.dump_automata {
            Box::new(crate::observability::FileDumpWriter::new(options.dump_dir.clone()))
        } else {
            Box::new(NullDumpWriter)
        };
        Self {
            source,
            options,
            buffer: RefCell::new(CompilationBuffer::new()),
            dump_writer,
        }
    }

    /// Runs the full pipeline, early-returning a matcher variant as soon as
    /// one is determined. On `Unsupported`, re-raises with the reason
    /// prefixed `"TRegex: "` and the source attached, after emitting an
    /// automaton-size record with `compiler_result = "bailout"`.
    pub fn compile(&mut self) -> Result<CompiledMatcher> {
        match self.compile_inner() {
            Ok(matcher) => Ok(matcher),
            Err(err) => {
                self.emit_size_record(None, None, "bailout");
                Err(err.with_source_context(self.source.pattern()))
            }
        }
    }

    fn compile_inner(&mut self) -> Result<CompiledMatcher> {
        let ast = {
            let _timer = PhaseTimer::start("parse");
            let translated = FlavorDispatch::for_regex(&self.source).to_ecmascript()?;
            let parser =
                crate::ast::parser::Parser::new(&translated, &self.options, self.buffer.get_mut());
            parser.parse()?
        };

        FeatureGate::check(ast.properties())?;

        if ast.is_dead() {
            self.emit_size_record(Some(&ast), None, "dead");
            return Ok(CompiledMatcher::Dead);
        }

        if let Some(literal) = LiteralEngine::try_create(&HostRoot, &ast) {
            self.emit_size_record(Some(&ast), None, "literal");
            return Ok(CompiledMatcher::Literal(literal));
        }

        let nfa = {
            let _timer = PhaseTimer::start("nfa");
            NfaBuilder::create(&ast, self.buffer.get_mut())?
        };

        if nfa.is_dead() {
            self.emit_size_record(Some(&ast), Some(&nfa), "dead");
            return Ok(CompiledMatcher::Dead);
        }

        self.emit_size_record(Some(&ast), Some(&nfa), "tregex");
        Ok(CompiledMatcher::NfaExec {
            number_of_capture_groups: ast.number_of_capture_groups(),
            nfa: Arc::new(nfa),
        })
    }

    /// Assembles a lazily-compiled DFA search bundle for an already-built
    /// `ast`/`nfa` pair. `_host_root` is borrowed for this call only and
    /// never stored.
    pub fn compile_lazy_dfa_executor(
        &self,
        _host_root: &HostRoot,
        ast: &RegexAst,
        nfa: &Nfa,
    ) -> Result<LazyDfaSearch> {
        let props = ast.properties();
        let mut pre_calc: Option<Vec<PreCalculatedResultFactory>> = None;
        let mut trace_finder: Option<TraceFinderNfa> = None;

        if !props.has_alternations && !props.has_look_around_assertions && !props.has_loops {
            pre_calc = Some(vec![singleton_factory(ast, nfa)]);
        } else if self.options.trace_finder_enabled && !props.has_loops {
            match NfaTraceFinder::generate(nfa) {
                Ok(tf) => {
                    pre_calc = Some(tf.pre_calculated_results().to_vec());
                    trace_finder = Some(tf);
                }
                Err(err) => {
                    debug!(target: LOG_BAILOUT_MESSAGES, "TraceFinder bailout: {err}");
                    pre_calc = None;
                }
            }
        }

        let need_capture_tracker =
            (props.has_capture_groups || props.has_look_around_assertions) && pre_calc.is_none();

        let forward =
            self.create_dfa_executor(nfa, props, Direction::Forward, true, false, "forward")?;

        let capture_tracker = if need_capture_tracker {
            Some(self.create_dfa_executor(nfa, props, Direction::Forward, false, true, "capture")?)
        } else {
            None
        };

        // A multi-template table can't be resolved by scanning the main NFA
        // backward — that traversal has no way to tell which accepting path
        // the forward match took, so the locator DFA is built over the
        // TraceFinder NFA's own reverse graph instead (already reversed, so
        // walked forward here). Otherwise: no table, or an NFA whose match
        // doesn't necessarily start at position 0, still needs the ordinary
        // backward scan over the main NFA. A singleton table anchored at the
        // start already has its match start pinned at 0, so no backward
        // locator is built at all.
        let backward = if let Some(entries) = &pre_calc {
            if entries.len() >= 2 {
                let tf = trace_finder
                    .as_ref()
                    .expect("a >=2-entry pre_calc table is only produced by TraceFinder");
                Some(self.create_dfa_executor(
                    tf.reverse_nfa(),
                    props,
                    Direction::Forward,
                    false,
                    false,
                    "backward",
                )?)
            } else if !nfa.has_reverse_unanchored_entry() {
                Some(self.create_dfa_executor(nfa, props, Direction::Backward, false, false, "backward")?)
            } else {
                None
            }
        } else {
            Some(self.create_dfa_executor(nfa, props, Direction::Backward, false, false, "backward")?)
        };

        Ok(LazyDfaSearch {
            pre_calc,
            forward,
            backward,
            capture_tracker,
        })
    }

    /// Builds AST and NFA from scratch, asserting support and non-deadness,
    /// then a single forward/searching/capture-tracking DFA. Used by
    /// regression-test mode.
    pub fn compile_eager_dfa_executor(&mut self) -> Result<DfaExecutor> {
        let translated = FlavorDispatch::for_regex(&self.source).to_ecmascript()?;
        let parser =
            crate::ast::parser::Parser::new(&translated, &self.options, self.buffer.get_mut());
        let ast = parser.parse()?;

        // Re-checked explicitly even though a well-behaved caller already
        // called `FeatureGate::is_supported`: this entry point is reachable
        // directly (regression-test mode) without going through `compile()`.
        FeatureGate::check(ast.properties())?;
        assert!(!ast.is_dead(), "compile_eager_dfa_executor requires a non-dead AST");

        let nfa = NfaBuilder::create(&ast, self.buffer.get_mut())?;
        assert!(!nfa.is_dead(), "compile_eager_dfa_executor requires a non-dead NFA");

        self.create_dfa_executor(&nfa, ast.properties(), Direction::Forward, true, true, "eager")
    }

    fn create_dfa_executor(
        &self,
        nfa: &Nfa,
        props: &RegexProperties,
        direction: Direction,
        searching: bool,
        capture_tracking: bool,
        name: &str,
    ) -> Result<DfaExecutor> {
        // Borrowed through the `RefCell` rather than held as `&mut self`, so
        // this stays reachable through `&dyn DfaRequestHandle` while still
        // reusing the one request-scoped buffer across the forward/backward
        // /capture-tracker builds `compile_lazy_dfa_executor` issues.
        let mut buffer = self.buffer.borrow_mut();
        let mut generator = DfaGenerator::new(
            self,
            nfa,
            props,
            &mut buffer,
            &self.options,
            direction,
            searching,
            capture_tracking,
        );
        generator.calc_dfa()?;
        let executor = generator.create_executor();
        if self.options.dump_automata {
            let dot = render_dot(&executor, name);
            if let Err(err) = self.dump_writer.write_dfa(&generator.debug_name(name), &dot, "") {
                warn!("failed to write DFA dump for '{name}': {err}");
            }
        }
        Ok(executor)
    }

    fn emit_size_record(&self, ast: Option<&RegexAst>, nfa: Option<&Nfa>, compiler_result: &'static str) {
        let record = AutomatonSizeRecord {
            pattern: self.source.pattern().to_string(),
            flags: self.source.flags().to_string(),
            props: ast.map(|a| *a.properties()).unwrap_or_default(),
            ast_nodes: ast.map(RegexAst::number_of_nodes).unwrap_or(0),
            nfa_states: nfa.map(Nfa::num_states),
            nfa_transitions: nfa.map(Nfa::num_transitions),
            dfa_states_fwd: None,
            dfa_states_bck: None,
            dfa_states_cg: None,
            trace_finder: false,
            compiler_result,
        };
        record.emit();
    }
}

impl DfaRequestHandle for RequestCoordinator {
    fn create_dfa_executor(
        &self,
        nfa: &Nfa,
        props: &RegexProperties,
        direction: Direction,
        searching: bool,
        capture_tracking: bool,
        name: &str,
    ) -> Result<DfaExecutor> {
        RequestCoordinator::create_dfa_executor(self, nfa, props, direction, searching, capture_tracking, name)
    }
}

#[cfg(feature = "dot_writer")]
fn render_dot(executor: &DfaExecutor, label: &str) -> String {
    crate::observability::render_dfa_dot(executor, label)
}

#[cfg(not(feature = "dot_writer"))]
fn render_dot(_executor: &DfaExecutor, _label: &str) -> String {
    String::new()
}

fn singleton_factory(ast: &RegexAst, nfa: &Nfa) -> PreCalculatedResultFactory {
    PreCalculatedResultFactory {
        path: vec![nfa.start_state(), nfa.end_state()],
        length: ast.min_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RegexFlags;

    fn coordinator(pattern: &str) -> RequestCoordinator {
        RequestCoordinator::new(
            RegexSource::new(pattern, RegexFlags::default()),
            RegexOptions::default(),
        )
    }

    #[test]
    fn literal_pattern_compiles_to_literal_matcher() {
        let mut coord = coordinator("abc");
        let matcher = coord.compile().unwrap();
        assert!(matches!(matcher, CompiledMatcher::Literal(_)));
    }

    #[test]
    fn alternation_with_capture_compiles_to_nfa_exec() {
        let mut coord = coordinator("(a|b)c");
        let matcher = coord.compile().unwrap();
        match matcher {
            CompiledMatcher::NfaExec { number_of_capture_groups, .. } => {
                assert_eq!(number_of_capture_groups, 1);
            }
            other => panic!("expected NfaExec, got {other:?}"),
        }
    }

    #[test]
    fn negative_lookahead_is_unsupported_with_tregex_prefix() {
        let mut coord = coordinator("(?!x)y");
        let err = coord.compile().unwrap_err();
        let reason = err.as_unsupported_reason().unwrap();
        assert!(reason.starts_with("TRegex: "));
        assert!(reason.contains("negative lookahead"));
    }

    #[test]
    fn backreference_is_unsupported() {
        let mut coord = coordinator(r"\1(a)");
        assert!(coord.compile().is_err());
    }

    #[test]
    fn large_counted_repetition_is_unsupported() {
        let mut coord = coordinator("a{0,100000}");
        let err = coord.compile().unwrap_err();
        assert!(err
            .as_unsupported_reason()
            .unwrap()
            .contains("bounds of range quantifier too high"));
    }

    #[test]
    fn empty_bracket_class_is_dead() {
        let mut coord = coordinator("[]");
        let matcher = coord.compile().unwrap();
        assert!(matches!(matcher, CompiledMatcher::Dead));
    }

    #[test]
    fn loop_pattern_lazy_path_builds_forward_and_backward_without_capture_tracker() {
        let coord = coordinator("a*b");
        let source = RegexSource::new("a*b", RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        assert!(lazy.pre_calc.is_none());
        assert!(lazy.backward.is_some());
        assert!(lazy.capture_tracker.is_none());
    }

    #[test]
    fn single_alternation_free_pattern_takes_singleton_pre_calc_fast_path() {
        let coord = coordinator("abc");
        let source = RegexSource::new("abc", RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        let pre_calc = lazy.pre_calc.unwrap();
        assert_eq!(pre_calc.len(), 1);
        // Unanchored, so the match can start past position 0; a singleton
        // template already pins the match length, so no backward locator
        // is needed to find where it started.
        assert!(lazy.backward.is_none());
    }

    #[test]
    fn anchored_singleton_pattern_still_needs_a_backward_locator() {
        let coord = coordinator("^abc");
        let source = RegexSource::new("^abc", RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        let pre_calc = lazy.pre_calc.unwrap();
        assert_eq!(pre_calc.len(), 1);
        assert!(lazy.backward.is_some());
    }

    #[test]
    fn multi_template_trace_finder_pattern_builds_backward_from_the_reverse_graph() {
        let coord = coordinator("(a|bb)");
        let source = RegexSource::new("(a|bb)", RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        let pre_calc = lazy.pre_calc.unwrap();
        assert!(pre_calc.len() >= 2);
        assert!(lazy.backward.is_some());
    }

    #[test]
    fn loop_free_lookahead_is_resolved_by_trace_finder_without_a_capture_tracker() {
        let source = RegexSource::new("(?=x)y", RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let coord = RequestCoordinator::new(source, options);
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        assert!(lazy.pre_calc.is_some());
        assert!(lazy.capture_tracker.is_none());
    }

    #[test]
    fn lookahead_needs_a_capture_tracker_when_trace_finder_is_disabled() {
        let source = RegexSource::new("(?=x)y", RegexFlags::default());
        let options = RegexOptions::default().with_trace_finder_enabled(false);
        let mut buffer = CompilationBuffer::new();
        let ast = crate::ast::parser::Parser::new(&source, &options, &mut buffer)
            .parse()
            .unwrap();
        let nfa = NfaBuilder::create(&ast, &mut buffer).unwrap();
        let coord = RequestCoordinator::new(source, options);
        let lazy = coord.compile_lazy_dfa_executor(&HostRoot, &ast, &nfa).unwrap();
        assert!(lazy.pre_calc.is_none());
        assert!(lazy.capture_tracker.is_some());
    }

    #[test]
    fn eager_dfa_executor_builds_a_single_capture_tracking_forward_dfa() {
        let mut coord = coordinator("(a|b)c");
        let executor = coord.compile_eager_dfa_executor().unwrap();
        assert!(executor.has_capture_tracking());
        assert!(executor.is_searching());
    }

    #[test]
    fn eager_dfa_executor_rejects_unsupported_patterns() {
        let mut coord = coordinator(r"\1(a)");
        assert!(coord.compile_eager_dfa_executor().is_err());
    }
}
