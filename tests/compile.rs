//! End-to-end scenarios covering the matcher-variant decision tree and the
//! pipeline's documented boundary cases.

use tregex::{CompiledMatcher, HostRoot, RegexFlags, RegexOptions, RegexSource, RequestCoordinator};

fn coordinator(pattern: &str) -> RequestCoordinator {
    RequestCoordinator::new(
        RegexSource::new(pattern, RegexFlags::default()),
        RegexOptions::default(),
    )
}

#[test]
fn literal_pattern_compiles_to_a_literal_scanner() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut coord = coordinator("hello");
    let matcher = coord.compile().unwrap();
    match matcher {
        CompiledMatcher::Literal(literal) => assert_eq!(literal.pattern(), "hello"),
        other => panic!("expected Literal, got {other:?}"),
    }
}

#[test]
fn alternation_with_capture_group_compiles_to_nfa_interpreter() {
    let mut coord = coordinator("(cat|dog)s?");
    let matcher = coord.compile().unwrap();
    match matcher {
        CompiledMatcher::NfaExec { number_of_capture_groups, .. } => {
            assert_eq!(number_of_capture_groups, 1);
        }
        other => panic!("expected NfaExec, got {other:?}"),
    }
}

#[test]
fn positive_lookahead_is_supported_and_reaches_the_nfa_stage() {
    let mut coord = coordinator("foo(?=bar)");
    let matcher = coord.compile().unwrap();
    assert!(matches!(matcher, CompiledMatcher::NfaExec { .. }));
}

#[test]
fn negative_lookahead_is_rejected() {
    let mut coord = coordinator("foo(?!bar)");
    let err = coord.compile().unwrap_err();
    assert_eq!(
        err.as_unsupported_reason(),
        Some("TRegex: negative lookahead assertions not supported")
    );
}

#[test]
fn backreference_is_rejected() {
    let mut coord = coordinator(r"(a)\1");
    let err = coord.compile().unwrap_err();
    assert_eq!(
        err.as_unsupported_reason(),
        Some("TRegex: backreferences not supported")
    );
}

#[test]
fn oversized_counted_repetition_is_rejected() {
    let mut coord = coordinator("x{0,50000}");
    let err = coord.compile().unwrap_err();
    assert_eq!(
        err.as_unsupported_reason(),
        Some("TRegex: bounds of range quantifier too high")
    );
}

#[test]
fn loop_pattern_reaches_lazy_dfa_assembly_with_forward_and_backward_dfas() {
    let source = RegexSource::new("a*b", RegexFlags::default());
    let options = RegexOptions::default();
    let mut buffer = tregex::CompilationBuffer::new();
    let ast = tregex::ast::parser::Parser::new(&source, &options, &mut buffer)
        .parse()
        .unwrap();
    let nfa = tregex::nfa::NfaBuilder::create(&ast, &mut buffer).unwrap();

    let coord = RequestCoordinator::new(source, options);
    let lazy = coord
        .compile_lazy_dfa_executor(&HostRoot, &ast, &nfa)
        .unwrap();
    assert!(lazy.pre_calc.is_none());
    assert!(lazy.backward.is_some());
    assert!(lazy.capture_tracker.is_none());
    assert!(lazy.forward.is_searching());
}

#[test]
fn empty_pattern_compiles_to_the_empty_literal() {
    let mut coord = coordinator("");
    let matcher = coord.compile().unwrap();
    match matcher {
        CompiledMatcher::Literal(literal) => assert_eq!(literal.pattern(), ""),
        other => panic!("expected Literal, got {other:?}"),
    }
}

#[test]
fn empty_bracket_class_compiles_to_dead() {
    let mut coord = coordinator("[]");
    let matcher = coord.compile().unwrap();
    assert!(matches!(matcher, CompiledMatcher::Dead));
}

#[test]
fn literal_only_pattern_skips_nfa_and_dfa_construction() {
    let mut coord = coordinator("literal_only");
    let matcher = coord.compile().unwrap();
    assert!(matches!(matcher, CompiledMatcher::Literal(_)));
}

#[test]
fn captures_only_pattern_reaches_nfa_stage_with_correct_group_count() {
    let mut coord = coordinator("(a)(b)(c)");
    let matcher = coord.compile().unwrap();
    match matcher {
        CompiledMatcher::NfaExec { number_of_capture_groups, .. } => {
            assert_eq!(number_of_capture_groups, 3);
        }
        other => panic!("expected NfaExec, got {other:?}"),
    }
}

#[test]
fn lookaround_only_pattern_is_resolved_by_trace_finder_without_a_capture_tracker() {
    let source = RegexSource::new("(?=x)y", RegexFlags::default());
    let options = RegexOptions::default();
    let mut buffer = tregex::CompilationBuffer::new();
    let ast = tregex::ast::parser::Parser::new(&source, &options, &mut buffer)
        .parse()
        .unwrap();
    let nfa = tregex::nfa::NfaBuilder::create(&ast, &mut buffer).unwrap();

    let coord = RequestCoordinator::new(source, options);
    let lazy = coord
        .compile_lazy_dfa_executor(&HostRoot, &ast, &nfa)
        .unwrap();
    assert!(lazy.pre_calc.is_some());
    assert!(lazy.capture_tracker.is_none());
}

#[test]
fn alternation_with_captures_needs_a_capture_tracking_dfa_when_no_trace_finder_runs() {
    let source = RegexSource::new("(a|bb)", RegexFlags::default());
    let options = RegexOptions::default().with_trace_finder_enabled(false);
    let mut buffer = tregex::CompilationBuffer::new();
    let ast = tregex::ast::parser::Parser::new(&source, &options, &mut buffer)
        .parse()
        .unwrap();
    let nfa = tregex::nfa::NfaBuilder::create(&ast, &mut buffer).unwrap();

    let coord = RequestCoordinator::new(source, options);
    let lazy = coord
        .compile_lazy_dfa_executor(&HostRoot, &ast, &nfa)
        .unwrap();
    assert!(lazy.pre_calc.is_none());
    assert!(lazy.capture_tracker.is_some());
}

#[test]
fn eager_dfa_executor_entry_point_builds_a_single_capture_tracking_dfa() {
    // The engine layer calls this entry point directly when
    // `RegexOptions::regression_test_mode` is set, bypassing the lazy path.
    let options = RegexOptions::default().with_regression_test_mode(true);
    let mut coord = RequestCoordinator::new(
        RegexSource::new("(a|b)c", RegexFlags::default()),
        options,
    );
    let executor = coord.compile_eager_dfa_executor().unwrap();
    assert!(executor.has_capture_tracking());
}
