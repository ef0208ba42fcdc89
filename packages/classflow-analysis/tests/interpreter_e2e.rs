//! End-to-end analysis scenarios
//!
//! Each test assembles a small method, runs the fixpoint engine in the
//! relevant domain and checks the reported verdicts and per-point states.

mod common;

use classflow_analysis::{
    analyze, AnalysisConfig, AnalysisMode, BinaryOp, CmpCond, FixpointEngine, InputValue,
    ProgramPoint, SignSet, Status, TaintValue,
};
use pretty_assertions::assert_eq;

use common::{
    execute_query, int_case, read_line, store_for, void_case, ProgramBuilder,
};

#[test]
fn divide_by_constant_zero_input() {
    // int f(int x) { return 10 / x; } with x = 0
    let m = int_case("half");
    let body = ProgramBuilder::new()
        .push_int(10)
        .load_int(0)
        .binary(BinaryOp::Div)
        .ret_int()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::default();

    let summary = analyze(&store, &config, &m, &[InputValue::Int(0)]).unwrap();
    assert!(summary.text.contains("divide by zero"));
    assert_eq!(summary.verdict, "divide by zero");
}

#[test]
fn divide_after_increment_splits_on_unknown_input() {
    // int f(int x) { return 10 / (x + 1); } with x unknown: both a
    // divide-by-zero edge and an ok edge pushing {−,+} must exist at the
    // div successor
    let m = int_case("shifted");
    let body = ProgramBuilder::new()
        .push_int(10)
        .load_int(0)
        .push_int(1)
        .binary(BinaryOp::Add)
        .binary(BinaryOp::Div)
        .ret_int()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::default();

    let analysis = FixpointEngine::new(&store, &config)
        .execute::<SignSet>(&m, &[])
        .unwrap();
    let id = store.intern(&m);
    let after_div = analysis.outcome(ProgramPoint::new(id, 5)).unwrap();

    assert_eq!(after_div.terminal, Some(Status::DivideByZero));
    let state = after_div.state.as_ref().unwrap();
    assert_eq!(state.frame.stack, vec![SignSet::neg() | SignSet::pos()]);
}

#[test]
fn empty_array_access_has_no_ok_return() {
    // int f() { int[] a = new int[0]; return a[0]; }
    let m = int_case("firstOfEmpty");
    let body = ProgramBuilder::new()
        .push_int(0)
        .new_int_array()
        .store_ref(0)
        .load_ref(0)
        .push_int(0)
        .array_load_int()
        .ret_int()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::default();

    let analysis = FixpointEngine::new(&store, &config)
        .execute::<SignSet>(&m, &[])
        .unwrap();
    let id = store.intern(&m);

    assert!(analysis.has_terminal(Status::OutOfBounds));
    // the return at offset 6 is only reachable through the ok side of the
    // bounds check, which a [0, 0]-length array rules out
    assert!(!analysis.has_state_at(ProgramPoint::new(id, 6)));

    let reporter = classflow_analysis::Reporter::new(&store);
    assert_eq!(reporter.final_verdict(&analysis), "out of bounds");
}

/// `assert x > 0;` as javac emits it
fn assertion_body() -> Vec<classflow_analysis::Opcode> {
    ProgramBuilder::new()
        // 0: the compiler-generated flag; 1: skip the check when disabled
        .get_assertion_flag()
        .if_zero(CmpCond::Ne, 8)
        // 2-3: the asserted condition
        .load_int(0)
        .if_zero(CmpCond::Gt, 8)
        // 4-7: new AssertionError; dup; <init>; athrow
        .throw_new("java.lang.AssertionError")
        // 8: return
        .ret_void()
        .build()
}

#[test]
fn assertion_holds_for_positive_input() {
    let m = void_case("assertPositive");
    let store = store_for(&m, assertion_body());
    let config = AnalysisConfig::default();

    let summary = analyze(&store, &config, &m, &[InputValue::Int(1)]).unwrap();
    assert_eq!(summary.verdict, "ok");
    assert!(!summary.text.contains("assertion error"));
}

#[test]
fn assertion_fails_for_unknown_input() {
    let m = void_case("assertPositive");
    let store = store_for(&m, assertion_body());
    let config = AnalysisConfig::default();

    let summary = analyze(&store, &config, &m, &[]).unwrap();
    assert!(summary.text.contains("assertion error"));
    assert_eq!(summary.verdict, "assertion error");
}

#[test]
fn tainted_source_reaching_sink_is_flagged() {
    // String s = readLine(); executeQuery(s);
    let m = void_case("lookup");
    let body = ProgramBuilder::new()
        .invoke_static(read_line())
        .store_ref(0)
        .load_ref(0)
        .invoke_static(execute_query())
        .ret_void()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::with_mode(AnalysisMode::Taint);

    let summary = analyze(&store, &config, &m, &[]).unwrap();
    assert!(summary.text.contains("SQL injection"));
    assert_eq!(summary.verdict, "SQL injection");
}

#[test]
fn safe_literal_reaching_sink_is_ok() {
    // String s = readLine(); String t = "prefix"; executeQuery(t);
    let m = void_case("lookupConstant");
    let body = ProgramBuilder::new()
        .invoke_static(read_line())
        .store_ref(0)
        .push_str("prefix")
        .store_ref(1)
        .load_ref(1)
        .invoke_static(execute_query())
        .ret_void()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::with_mode(AnalysisMode::Taint);

    let analysis = FixpointEngine::new(&store, &config)
        .execute::<TaintValue>(&m, &[])
        .unwrap();
    assert!(!analysis.has_terminal(Status::SqlInjection));

    let reporter = classflow_analysis::Reporter::new(&store);
    assert_eq!(reporter.final_verdict(&analysis), "ok");
}

#[test]
fn loop_reaches_fixpoint_within_height_bound() {
    // while (x != 0) { x = x - 1; } return x;
    let m = int_case("countdown");
    let body = ProgramBuilder::new()
        .load_int(0)
        .if_zero(CmpCond::Eq, 7)
        .load_int(0)
        .push_int(1)
        .binary(BinaryOp::Sub)
        .store_int(0)
        .goto(0)
        .load_int(0)
        .ret_int()
        .build();
    let point_count = body.len();
    let store = store_for(&m, body);
    let config = AnalysisConfig::default();

    let analysis = FixpointEngine::new(&store, &config)
        .execute::<SignSet>(&m, &[InputValue::Int(3)])
        .unwrap();
    assert!(!analysis.budget_exhausted);
    // rounds are bounded by program points times the lattice height
    assert!(analysis.rounds <= point_count * 4);

    let id = store.intern(&m);
    assert!(analysis.has_state_at(ProgramPoint::new(id, 8)));
}

#[test]
fn transfer_is_monotone_across_comparable_inputs() {
    // int f(int x) { return x + 1; } analyzed at x = {0} and x = ⊤: every
    // state reached from the smaller input must stay below the larger one
    let m = int_case("inc");
    let body = ProgramBuilder::new()
        .load_int(0)
        .push_int(1)
        .binary(BinaryOp::Add)
        .ret_int()
        .build();
    let store = store_for(&m, body.clone());
    let config = AnalysisConfig::default();
    let engine = FixpointEngine::new(&store, &config);

    let small = engine.execute::<SignSet>(&m, &[InputValue::Int(0)]).unwrap();
    let large = engine.execute::<SignSet>(&m, &[]).unwrap();

    for (pc, outcome) in &small.seen {
        let (Some(small_state), Some(large_outcome)) = (&outcome.state, large.outcome(*pc)) else {
            continue;
        };
        let large_state = large_outcome.state.as_ref().unwrap();
        assert_eq!(small_state.frame.stack.len(), large_state.frame.stack.len());
        for (s, l) in small_state.frame.stack.iter().zip(&large_state.frame.stack) {
            assert!(s.le(*l), "stack value {s} not below {l} at {pc:?}");
        }
    }
}

#[test]
fn sign_invocations_fall_back_to_top_results() {
    // int f(int x) { return Math.abs(x); } with no inter-procedural reasoning
    let m = int_case("viaHelper");
    let helper = classflow_analysis::MethodRef::new("java.lang.Math", "abs")
        .with_params(vec![classflow_analysis::ValueType::Int])
        .with_return(classflow_analysis::ValueType::Int);
    let body = ProgramBuilder::new()
        .load_int(0)
        .invoke_static(helper)
        .ret_int()
        .build();
    let store = store_for(&m, body);
    let config = AnalysisConfig::default();

    let analysis = FixpointEngine::new(&store, &config)
        .execute::<SignSet>(&m, &[InputValue::Int(-5)])
        .unwrap();
    let id = store.intern(&m);
    let after_call = analysis.outcome(ProgramPoint::new(id, 2)).unwrap();
    let state = after_call.state.as_ref().unwrap();
    assert_eq!(state.frame.stack, vec![SignSet::top()]);
}
