//! Tests for parsing, planning, and plan interpretation.

use crate::ast::AstNode;
use crate::error::ExprError;
use crate::names::{BitNames, LetterBits, NameTable};
use crate::parser::parse;
use crate::plan::ExecPlan;
use crate::planner::plan;

fn plan_str(expression: &str) -> ExecPlan {
    let ast = parse(expression).expect("parse");
    plan(&ast, &LetterBits).expect("plan")
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[test]
fn test_parse_precedence_and_binds_tighter_than_or() {
    let ast = parse("A || B && C").unwrap();
    assert_eq!(
        ast,
        AstNode::or(vec![
            AstNode::identifier("A"),
            AstNode::and(vec![AstNode::identifier("B"), AstNode::identifier("C")]),
        ])
    );
}

#[test]
fn test_parse_chains_are_nary() {
    match parse("A && B && C && D").unwrap() {
        AstNode::And(operands) => assert_eq!(operands.len(), 4),
        other => panic!("expected And, got {other:?}"),
    }
}

#[test]
fn test_parse_parenthesized_same_kind_flattens() {
    // (A || B) || C is associatively equal to A || B || C; the constructor
    // splices the parenthesized child in.
    match parse("(A || B) || C").unwrap() {
        AstNode::Or(operands) => assert_eq!(operands.len(), 3),
        other => panic!("expected Or, got {other:?}"),
    }
}

#[test]
fn test_parse_not_binds_tightest() {
    let ast = parse("!A && B").unwrap();
    assert_eq!(
        ast,
        AstNode::and(vec![
            AstNode::not(AstNode::identifier("A")),
            AstNode::identifier("B"),
        ])
    );
}

#[test]
fn test_parse_double_negation() {
    let ast = parse("!!A").unwrap();
    assert_eq!(
        ast,
        AstNode::not(AstNode::not(AstNode::identifier("A")))
    );
}

#[test]
fn test_parse_whitespace_and_multichar_identifiers() {
    let ast = parse("  Read1 &&\tWrite2 ").unwrap();
    assert_eq!(
        ast,
        AstNode::and(vec![
            AstNode::identifier("Read1"),
            AstNode::identifier("Write2"),
        ])
    );
}

#[test]
fn test_parse_errors() {
    for bad in ["", "A &&", "(A", "A B", "A & B", ")", "!("] {
        assert!(
            matches!(parse(bad), Err(ExprError::Syntax(_))),
            "expected syntax error for {bad:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Tree evaluation
// ---------------------------------------------------------------------------

#[test]
fn test_tree_evaluate() {
    let ast = parse("A || (B && C)").unwrap();
    assert!(ast.evaluate(&LetterBits, 0b110).unwrap());
    assert!(!ast.evaluate(&LetterBits, 0b100).unwrap());
    assert!(ast.evaluate(&LetterBits, 0b001).unwrap());
}

#[test]
fn test_tree_evaluate_unknown_name() {
    let ast = parse("A && missing").unwrap();
    assert!(matches!(
        ast.evaluate(&LetterBits, 0),
        Err(ExprError::UnknownName(name)) if name == "missing"
    ));
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

#[test]
fn test_plan_identifier() {
    assert_eq!(plan_str("B"), ExecPlan::MaskEqual { mask: 2, value: 2 });
}

#[test]
fn test_plan_and_merges_to_single_mask_test() {
    // The defining optimization: two independent single-bit tests become one
    // wider compare, not an EvalAnd.
    assert_eq!(plan_str("A && B"), ExecPlan::MaskEqual { mask: 3, value: 3 });
    assert_eq!(
        plan_str("A && B && C && D"),
        ExecPlan::MaskEqual { mask: 0xF, value: 0xF }
    );
}

#[test]
fn test_plan_or_merges_to_single_mask_test() {
    // A || B is "any of these bits set": (input & 0x3) != 0.
    assert_eq!(
        plan_str("A || B"),
        ExecPlan::MaskNotEqual { mask: 3, value: 0 }
    );
}

#[test]
fn test_plan_not_flips_comparison() {
    assert_eq!(plan_str("!A"), ExecPlan::MaskNotEqual { mask: 1, value: 1 });
    assert_eq!(
        plan_str("!(A && B)"),
        ExecPlan::MaskNotEqual { mask: 3, value: 3 }
    );
    assert_eq!(plan_str("!!A"), ExecPlan::MaskEqual { mask: 1, value: 1 });
}

#[test]
fn test_plan_contradiction_is_false() {
    assert_eq!(plan_str("A && !A"), ExecPlan::False);
    assert_eq!(plan_str("A && B && !A"), ExecPlan::False);
}

#[test]
fn test_plan_tautology_is_true() {
    assert_eq!(plan_str("A || !A"), ExecPlan::True);
    assert_eq!(plan_str("A || B || !A"), ExecPlan::True);
}

#[test]
fn test_plan_absorption_truth_table() {
    // A && (A || B) is not required to collapse structurally, but must have
    // the same truth table as A.
    let absorbed = plan_str("A && (A || B)");
    let direct = plan_str("A");
    for input in 0..4u64 {
        assert_eq!(absorbed.evaluate(input), direct.evaluate(input), "input {input:#b}");
    }
}

#[test]
fn test_plan_mixed_and_or() {
    // Mask tests of both polarities coexist under one EvalAnd.
    let plan = plan_str("A && !(B && C)");
    assert_eq!(
        plan,
        ExecPlan::EvalAnd(vec![
            ExecPlan::MaskEqual { mask: 1, value: 1 },
            ExecPlan::MaskNotEqual { mask: 6, value: 6 },
        ])
    );
}

#[test]
fn test_plan_unknown_name_aborts() {
    let ast = parse("A && nope").unwrap();
    assert!(matches!(
        plan(&ast, &LetterBits),
        Err(ExprError::UnknownName(name)) if name == "nope"
    ));
}

#[test]
fn test_plan_zero_bit_resolves_to_false() {
    // A resolver may hand out a zero bit; the tree evaluator can never see
    // it set, so the plan is constant false rather than a zero-mask leaf.
    let names = NameTable::new([("Nothing", 0u64), ("A", 1u64)]);
    let ast = parse("Nothing").unwrap();
    assert_eq!(plan(&ast, &names).unwrap(), ExecPlan::False);
    let ast = parse("A || Nothing").unwrap();
    assert_eq!(
        plan(&ast, &names).unwrap(),
        ExecPlan::MaskEqual { mask: 1, value: 1 }
    );
}

/// Walk a plan checking the leaf invariants: nonzero masks, test bits within
/// the mask, and no constants nested under Eval nodes.
fn assert_plan_invariants(plan: &ExecPlan) {
    match plan {
        ExecPlan::True | ExecPlan::False => {}
        ExecPlan::MaskEqual { mask, value } | ExecPlan::MaskNotEqual { mask, value } => {
            assert_ne!(*mask, 0, "zero mask leaked into a leaf");
            assert_eq!(value & !mask, 0, "test bits outside the mask");
        }
        ExecPlan::EvalAnd(inputs) | ExecPlan::EvalOr(inputs) => {
            assert!(inputs.len() >= 2);
            for sub in inputs {
                assert!(!matches!(sub, ExecPlan::True | ExecPlan::False));
                assert_plan_invariants(sub);
            }
        }
        ExecPlan::EvalNot(inner) => {
            assert!(!matches!(**inner, ExecPlan::True | ExecPlan::False));
            assert_plan_invariants(inner);
        }
    }
}

const EXPRESSIONS: &[&str] = &[
    "A",
    "!A",
    "A && B",
    "A || B",
    "A || (B && C)",
    "(A && B) || (C && D)",
    "A && (A || B)",
    "A && !A",
    "A || !A",
    "!(A || B) && C",
    "!(A && B) || !(C || D)",
    "A && B && !C && D",
    "(A || B) && (C || D) && !E",
    "!!(A && (B || !C))",
    "A || B || C || D || E || F",
    "(A && !B) || (!A && B)",
    "J && (A || I)",
];

#[test]
fn test_plan_invariants_hold_across_catalog() {
    for expression in EXPRESSIONS {
        assert_plan_invariants(&plan_str(expression));
    }
}

#[test]
fn test_plan_matches_tree_exhaustively() {
    // Ten flags, every input 0..1024: interpretation of the plan must agree
    // with naive evaluation of the tree.
    for expression in EXPRESSIONS {
        let ast = parse(expression).unwrap();
        let plan = plan(&ast, &LetterBits).unwrap();
        for input in 0..1024u64 {
            assert_eq!(
                plan.evaluate(input),
                ast.evaluate(&LetterBits, input).unwrap(),
                "{expression} at input {input:#012b}"
            );
        }
    }
}

#[test]
fn test_replanning_preserves_truth_table() {
    // Planning twice is deterministic, and a second pass over an equivalent
    // tree keeps the same observable behavior.
    for expression in EXPRESSIONS {
        let ast = parse(expression).unwrap();
        let first = plan(&ast, &LetterBits).unwrap();
        let second = plan(&ast, &LetterBits).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_scenario_tables() {
    let plan = plan_str("A || (B && C)");
    assert!(plan.evaluate(0b110));
    assert!(!plan.evaluate(0b100));
    assert!(plan.evaluate(0b001));

    let plan = plan_str("(A && B) || (C && D)");
    assert!(plan.evaluate(0b0011));
    assert!(plan.evaluate(0b1100));
    assert!(!plan.evaluate(0b0101));
}

#[test]
fn test_plan_display() {
    assert_eq!(plan_str("A && B").to_string(), "(input & 0x03) == 0x03");
    assert_eq!(plan_str("A || B").to_string(), "(input & 0x03) != 0x00");
    assert_eq!(plan_str("A && !A").to_string(), "False");
    assert_eq!(
        plan_str("(A && B) || (C && D)").to_string(),
        "((input & 0x03) == 0x03) || ((input & 0x0C) == 0x0C)"
    );
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

#[test]
fn test_letter_bits() {
    assert_eq!(LetterBits.bit_from_name("A"), Some(0x1));
    assert_eq!(LetterBits.bit_from_name("D"), Some(0x8));
    assert_eq!(LetterBits.bit_from_name("Z"), Some(1 << 25));
    assert_eq!(LetterBits.bit_from_name("a"), None);
    assert_eq!(LetterBits.bit_from_name("AB"), None);
}

#[test]
fn test_name_table() {
    let names = NameTable::new([("Read", 0x1u64), ("Write", 0x2), ("Exec", 0x4)]);
    assert_eq!(names.bit_from_name("Write"), Some(0x2));
    assert_eq!(names.bit_from_name("Delete"), None);

    let ast = parse("Read && !Write").unwrap();
    let plan = plan(&ast, &names).unwrap();
    assert!(plan.evaluate(0b01));
    assert!(!plan.evaluate(0b11));
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FilePerms(u32);

impl FilePerms {
    const READ: u32 = 0x1;
    const WRITE: u32 = 0x2;
    const EXEC: u32 = 0x4;
}

impl crate::Flags for FilePerms {
    const WIDTH: crate::Width = crate::Width::W32;
    const NAMES: &'static [(&'static str, u64)] = &[
        ("Read", FilePerms::READ as u64),
        ("Write", FilePerms::WRITE as u64),
        ("Exec", FilePerms::EXEC as u64),
    ];

    fn bits(self) -> u64 {
        u64::from(self.0)
    }
}

#[test]
fn test_typed_compile() {
    let pred = crate::compile::<FilePerms>("Read && !Write").unwrap();
    assert!(pred.test(FilePerms(FilePerms::READ)));
    assert!(pred.test(FilePerms(FilePerms::READ | FilePerms::EXEC)));
    assert!(!pred.test(FilePerms(FilePerms::READ | FilePerms::WRITE)));
    assert!(!pred.test(FilePerms(0)));
}

#[test]
fn test_typed_compile_unknown_name() {
    assert!(matches!(
        crate::compile::<FilePerms>("Read && Delete"),
        Err(ExprError::UnknownName(name)) if name == "Delete"
    ));
}

#[test]
fn test_compile_with_runs_whole_pipeline() {
    let pred = crate::compile_with("A || (B && C)", &LetterBits, crate::Width::W32).unwrap();
    assert!(pred.eval(0b110));
    assert!(!pred.eval(0b100));
    assert!(pred.eval(0b001));
}
