//! Flag expression walkthrough.
//!
//! Parses an expression over letter flags (A = 0x1, B = 0x2, C = 0x4, ...),
//! shows the syntax tree and the optimized execution plan, then checks the
//! tree evaluator, the plan interpreter, and the JIT predicate against each
//! other over a small truth table.
//!
//! Run with: cargo run -p flag-demo -- "A || (B && C)"

use maskexpr::{compile_plan, parse, plan, LetterBits, Width};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let expression = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "A || (B && C)".to_string());

    println!("Expression:\n\n  {expression}\n");

    let ast = match parse(&expression) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    println!("AST:\n\n{}", ast.dump());

    let plan = match plan(&ast, &LetterBits) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    println!("Plan:\n\n  {plan}\n");

    let predicate = compile_plan(&plan, Width::W32);

    println!("Test (tree vs plan vs jit):\n");
    let mut failures = 0;
    for input in 0..16u64 {
        let expected = ast
            .evaluate(&LetterBits, input)
            .expect("letters resolve");
        let interpreted = plan.evaluate(input);
        let compiled = predicate.eval_u32(input as u32);
        let ok = expected == interpreted && expected == compiled;
        if !ok {
            failures += 1;
        }
        println!(
            "  {input:04b} => {expected:5} vs {interpreted:5} vs {compiled:5} {}",
            if ok { "ok" } else { "FAIL" }
        );
    }

    if failures > 0 {
        eprintln!("\n{failures} mismatching inputs");
        std::process::exit(1);
    }
}
