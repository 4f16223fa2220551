//! Integration tests for parsing, evaluation and rule loading
//!
//! These tests drive the public API end to end, the same way an embedding
//! host would.

use once_cell::sync::Lazy;
use rulekit::engine::{evaluate, parse, Environment, Expression, Value, MAX_DEPTH};
use rulekit::error::{EvalError, ParseError, RuleError, Side};
use rulekit::rules::{Condition, RuleLoader};
use rulekit::ValueType;
use serde_json::json;

fn env(vars: serde_json::Value) -> Environment {
    Environment::from_json(vars).unwrap()
}

fn eval(source: &str, vars: serde_json::Value) -> Result<Value, EvalError> {
    let tree = parse(source).unwrap();
    evaluate(&tree, &env(vars))
}

// ============================================================================
// Arithmetic and precedence
// ============================================================================

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(eval("1 + 2 * 3", json!({})), Ok(Value::Int64(7)));
    assert_eq!(eval("10 - 3 - 2", json!({})), Ok(Value::Int64(5)));
    assert_eq!(eval("(1 + 2) * 3", json!({})), Ok(Value::Int64(9)));
    assert_eq!(eval("2 ** 3 ** 2", json!({})), Ok(Value::Int64(64)));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        eval("$x / 0", json!({"x": 10})),
        Err(EvalError::DivisionByZero)
    );
    assert_eq!(
        eval("$x % 0", json!({"x": 10})),
        Err(EvalError::ModuloByZero)
    );
}

#[test]
fn test_mixed_numeric_arithmetic() {
    assert_eq!(eval("$x * 1.5", json!({"x": 2})), Ok(Value::Float64(3.0)));
    assert_eq!(eval("7 / 2", json!({})), Ok(Value::Int64(3)));
}

// ============================================================================
// Logic, comparison and membership
// ============================================================================

#[test]
fn test_conjunction_with_variables() {
    let source = r#"$a > 5 && $b = "x""#;
    assert_eq!(eval(source, json!({"a": 10, "b": "x"})), Ok(Value::Bool(true)));
    assert_eq!(eval(source, json!({"a": 3, "b": "x"})), Ok(Value::Bool(false)));
}

#[test]
fn test_membership_in_list_literal() {
    let source = r#"$role in ("admin", "owner")"#;
    assert_eq!(eval(source, json!({"role": "admin"})), Ok(Value::Bool(true)));
    assert_eq!(eval(source, json!({"role": "guest"})), Ok(Value::Bool(false)));
}

#[test]
fn test_non_boolean_logical_operand() {
    assert_eq!(
        eval("1 && true", json!({})),
        Err(EvalError::NonBooleanOperand {
            operator: "&&",
            side: Side::Left,
            found: ValueType::Int64,
        })
    );
}

#[test]
fn test_missing_variable() {
    assert_eq!(
        eval("$missing = 1", json!({})),
        Err(EvalError::VariableNotFound("missing".to_string()))
    );
}

#[test]
fn test_string_operators_and_paths() {
    let vars = json!({
        "user": {"email": "ops@example.com", "tags": ["beta", "staff"]}
    });
    assert_eq!(
        eval(r#"$user.email endsWith "@example.com""#, vars.clone()),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        eval(r#"$user.tags contains "staff""#, vars.clone()),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        eval(r#"$user.email matches "^[a-z]+@""#, vars),
        Ok(Value::Bool(true))
    );
}

#[test]
fn test_builtin_and_host_functions() {
    let env = Environment::new()
        .with_builtins()
        .with("name", "Ada")
        .with_function("double", |args: &[Value]| match args {
            [Value::Int64(n)] => Ok(Value::Int64(n * 2)),
            _ => Err("double expects one int64".to_string()),
        });

    let tree = parse(r#"upper($name) = "ADA" && double(len($name)) = 6"#).unwrap();
    assert_eq!(evaluate(&tree, &env), Ok(Value::Bool(true)));

    let tree = parse("double($name)").unwrap();
    assert!(matches!(
        evaluate(&tree, &env),
        Err(EvalError::Function { .. })
    ));
}

// ============================================================================
// Parse errors
// ============================================================================

#[test]
fn test_parse_errors() {
    assert!(matches!(
        parse("1 +"),
        Err(ParseError::UnexpectedEof { .. })
    ));
    assert!(matches!(
        parse("1 < 2 < 3"),
        Err(ParseError::TrailingInput { .. })
    ));
    assert!(matches!(parse("\"open"), Err(ParseError::Lexical { .. })));
    assert!(matches!(
        parse(&"!".repeat(1000)),
        Err(ParseError::TooDeep { .. })
    ));
}

#[test]
fn test_long_chains_are_bounded() {
    let chain = vec!["$a"; 20_000].join(" || ");
    assert!(matches!(parse(&chain), Err(ParseError::TooDeep { .. })));

    let chain = vec!["1"; 200_000].join(" + ");
    assert!(matches!(parse(&chain), Err(ParseError::TooDeep { .. })));

    let chain = vec!["$a"; MAX_DEPTH].join(" || ");
    let tree = parse(&chain).unwrap();
    assert_eq!(
        evaluate(&tree, &env(json!({"a": true}))),
        Ok(Value::Bool(true))
    );
}

#[test]
fn test_negative_number_after_contains() {
    assert_eq!(
        eval("$tags contains -1", json!({"tags": [3, -1]})),
        Ok(Value::Bool(true))
    );
}

// ============================================================================
// Stored trees
// ============================================================================

#[test]
fn test_json_round_trip_evaluates_identically() {
    let sources = [
        "1 + 2 * 3",
        r#"$a > 5 && $b = "x""#,
        r#"$role in ("admin", "owner")"#,
        "!($score < 0.5) || $flag",
    ];
    let vars = env(json!({"a": 10, "b": "x", "role": "owner", "score": 0.7, "flag": false}));

    for source in sources {
        let tree = parse(source).unwrap();
        let stored = serde_json::to_string(&tree).unwrap();
        let restored: Expression = serde_json::from_str(&stored).unwrap();

        assert_eq!(restored, tree, "tree mismatch for {}", source);
        assert_eq!(
            evaluate(&restored, &vars),
            evaluate(&tree, &vars),
            "result mismatch for {}",
            source
        );
    }
}

#[test]
fn test_hand_written_tree() {
    let stored = json!({
        "kind": "binary",
        "operator": "&",
        "left": {"kind": "variable", "name": "mask"},
        "right": {"kind": "literal", "value": {"type": "int64", "value": 4}}
    });
    let tree: Expression = serde_json::from_value(stored).unwrap();
    assert_eq!(
        evaluate(&tree, &env(json!({"mask": 6}))),
        Ok(Value::Int64(4))
    );
}

// ============================================================================
// Purity and sharing
// ============================================================================

static SHARED: Lazy<Expression> =
    Lazy::new(|| parse(r#"$n % 2 = 0 && $label startsWith "item""#).unwrap());

#[test]
fn test_repeated_evaluation_is_stable() {
    let vars = env(json!({"n": 4, "label": "item-4"}));
    let first = evaluate(&SHARED, &vars);
    let second = evaluate(&SHARED, &vars);
    assert_eq!(first, second);
    assert_eq!(first, Ok(Value::Bool(true)));
}

#[test]
fn test_shared_tree_across_threads() {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8i64)
            .map(|n| {
                scope.spawn(move || {
                    let vars = Environment::new()
                        .with("n", n)
                        .with("label", format!("item-{}", n));
                    evaluate(&SHARED, &vars)
                })
            })
            .collect();

        for (n, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(result, Ok(Value::Bool(n % 2 == 0)));
        }
    });
}

// ============================================================================
// Rules
// ============================================================================

#[test]
fn test_rule_file_end_to_end() {
    let yaml = r#"
rules:
  - name: adult
    when: "$age >= 18"
    attributes: [age]
  - name: local
    when: '$address.country in ("US", "CA")'
  - name: big_spender
    when: "$total > 1000.0"
"#;
    let path = std::env::temp_dir().join(format!("rulekit-it-{}.yaml", std::process::id()));
    std::fs::write(&path, yaml).unwrap();

    let rules = RuleLoader::new().load_rules(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let vars = env(json!({"age": 40, "address": {"country": "CA"}, "total": 250.5}));
    assert_eq!(rules.matching(&vars), vec!["adult", "local"]);
}

#[test]
fn test_missing_rule_file() {
    let result = RuleLoader::new().load_rules("/nonexistent/rules.yaml");
    assert!(matches!(result, Err(RuleError::Io(_))));
}

#[test]
fn test_condition_gate() {
    let cond = Condition::parse("$age >= 18").unwrap();
    assert!(cond.is_pass(&env(json!({"age": 18}))));
    assert!(!cond.is_pass(&env(json!({"age": "eighteen"}))));
    assert!(!cond.is_pass(&Environment::new()));
}
