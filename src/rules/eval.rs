//! Tree-walking interpreter for parsed rules.
//!
//! Values are plain JSON values. Equality ignores the integer/float split of
//! `serde_json::Number`, `&&`/`||` short-circuit and yield an operand like
//! their JavaScript counterparts, and reading a property of `null` is an error.

use serde_json::{Number, Value};

use crate::game::{EngineError, EngineResult};

use super::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};

/// Read-only environment a rule is evaluated in.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;

    fn call(&self, name: &str, args: &[Value]) -> EngineResult<Value>;
}

pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_number(value: &Value, op: &str) -> EngineResult<f64> {
    value.as_f64().ok_or_else(|| {
        EngineError::invalid(format!("`{op}` expects numbers, got {}", type_name(value)))
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> EngineResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => scope
            .lookup(name)
            .ok_or_else(|| EngineError::invalid(format!("{name} is not defined"))),
        Expr::Member { object, property } => {
            let object = evaluate(object, scope)?;
            member(&object, property)
        }
        Expr::Index { object, index } => {
            let object = evaluate(object, scope)?;
            let index = evaluate(index, scope)?;
            match (&object, &index) {
                (Value::Array(items), Value::Number(n)) => Ok(n
                    .as_f64()
                    .filter(|n| *n >= 0.0 && n.fract() == 0.0)
                    .and_then(|n| items.get(n as usize))
                    .cloned()
                    .unwrap_or(Value::Null)),
                (_, Value::String(key)) => member(&object, key),
                _ => Err(EngineError::invalid(format!(
                    "cannot index {} with {}",
                    type_name(&object),
                    type_name(&index)
                ))),
            }
        }
        Expr::Call { callee, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<EngineResult<Vec<_>>>()?;
            match callee.as_ref() {
                Expr::Ident(name) => scope.call(name, &args),
                Expr::Member { object, property } => {
                    let receiver = evaluate(object, scope)?;
                    call_method(&receiver, property, &args)
                }
                _ => Err(EngineError::invalid("expression is not a function")),
            }
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => Ok(number(-as_number(&value, "-")?)),
            }
        }
        Expr::Logical { op, lhs, rhs } => {
            let lhs = evaluate(lhs, scope)?;
            match (op, truthy(&lhs)) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(lhs),
                _ => evaluate(rhs, scope),
            }
        }
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => {
            if truthy(&evaluate(test, scope)?) {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            binary(*op, &lhs, &rhs)
        }
    }
}

fn member(object: &Value, property: &str) -> EngineResult<Value> {
    match (object, property) {
        (Value::Array(items), "length") => Ok(Value::from(items.len())),
        (Value::String(text), "length") => Ok(Value::from(text.chars().count())),
        (Value::Object(fields), _) => Ok(fields.get(property).cloned().unwrap_or(Value::Null)),
        (Value::Null, _) => Err(EngineError::invalid(format!(
            "cannot read property {property} of null"
        ))),
        (_, _) => Ok(Value::Null),
    }
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> EngineResult<Value> {
    let needle = args.first().unwrap_or(&Value::Null);
    match (receiver, method) {
        (Value::Array(items), "includes") => Ok(Value::Bool(
            items.iter().any(|item| values_equal(item, needle)),
        )),
        (Value::Array(items), "indexOf") => Ok(items
            .iter()
            .position(|item| values_equal(item, needle))
            .map(|idx| Value::from(idx as i64))
            .unwrap_or_else(|| Value::from(-1))),
        (Value::String(text), "includes") => Ok(Value::Bool(text.contains(&display(needle)))),
        (Value::String(text), "indexOf") => Ok(text
            .find(&display(needle))
            .map(|byte| Value::from(text[..byte].chars().count() as i64))
            .unwrap_or_else(|| Value::from(-1))),
        (Value::String(text), "startsWith") => Ok(Value::Bool(text.starts_with(&display(needle)))),
        (Value::String(text), "endsWith") => Ok(Value::Bool(text.ends_with(&display(needle)))),
        _ => Err(EngineError::invalid(format!(
            "{}.{method} is not a function",
            type_name(receiver)
        ))),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EngineResult<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(lhs, rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(lhs, rhs))),
        BinaryOp::Add => match (lhs, rhs) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(display(lhs) + &display(rhs)))
            }
            _ => Ok(number(as_number(lhs, "+")? + as_number(rhs, "+")?)),
        },
        BinaryOp::Sub => Ok(number(as_number(lhs, "-")? - as_number(rhs, "-")?)),
        BinaryOp::Mul => Ok(number(as_number(lhs, "*")? * as_number(rhs, "*")?)),
        BinaryOp::Div => Ok(number(as_number(lhs, "/")? / as_number(rhs, "/")?)),
        BinaryOp::Rem => Ok(number(as_number(lhs, "%")? % as_number(rhs, "%")?)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::String(a), Value::String(b)) => a.partial_cmp(b),
                _ => as_number(lhs, "<")?.partial_cmp(&as_number(rhs, "<")?),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::parser::parse;
    use super::*;

    struct Fixture;

    impl Scope for Fixture {
        fn lookup(&self, name: &str) -> Option<Value> {
            match name {
                "pile" => Some(json!({ "cards": ["a", "b", "c"], "hasActed": false })),
                "nothing" => Some(Value::Null),
                "five" => Some(json!(5)),
                _ => None,
            }
        }

        fn call(&self, name: &str, args: &[Value]) -> EngineResult<Value> {
            match name {
                "double" => Ok(number(as_number(&args[0], "double")? * 2.0)),
                _ => Err(EngineError::invalid(format!("{name} is not a function"))),
            }
        }
    }

    fn eval(source: &str) -> EngineResult<Value> {
        let expr = parse(source).expect("rule should parse");
        evaluate(&expr, &Fixture)
    }

    #[test]
    fn arithmetic_and_comparison() {
        assert_eq!(eval("1 + 2 * 3").expect("evaluates"), json!(7));
        assert_eq!(eval("(1 + 2) * 3 === 9").expect("evaluates"), json!(true));
        assert_eq!(eval("7 % 4 - 1").expect("evaluates"), json!(2));
        assert_eq!(eval("10 / 4").expect("evaluates"), json!(2.5));
        assert_eq!(eval("double(five) > 9").expect("evaluates"), json!(true));
        assert_eq!(eval("'ab' < 'b'").expect("evaluates"), json!(true));
        assert_eq!(eval("'n' + 1").expect("evaluates"), json!("n1"));
    }

    #[test]
    fn integers_and_floats_compare_equal() {
        assert_eq!(eval("pile.cards.length == 3.0").expect("evaluates"), json!(true));
        assert_eq!(eval("five !== 5").expect("evaluates"), json!(false));
    }

    #[test]
    fn member_access_and_methods() {
        assert_eq!(eval("pile.cards[1]").expect("evaluates"), json!("b"));
        assert_eq!(eval("pile.cards[9]").expect("evaluates"), Value::Null);
        assert_eq!(eval("pile['hasActed']").expect("evaluates"), json!(false));
        assert_eq!(eval("pile.missing").expect("evaluates"), Value::Null);
        assert_eq!(eval("pile.cards.includes('c')").expect("evaluates"), json!(true));
        assert_eq!(eval("pile.cards.indexOf('z')").expect("evaluates"), json!(-1));
        assert_eq!(eval("'player1Hand'.startsWith('player1')").expect("evaluates"), json!(true));
    }

    #[test]
    fn logical_operators_short_circuit() {
        // the right-hand side would fail if it were evaluated
        assert_eq!(eval("false && nothing.cards").expect("evaluates"), json!(false));
        assert_eq!(eval("true || undefinedName").expect("evaluates"), json!(true));
        assert_eq!(eval("nothing || 'fallback'").expect("evaluates"), json!("fallback"));
        assert_eq!(eval("!pile.hasActed ? 'ready' : 'done'").expect("evaluates"), json!("ready"));
    }

    #[test]
    fn faults_are_errors() {
        assert!(eval("nothing.cards").is_err());
        assert!(eval("unknownName").is_err());
        assert!(eval("five()").is_err());
        assert!(eval("pile - 1").is_err());
        assert!(eval("pile.cards.push('d')").is_err());
    }
}
