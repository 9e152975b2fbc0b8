//! Expression evaluation.
//!
//! Expressions are evaluated in their bound form ([`BoundExpr`]), where
//! column references have been resolved to positions and function names to
//! [`ScalarFunction`]s. Where a value comes from is abstracted by
//! [`EvalContext`]: a single joined row, or a group of rows with its
//! aggregate results.
//!
//! NULL handling follows SQL: arithmetic, comparison, LIKE and string
//! functions yield NULL when an input is NULL, and AND / OR use
//! three-valued logic.

use std::cmp::Ordering;

use crate::parser::{BinaryOperator, UnaryOperator};

use super::error::{ExecutionError, ExecutionResult};
use super::value::{Number, Value};

/// An expression whose names have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    /// A constant.
    Literal(Value),
    /// A column of the current row, by position in the scope.
    Column {
        /// Position in the scope.
        index: usize,
        /// Name for error messages.
        name: String,
    },
    /// The result of an aggregate call, by slot.
    Aggregate(usize),
    /// A prefix operation.
    Unary {
        /// The operator.
        op: UnaryOperator,
        /// The operand.
        expr: Box<BoundExpr>,
    },
    /// A binary operation.
    Binary {
        /// Left operand.
        left: Box<BoundExpr>,
        /// The operator.
        op: BinaryOperator,
        /// Right operand.
        right: Box<BoundExpr>,
    },
    /// `[NOT] LIKE`
    Like {
        /// Matched value.
        expr: Box<BoundExpr>,
        /// Pattern.
        pattern: Box<BoundExpr>,
        /// `NOT LIKE`.
        negated: bool,
    },
    /// `[NOT] IN (...)`
    InList {
        /// Tested value.
        expr: Box<BoundExpr>,
        /// Candidates.
        list: Vec<BoundExpr>,
        /// `NOT IN`.
        negated: bool,
    },
    /// `[NOT] BETWEEN`
    Between {
        /// Tested value.
        expr: Box<BoundExpr>,
        /// Lower bound.
        low: Box<BoundExpr>,
        /// Upper bound.
        high: Box<BoundExpr>,
        /// `NOT BETWEEN`.
        negated: bool,
    },
    /// `IS [NOT] NULL`
    IsNull {
        /// Tested value.
        expr: Box<BoundExpr>,
        /// `IS NOT NULL`.
        negated: bool,
    },
    /// A scalar function call.
    Function {
        /// The function.
        func: ScalarFunction,
        /// Arguments.
        args: Vec<BoundExpr>,
    },
}

/// Built-in scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    /// `UPPER(text)`
    Upper,
    /// `LOWER(text)`
    Lower,
    /// `LENGTH(text)`, in characters.
    Length,
    /// `ABS(number)`
    Abs,
    /// `ROUND(number [, digits])`
    Round,
    /// `COALESCE(value, ...)`
    Coalesce,
    /// `SUBSTR(text, start [, length])`, 1-based.
    Substr,
}

impl ScalarFunction {
    /// Looks up a function by name, ignoring case.
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "UPPER" | "UCASE" => ScalarFunction::Upper,
            "LOWER" | "LCASE" => ScalarFunction::Lower,
            "LENGTH" | "LEN" | "CHAR_LENGTH" => ScalarFunction::Length,
            "ABS" => ScalarFunction::Abs,
            "ROUND" => ScalarFunction::Round,
            "COALESCE" | "IFNULL" => ScalarFunction::Coalesce,
            "SUBSTR" | "SUBSTRING" => ScalarFunction::Substr,
            _ => return None,
        })
    }

    /// The canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunction::Upper => "UPPER",
            ScalarFunction::Lower => "LOWER",
            ScalarFunction::Length => "LENGTH",
            ScalarFunction::Abs => "ABS",
            ScalarFunction::Round => "ROUND",
            ScalarFunction::Coalesce => "COALESCE",
            ScalarFunction::Substr => "SUBSTR",
        }
    }

    /// Checks the number of arguments.
    pub fn check_arity(&self, count: usize) -> ExecutionResult<()> {
        let (min, max) = match self {
            ScalarFunction::Upper
            | ScalarFunction::Lower
            | ScalarFunction::Length
            | ScalarFunction::Abs => (1, 1),
            ScalarFunction::Round => (1, 2),
            ScalarFunction::Coalesce => (1, usize::MAX),
            ScalarFunction::Substr => (2, 3),
        };
        if count < min || count > max {
            let expected = match (min, max) {
                (min, max) if min == max => format!("{}", min),
                (min, usize::MAX) => format!("at least {}", min),
                (min, max) => format!("{} or {}", min, max),
            };
            return Err(ExecutionError::InvalidArgument(format!(
                "{} expects {} argument(s), got {}",
                self.name(),
                expected,
                count
            )));
        }
        Ok(())
    }
}

/// Supplies column and aggregate values to the evaluator.
pub trait EvalContext {
    /// Value of the scope column at `index`.
    fn column(&self, index: usize, name: &str) -> ExecutionResult<Value>;

    /// Result of the aggregate call in `slot`.
    fn aggregate(&self, slot: usize) -> ExecutionResult<Value>;

    /// Value of `expr` if it is one of the grouping expressions of the
    /// current group.
    fn group_key(&self, _expr: &BoundExpr) -> Option<Value> {
        None
    }
}

/// Evaluates a bound expression.
pub fn evaluate<C: EvalContext + ?Sized>(expr: &BoundExpr, ctx: &C) -> ExecutionResult<Value> {
    if let Some(value) = ctx.group_key(expr) {
        return Ok(value);
    }
    match expr {
        BoundExpr::Literal(value) => Ok(value.clone()),
        BoundExpr::Column { index, name } => ctx.column(*index, name),
        BoundExpr::Aggregate(slot) => ctx.aggregate(*slot),
        BoundExpr::Unary { op, expr } => evaluate_unary_op(*op, evaluate(expr, ctx)?),
        BoundExpr::Binary {
            left,
            op: op @ (BinaryOperator::And | BinaryOperator::Or),
            right,
        } => evaluate_logical(*op, left, right, ctx),
        BoundExpr::Binary { left, op, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            evaluate_binary_op(*op, &left, &right)
        }
        BoundExpr::Like {
            expr,
            pattern,
            negated,
        } => {
            let value = evaluate(expr, ctx)?;
            let pattern = evaluate(pattern, ctx)?;
            match (value.to_text(), pattern.to_text()) {
                (Some(value), Some(pattern)) => {
                    Ok(Value::Boolean(like_match(&value, &pattern) != *negated))
                }
                _ => Ok(Value::Null),
            }
        }
        BoundExpr::InList {
            expr,
            list,
            negated,
        } => {
            let value = evaluate(expr, ctx)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            let mut saw_null = false;
            for candidate in list {
                let candidate = evaluate(candidate, ctx)?;
                match compare(&value, &candidate)? {
                    Some(Ordering::Equal) => return Ok(Value::Boolean(!*negated)),
                    Some(_) => {}
                    None => saw_null = true,
                }
            }
            if saw_null {
                Ok(Value::Null)
            } else {
                Ok(Value::Boolean(*negated))
            }
        }
        BoundExpr::Between {
            expr,
            low,
            high,
            negated,
        } => {
            let value = evaluate(expr, ctx)?;
            let low = evaluate(low, ctx)?;
            let high = evaluate(high, ctx)?;
            let above = compare(&value, &low)?.map(|o| o != Ordering::Less);
            let below = compare(&value, &high)?.map(|o| o != Ordering::Greater);
            let within = match (above, below) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            };
            Ok(within.map_or(Value::Null, |w| Value::Boolean(w != *negated)))
        }
        BoundExpr::IsNull { expr, negated } => {
            let value = evaluate(expr, ctx)?;
            Ok(Value::Boolean(value.is_null() != *negated))
        }
        BoundExpr::Function { func, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<ExecutionResult<Vec<_>>>()?;
            evaluate_scalar_function(*func, &args)
        }
    }
}

/// Evaluates a predicate, treating NULL as false.
pub fn evaluate_predicate<C: EvalContext + ?Sized>(
    expr: &BoundExpr,
    ctx: &C,
    clause: &'static str,
) -> ExecutionResult<bool> {
    match evaluate(expr, ctx)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(ExecutionError::NonBooleanPredicate {
            clause,
            found: other.type_name(),
        }),
    }
}

/// Compares two values with SQL semantics.
///
/// Returns `None` when either side is NULL. Values that both read as
/// numbers compare numerically, other text compares lexically, booleans
/// compare with booleans. Anything else is a type mismatch.
pub fn compare(left: &Value, right: &Value) -> ExecutionResult<Option<Ordering>> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => Err(mismatch("compare", left, right)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(Some(a.compare(b))),
            _ => match (left, right) {
                (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
                _ => Err(mismatch("compare", left, right)),
            },
        },
    }
}

fn mismatch(action: &str, left: &Value, right: &Value) -> ExecutionError {
    ExecutionError::TypeMismatch(format!(
        "cannot {} {} '{}' with {} '{}'",
        action,
        left.type_name(),
        left,
        right.type_name(),
        right
    ))
}

fn truth(value: &Value, op: BinaryOperator) -> ExecutionResult<Option<bool>> {
    match value {
        Value::Boolean(b) => Ok(Some(*b)),
        Value::Null => Ok(None),
        other => Err(ExecutionError::TypeMismatch(format!(
            "{} requires boolean operands, found {} '{}'",
            op,
            other.type_name(),
            other
        ))),
    }
}

fn evaluate_logical<C: EvalContext + ?Sized>(
    op: BinaryOperator,
    left: &BoundExpr,
    right: &BoundExpr,
    ctx: &C,
) -> ExecutionResult<Value> {
    let left = truth(&evaluate(left, ctx)?, op)?;
    // The left side alone can decide the result.
    match (op, left) {
        (BinaryOperator::And, Some(false)) => return Ok(Value::Boolean(false)),
        (BinaryOperator::Or, Some(true)) => return Ok(Value::Boolean(true)),
        _ => {}
    }
    let right = truth(&evaluate(right, ctx)?, op)?;
    let result = match (op, left, right) {
        (BinaryOperator::And, _, Some(false)) => Some(false),
        (BinaryOperator::And, Some(true), Some(true)) => Some(true),
        (BinaryOperator::Or, _, Some(true)) => Some(true),
        (BinaryOperator::Or, Some(false), Some(false)) => Some(false),
        _ => None,
    };
    Ok(result.map_or(Value::Null, Value::Boolean))
}

fn evaluate_unary_op(op: UnaryOperator, value: Value) -> ExecutionResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match op {
        UnaryOperator::Not => match value {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(ExecutionError::TypeMismatch(format!(
                "NOT requires a boolean operand, found {} '{}'",
                other.type_name(),
                other
            ))),
        },
        UnaryOperator::Plus => Ok(to_number(&value, "+")?.into()),
        UnaryOperator::Minus => Ok(match to_number(&value, "-")? {
            Number::Integer(i) => match i.checked_neg() {
                Some(n) => Value::Integer(n),
                None => Value::Float(-(i as f64)),
            },
            Number::Float(f) => Value::Float(-f),
        }),
    }
}

fn to_number(value: &Value, op: &str) -> ExecutionResult<Number> {
    value.as_number().ok_or_else(|| {
        ExecutionError::TypeMismatch(format!(
            "{} requires numeric operands, found {} '{}'",
            op,
            value.type_name(),
            value
        ))
    })
}

fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> ExecutionResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let ordering = |left: &Value, right: &Value| -> ExecutionResult<Ordering> {
        // NULL has been handled above.
        Ok(compare(left, right)?.unwrap_or(Ordering::Equal))
    };
    match op {
        BinaryOperator::Eq => Ok(Value::Boolean(ordering(left, right)? == Ordering::Equal)),
        BinaryOperator::NotEq => Ok(Value::Boolean(ordering(left, right)? != Ordering::Equal)),
        BinaryOperator::Lt => Ok(Value::Boolean(ordering(left, right)? == Ordering::Less)),
        BinaryOperator::LtEq => Ok(Value::Boolean(ordering(left, right)? != Ordering::Greater)),
        BinaryOperator::Gt => Ok(Value::Boolean(ordering(left, right)? == Ordering::Greater)),
        BinaryOperator::GtEq => Ok(Value::Boolean(ordering(left, right)? != Ordering::Less)),
        BinaryOperator::Concat => {
            let mut text = left.to_text().unwrap_or_default();
            text.push_str(&right.to_text().unwrap_or_default());
            Ok(Value::Text(text))
        }
        BinaryOperator::Plus
        | BinaryOperator::Minus
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => {
            let symbol = op.to_string();
            let a = to_number(left, &symbol)?;
            let b = to_number(right, &symbol)?;
            evaluate_arithmetic(op, a, b)
        }
        BinaryOperator::And | BinaryOperator::Or => {
            Err(ExecutionError::TypeMismatch(format!("{} requires boolean operands", op)))
        }
    }
}

fn evaluate_arithmetic(op: BinaryOperator, a: Number, b: Number) -> ExecutionResult<Value> {
    if matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo) && b.is_zero() {
        return Err(ExecutionError::DivisionByZero);
    }
    if let (Number::Integer(x), Number::Integer(y)) = (a, b) {
        let exact = match op {
            BinaryOperator::Plus => x.checked_add(y),
            BinaryOperator::Minus => x.checked_sub(y),
            BinaryOperator::Multiply => x.checked_mul(y),
            // Integer division stays integral only when it is exact.
            BinaryOperator::Divide => x
                .checked_rem(y)
                .filter(|r| *r == 0)
                .and_then(|_| x.checked_div(y)),
            BinaryOperator::Modulo => x.checked_rem(y),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::Integer(n));
        }
    }
    let (x, y) = (a.to_f64(), b.to_f64());
    let result = match op {
        BinaryOperator::Plus => x + y,
        BinaryOperator::Minus => x - y,
        BinaryOperator::Multiply => x * y,
        BinaryOperator::Divide => x / y,
        BinaryOperator::Modulo => x % y,
        _ => return Err(ExecutionError::TypeMismatch(format!("{} is not arithmetic", op))),
    };
    Ok(Value::Float(result))
}

/// Matches SQL LIKE patterns: `%` matches any run of characters and `_`
/// exactly one. Matching ignores ASCII case.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().map(|c| c.to_ascii_lowercase()).collect();
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut v, mut p) = (0, 0);
    // Position of the last `%` seen and the value position it resumes at.
    let mut backtrack: Option<(usize, usize)> = None;
    while v < value.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == value[v]) {
            v += 1;
            p += 1;
        } else if let Some((star, resume)) = backtrack {
            p = star + 1;
            v = resume + 1;
            backtrack = Some((star, resume + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

fn evaluate_scalar_function(func: ScalarFunction, args: &[Value]) -> ExecutionResult<Value> {
    if func == ScalarFunction::Coalesce {
        return Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null));
    }
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let text = |value: &Value| value.to_text().unwrap_or_default();
    let integer = |value: &Value, what: &str| -> ExecutionResult<i64> {
        match value.as_number() {
            Some(Number::Integer(i)) => Ok(i),
            _ => Err(ExecutionError::InvalidArgument(format!(
                "{} of {} must be an integer, found '{}'",
                what,
                func.name(),
                value
            ))),
        }
    };

    match func {
        ScalarFunction::Upper => Ok(Value::Text(text(&args[0]).to_uppercase())),
        ScalarFunction::Lower => Ok(Value::Text(text(&args[0]).to_lowercase())),
        ScalarFunction::Length => Ok(Value::Integer(text(&args[0]).chars().count() as i64)),
        ScalarFunction::Abs => Ok(match to_number(&args[0], "ABS")? {
            Number::Integer(i) => i
                .checked_abs()
                .map_or(Value::Float((i as f64).abs()), Value::Integer),
            Number::Float(f) => Value::Float(f.abs()),
        }),
        ScalarFunction::Round => {
            let number = to_number(&args[0], "ROUND")?;
            let digits = match args.get(1) {
                Some(arg) => integer(arg, "precision")?,
                None => 0,
            };
            Ok(round(number, digits))
        }
        ScalarFunction::Substr => {
            let chars: Vec<char> = text(&args[0]).chars().collect();
            let start = integer(&args[1], "start")?;
            let begin = if start > 0 {
                (start - 1) as usize
            } else if start < 0 {
                chars.len().saturating_sub(start.unsigned_abs() as usize)
            } else {
                0
            };
            let begin = begin.min(chars.len());
            let end = match args.get(2) {
                Some(arg) => {
                    let length = integer(arg, "length")?;
                    if length < 0 {
                        return Err(ExecutionError::InvalidArgument(
                            "length of SUBSTR must not be negative".to_string(),
                        ));
                    }
                    begin.saturating_add(length as usize).min(chars.len())
                }
                None => chars.len(),
            };
            Ok(Value::Text(chars[begin..end].iter().collect()))
        }
        ScalarFunction::Coalesce => Ok(Value::Null),
    }
}

/// Rounds half away from zero. Integers and zero-digit results stay
/// integral.
fn round(number: Number, digits: i64) -> Value {
    match number {
        Number::Integer(i) if digits >= 0 => Value::Integer(i),
        number => {
            let factor = 10f64.powi(digits.clamp(-308, 308) as i32);
            let rounded = (number.to_f64() * factor).round() / factor;
            if digits <= 0 && rounded.abs() < i64::MAX as f64 {
                Value::Integer(rounded as i64)
            } else {
                Value::Float(rounded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl EvalContext for Constant {
        fn column(&self, _index: usize, name: &str) -> ExecutionResult<Value> {
            Err(ExecutionError::ColumnNotFound(name.to_string()))
        }

        fn aggregate(&self, _slot: usize) -> ExecutionResult<Value> {
            Err(ExecutionError::MisplacedAggregate("constants".to_string()))
        }
    }

    fn lit(value: impl Into<Value>) -> Box<BoundExpr> {
        Box::new(BoundExpr::Literal(value.into()))
    }

    fn null() -> Box<BoundExpr> {
        Box::new(BoundExpr::Literal(Value::Null))
    }

    fn binary(left: Box<BoundExpr>, op: BinaryOperator, right: Box<BoundExpr>) -> ExecutionResult<Value> {
        evaluate(&BoundExpr::Binary { left, op, right }, &Constant)
    }

    fn call(func: ScalarFunction, args: Vec<Value>) -> ExecutionResult<Value> {
        evaluate(
            &BoundExpr::Function {
                func,
                args: args.into_iter().map(BoundExpr::Literal).collect(),
            },
            &Constant,
        )
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(binary(lit(2i64), BinaryOperator::Plus, lit(3i64)).unwrap(), Value::Integer(5));
        assert_eq!(binary(lit("18"), BinaryOperator::Multiply, lit(2i64)).unwrap(), Value::Integer(36));
        assert_eq!(binary(lit("18.5"), BinaryOperator::Minus, lit(0.5)).unwrap(), Value::Float(18.0));
        assert_eq!(binary(lit(10i64), BinaryOperator::Divide, lit(4i64)).unwrap(), Value::Float(2.5));
        assert_eq!(binary(lit(10i64), BinaryOperator::Divide, lit(5i64)).unwrap(), Value::Integer(2));
        assert_eq!(binary(lit(10i64), BinaryOperator::Modulo, lit(3i64)).unwrap(), Value::Integer(1));
        assert_eq!(binary(null(), BinaryOperator::Plus, lit(1i64)).unwrap(), Value::Null);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(lit(1i64), BinaryOperator::Divide, lit(0i64)).unwrap_err(),
            ExecutionError::DivisionByZero
        );
        assert_eq!(
            binary(lit(1.5), BinaryOperator::Modulo, lit("0")).unwrap_err(),
            ExecutionError::DivisionByZero
        );
    }

    #[test]
    fn test_arithmetic_on_text_fails() {
        assert!(matches!(
            binary(lit("Chai"), BinaryOperator::Plus, lit(1i64)),
            Err(ExecutionError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(lit("10"), BinaryOperator::Gt, lit("9")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(lit("b"), BinaryOperator::Gt, lit("a")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(lit("2"), BinaryOperator::Eq, lit(2.0)).unwrap(), Value::Boolean(true));
        assert_eq!(binary(lit("a"), BinaryOperator::NotEq, lit("a")).unwrap(), Value::Boolean(false));
        assert_eq!(binary(null(), BinaryOperator::Eq, null()).unwrap(), Value::Null);
        assert!(matches!(
            binary(lit("Chai"), BinaryOperator::Lt, lit(5i64)),
            Err(ExecutionError::TypeMismatch(_))
        ));
        assert!(matches!(
            binary(lit(true), BinaryOperator::Eq, lit(1i64)),
            Err(ExecutionError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_three_valued_logic() {
        assert_eq!(binary(null(), BinaryOperator::And, lit(false)).unwrap(), Value::Boolean(false));
        assert_eq!(binary(null(), BinaryOperator::And, lit(true)).unwrap(), Value::Null);
        assert_eq!(binary(null(), BinaryOperator::Or, lit(true)).unwrap(), Value::Boolean(true));
        assert_eq!(binary(lit(false), BinaryOperator::Or, null()).unwrap(), Value::Null);
        assert!(binary(lit("x"), BinaryOperator::And, lit(true)).is_err());
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            binary(lit("Nancy"), BinaryOperator::Concat, lit(" Davolio")).unwrap(),
            Value::text("Nancy Davolio")
        );
        assert_eq!(binary(lit(1i64), BinaryOperator::Concat, lit("x")).unwrap(), Value::text("1x"));
        assert_eq!(binary(null(), BinaryOperator::Concat, lit("x")).unwrap(), Value::Null);
    }

    #[test]
    fn test_like() {
        assert!(like_match("Chef Anton's Cajun Seasoning", "chef%"));
        assert!(like_match("Chai", "C_a_"));
        assert!(like_match("abc", "%"));
        assert!(like_match("", "%"));
        assert!(like_match("100%", "100%"));
        assert!(like_match("mississippi", "%iss%ppi"));
        assert!(!like_match("Chai", "Ch"));
        assert!(!like_match("Chai", "_"));
        assert!(!like_match("abc", "a%d"));
    }

    #[test]
    fn test_in_and_between() {
        let in_list = |value: Value, negated| {
            evaluate(
                &BoundExpr::InList {
                    expr: Box::new(BoundExpr::Literal(value)),
                    list: vec![BoundExpr::Literal(Value::Integer(1)), BoundExpr::Literal(Value::Null)],
                    negated,
                },
                &Constant,
            )
            .unwrap()
        };
        assert_eq!(in_list(Value::text("1"), false), Value::Boolean(true));
        assert_eq!(in_list(Value::text("2"), false), Value::Null);
        assert_eq!(in_list(Value::text("1"), true), Value::Boolean(false));

        let between = |value: i64| {
            evaluate(
                &BoundExpr::Between {
                    expr: lit(value),
                    low: lit("10"),
                    high: lit(20i64),
                    negated: false,
                },
                &Constant,
            )
            .unwrap()
        };
        assert_eq!(between(10), Value::Boolean(true));
        assert_eq!(between(20), Value::Boolean(true));
        assert_eq!(between(21), Value::Boolean(false));
    }

    #[test]
    fn test_is_null_and_not() {
        let is_null = BoundExpr::IsNull {
            expr: null(),
            negated: false,
        };
        assert_eq!(evaluate(&is_null, &Constant).unwrap(), Value::Boolean(true));
        let not = BoundExpr::Unary {
            op: UnaryOperator::Not,
            expr: null(),
        };
        assert_eq!(evaluate(&not, &Constant).unwrap(), Value::Null);
        let minus = BoundExpr::Unary {
            op: UnaryOperator::Minus,
            expr: lit("4"),
        };
        assert_eq!(evaluate(&minus, &Constant).unwrap(), Value::Integer(-4));
    }

    #[test]
    fn test_predicate() {
        assert!(evaluate_predicate(&BoundExpr::Literal(Value::Boolean(true)), &Constant, "WHERE").unwrap());
        assert!(!evaluate_predicate(&BoundExpr::Literal(Value::Null), &Constant, "WHERE").unwrap());
        assert_eq!(
            evaluate_predicate(&BoundExpr::Literal(Value::text("yes")), &Constant, "WHERE").unwrap_err(),
            ExecutionError::NonBooleanPredicate {
                clause: "WHERE",
                found: "text"
            }
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call(ScalarFunction::Upper, vec![Value::text("chai")]).unwrap(), Value::text("CHAI"));
        assert_eq!(call(ScalarFunction::Lower, vec![Value::text("ChAi")]).unwrap(), Value::text("chai"));
        assert_eq!(call(ScalarFunction::Length, vec![Value::text("Chang")]).unwrap(), Value::Integer(5));
        assert_eq!(call(ScalarFunction::Upper, vec![Value::Null]).unwrap(), Value::Null);
        assert_eq!(
            call(ScalarFunction::Substr, vec![Value::text("Northwind"), Value::Integer(6)]).unwrap(),
            Value::text("wind")
        );
        assert_eq!(
            call(
                ScalarFunction::Substr,
                vec![Value::text("Northwind"), Value::Integer(1), Value::Integer(5)]
            )
            .unwrap(),
            Value::text("North")
        );
        assert_eq!(
            call(ScalarFunction::Substr, vec![Value::text("abc"), Value::Integer(10)]).unwrap(),
            Value::text("")
        );
    }

    #[test]
    fn test_numeric_functions() {
        assert_eq!(call(ScalarFunction::Abs, vec![Value::text("-3")]).unwrap(), Value::Integer(3));
        assert_eq!(call(ScalarFunction::Abs, vec![Value::Float(-2.5)]).unwrap(), Value::Float(2.5));
        assert_eq!(
            call(ScalarFunction::Round, vec![Value::Float(3.14159), Value::Integer(2)]).unwrap(),
            Value::Float(3.14)
        );
        assert_eq!(call(ScalarFunction::Round, vec![Value::text("2.5")]).unwrap(), Value::Integer(3));
        assert_eq!(call(ScalarFunction::Round, vec![Value::Integer(7)]).unwrap(), Value::Integer(7));
        assert!(matches!(
            call(ScalarFunction::Round, vec![Value::text("x")]),
            Err(ExecutionError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_coalesce() {
        assert_eq!(
            call(ScalarFunction::Coalesce, vec![Value::Null, Value::text("b"), Value::text("c")]).unwrap(),
            Value::text("b")
        );
        assert_eq!(call(ScalarFunction::Coalesce, vec![Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_function_lookup_and_arity() {
        assert_eq!(ScalarFunction::lookup("upper"), Some(ScalarFunction::Upper));
        assert_eq!(ScalarFunction::lookup("nope"), None);
        assert!(ScalarFunction::Round.check_arity(2).is_ok());
        assert!(ScalarFunction::Round.check_arity(3).is_err());
        assert!(ScalarFunction::Coalesce.check_arity(5).is_ok());
        assert!(ScalarFunction::Substr.check_arity(1).is_err());
    }
}
