//! Aggregate accumulators.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::parser::AggregateFunction;

use super::error::{ExecutionError, ExecutionResult};
use super::evaluator::compare;
use super::value::{Number, Value};

/// Folds the values of one aggregate call over one group.
#[derive(Debug, Clone)]
pub struct Accumulator {
    func: AggregateFunction,
    /// Values already folded, for `DISTINCT`.
    seen: Option<HashSet<Value>>,
    state: AccumulatorState,
}

#[derive(Debug, Clone)]
enum AccumulatorState {
    Count(i64),
    Sum(Option<Number>),
    Avg { sum: f64, count: i64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl Accumulator {
    /// Creates an empty accumulator.
    pub fn new(func: AggregateFunction, distinct: bool) -> Self {
        let state = match func {
            AggregateFunction::Count => AccumulatorState::Count(0),
            AggregateFunction::Sum => AccumulatorState::Sum(None),
            AggregateFunction::Avg => AccumulatorState::Avg { sum: 0.0, count: 0 },
            AggregateFunction::Min => AccumulatorState::Min(None),
            AggregateFunction::Max => AccumulatorState::Max(None),
        };
        Self {
            func,
            seen: distinct.then(HashSet::new),
            state,
        }
    }

    /// Counts a row without looking at any value, as `COUNT(*)` does.
    pub fn count_row(&mut self) {
        if let AccumulatorState::Count(count) = &mut self.state {
            *count += 1;
        }
    }

    /// Folds one value. NULLs are ignored.
    pub fn accumulate(&mut self, value: Value) -> ExecutionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        if let Some(seen) = &mut self.seen {
            if !seen.insert(value.clone()) {
                return Ok(());
            }
        }

        let func = self.func;
        match &mut self.state {
            AccumulatorState::Count(count) => *count += 1,
            AccumulatorState::Sum(sum) => {
                let number = numeric(func, &value)?;
                *sum = Some(match (*sum, number) {
                    (None, n) => n,
                    (Some(Number::Integer(a)), Number::Integer(b)) => match a.checked_add(b) {
                        Some(total) => Number::Integer(total),
                        None => Number::Float(a as f64 + b as f64),
                    },
                    (Some(a), b) => Number::Float(a.to_f64() + b.to_f64()),
                });
            }
            AccumulatorState::Avg { sum, count } => {
                *sum += numeric(func, &value)?.to_f64();
                *count += 1;
            }
            AccumulatorState::Min(min) => {
                if replaces(min.as_ref(), &value, Ordering::Less)? {
                    *min = Some(value);
                }
            }
            AccumulatorState::Max(max) => {
                if replaces(max.as_ref(), &value, Ordering::Greater)? {
                    *max = Some(value);
                }
            }
        }
        Ok(())
    }

    /// Returns the aggregate result. Empty input yields 0 for COUNT and
    /// NULL for everything else.
    pub fn finish(self) -> Value {
        match self.state {
            AccumulatorState::Count(count) => Value::Integer(count),
            AccumulatorState::Sum(sum) => sum.map_or(Value::Null, Value::from),
            AccumulatorState::Avg { sum, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::Float(sum / count as f64)
                }
            }
            AccumulatorState::Min(value) | AccumulatorState::Max(value) => {
                value.unwrap_or(Value::Null)
            }
        }
    }
}

fn numeric(func: AggregateFunction, value: &Value) -> ExecutionResult<Number> {
    value.as_number().ok_or_else(|| {
        ExecutionError::TypeMismatch(format!(
            "{} requires numeric values, found {} '{}'",
            func,
            value.type_name(),
            value
        ))
    })
}

fn replaces(current: Option<&Value>, candidate: &Value, wanted: Ordering) -> ExecutionResult<bool> {
    match current {
        None => Ok(true),
        Some(current) => Ok(compare(candidate, current)? == Some(wanted)),
    }
}
