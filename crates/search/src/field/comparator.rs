//! Value ordering and incrementing.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::Duration;

use crate::types::Value;

/// Equality and ordering of field values.
///
/// Required by fields that accept ranges or comparisons; the optimizer uses it
/// to sort, merge and validate values.
pub trait ValueComparator: Send + Sync + Debug {
    /// Orders two values, `None` when they are incomparable.
    fn compare(&self, a: &Value, b: &Value) -> Option<Ordering>;

    /// Returns true if `a` equals `b`.
    fn is_equal(&self, a: &Value, b: &Value) -> bool {
        self.compare(a, b) == Some(Ordering::Equal)
    }

    /// Returns true if `a` is strictly lower than `b`.
    fn is_lower(&self, a: &Value, b: &Value) -> bool {
        self.compare(a, b) == Some(Ordering::Less)
    }

    /// Returns true if `a` is strictly higher than `b`.
    fn is_higher(&self, a: &Value, b: &Value) -> bool {
        self.compare(a, b) == Some(Ordering::Greater)
    }
}

/// Compares values by their natural order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalComparator;

impl ValueComparator for NaturalComparator {
    fn compare(&self, a: &Value, b: &Value) -> Option<Ordering> {
        a.compare(b)
    }
}

/// Produces the value that directly follows another one.
///
/// Fields with an incrementer let the optimizer merge consecutive single
/// values into ranges and canonicalize exclusive range bounds.
pub trait Incrementer: Send + Sync + Debug {
    /// Returns the successor of `value`, `None` if there is none.
    fn increment(&self, value: &Value) -> Option<Value>;

    /// Returns the predecessor of `value`, `None` if there is none.
    fn decrement(&self, value: &Value) -> Option<Value>;
}

/// Steps integers by one and dates by one day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalIncrementer;

impl Incrementer for NaturalIncrementer {
    fn increment(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Integer(i) => i.checked_add(1).map(Value::Integer),
            Value::Date(d) => d.succ_opt().map(Value::Date),
            _ => None,
        }
    }

    fn decrement(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Integer(i) => i.checked_sub(1).map(Value::Integer),
            Value::Date(d) => d.pred_opt().map(Value::Date),
            _ => None,
        }
    }
}

/// Steps date-times by a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeIncrementer {
    step: Duration,
}

impl DateTimeIncrementer {
    /// Creates an incrementer with the given step.
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Incrementer for DateTimeIncrementer {
    fn increment(&self, value: &Value) -> Option<Value> {
        match value {
            Value::DateTime(dt) => dt.checked_add_signed(self.step).map(Value::DateTime),
            _ => None,
        }
    }

    fn decrement(&self, value: &Value) -> Option<Value> {
        match value {
            Value::DateTime(dt) => dt.checked_sub_signed(self.step).map(Value::DateTime),
            _ => None,
        }
    }
}
