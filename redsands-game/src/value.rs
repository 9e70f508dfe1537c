//! Tagged values exchanged between compiled scripts and the engine.
//!
//! Scripts never see host types directly; everything crossing the bridge is
//! a [`Value`]. Mappings and lists are shared by reference so a nested
//! mapping handed to a script writes through to its parent, matching the
//! accessor contract of the source language.

use std::cell::RefCell;
use std::rc::Rc;

/// A script-visible value: a primitive, an ordered mapping, or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit "no such key" marker. Never an error.
    Undefined,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<Mapping>>),
}

/// Ordered key/value storage backing `Value::Map`. Keys are unique;
/// insertion order is preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Value at `key`, or [`Value::Undefined`] when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(Value::Undefined, |(_, v)| v.clone())
    }

    /// Insert or overwrite `key`. Existing keys keep their position.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn is_defined(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Value {
    /// Build a mapping value from a list of entries.
    #[must_use]
    pub fn map_from(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in entries {
            mapping.set(key, value);
        }
        Self::Map(Rc::new(RefCell::new(mapping)))
    }

    /// Fresh empty mapping value.
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(Rc::new(RefCell::new(Mapping::new())))
    }

    #[must_use]
    pub fn str(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    /// Shared handle to the backing mapping, if this is a mapping value.
    #[must_use]
    pub fn as_map(&self) -> Option<Rc<RefCell<Mapping>>> {
        match self {
            Self::Map(map) => Some(Rc::clone(map)),
            _ => None,
        }
    }

    /// Append to a list value. No-op on anything else.
    pub fn push(&self, value: Value) {
        if let Self::List(list) = self {
            list.borrow_mut().push(value);
        }
    }

    /// Pop from a list value. Anything else yields nothing.
    pub fn pop(&self) -> Option<Value> {
        match self {
            Self::List(list) => list.borrow_mut().pop(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_defined(&self, key: &str) -> bool {
        match self {
            Self::Map(map) => map.borrow().is_defined(key),
            _ => false,
        }
    }

    /// Numeric view used by comparisons and loop bounds. Strings holding a
    /// decimal literal count as numeric; mappings and lists never do.
    #[must_use]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Condition truthiness: empty, zero, and undefined are false.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(_) | Self::Map(_) => true,
        }
    }

    /// Canonical textual form. Primitives render bare; mappings and lists
    /// serialize as JSON text.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Undefined => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => fmt_num(*n),
            Self::Str(s) => s.clone(),
            Self::List(_) | Self::Map(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
        }
    }

    /// Convert into a JSON value (loses nothing; `Undefined` becomes null).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Num(n) => num_to_json(*n),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(list) => {
                serde_json::Value::Array(list.borrow().iter().map(Self::to_json).collect())
            }
            Self::Map(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map.borrow().iter() {
                    object.insert(key.to_string(), value.to_json());
                }
                serde_json::Value::Object(object)
            }
        }
    }

    /// Build a value from parsed JSON.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Undefined,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Num(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::List(Rc::new(RefCell::new(
                items.iter().map(Self::from_json).collect(),
            ))),
            serde_json::Value::Object(object) => {
                let mut mapping = Mapping::new();
                for (key, value) in object {
                    mapping.set(key.clone(), Self::from_json(value));
                }
                Self::Map(Rc::new(RefCell::new(mapping)))
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn num_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
        serde_json::Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Render a number the way scripts expect: integral values lose the
/// trailing `.0`.
#[must_use]
pub fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Value equality as the scripting surface sees it: numeric when both sides
/// are numeric, textual between primitives, structural between containers.
/// There is no identity comparison.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
        return x == y;
    }
    match (a, b) {
        (Value::Map(_) | Value::List(_), _) | (_, Value::Map(_) | Value::List(_)) => a == b,
        _ => a.to_text() == b.to_text(),
    }
}
