//! # Models
//!
//! A [`Model`] is a tree of named entries whose leaves are observables. It is
//! the bridge between plain data and the reactive core:
//!
//! - [`pack`] takes a snapshot: every observable is replaced by its current
//!   value.
//! - [`unpack`] goes the other way, and when given an existing model it
//!   writes through the observables already there instead of replacing them,
//!   so anything derived from them keeps working.
//!
//! ```rust
//! use honey_model::*;
//! use serde_json::json;
//!
//! let model = unpack(&json!({ "price": 10, "tax": { "rate": 20 } }), None).unwrap();
//! let price = model.observable("price").unwrap();
//!
//! let snapshot = pack(&model);
//! assert_eq!(snapshot, json!({ "price": 10, "tax": { "rate": 20 } }));
//!
//! let model = unpack(&json!({ "price": 12 }), Some(model)).unwrap();
//! assert!(price.ptr_eq(&model.observable("price").unwrap()));
//! assert_eq!(price.get(), json!(12));
//! ```

use honey_core::Observable;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;


#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub enum Entry {
    Cell(Observable<Value>),
    Nested(Model),
    /// A value carried along as-is, not observed.
    Plain(Value),
}

impl From<Observable<Value>> for Entry {
    fn from(obs: Observable<Value>) -> Self {
        Entry::Cell(obs)
    }
}

impl From<Model> for Entry {
    fn from(model: Model) -> Self {
        Entry::Nested(model)
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Plain(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    entries: IndexMap<String, Entry>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(key.into(), entry.into())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.insert(key, entry);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.shift_remove(key)
    }

    /// Looks up a dotted path such as `"order.tax.rate"`.
    pub fn get_path(&self, path: &str) -> Option<&Entry> {
        let mut parts = path.split('.');
        let mut current = self.entries.get(parts.next()?.trim())?;
        for part in parts {
            match current {
                Entry::Nested(model) => current = model.entries.get(part.trim())?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// The observable at a dotted path, if that entry is a cell.
    pub fn observable(&self, path: &str) -> Option<Observable<Value>> {
        match self.get_path(path)? {
            Entry::Cell(obs) => Some(obs.clone()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses `json` and unpacks it onto `target` (see [`unpack`]).
    pub fn from_json(json: &str, target: Option<Model>) -> Result<Model> {
        let value: Value = serde_json::from_str(json)?;
        unpack(&value, target)
    }
}

/// Serializes as the [`pack`]ed snapshot.
impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        pack(self).serialize(serializer)
    }
}

/// Snapshot of `model` with every observable replaced by its current value.
/// Cells are read with `get`, so packing inside a derivation makes it depend
/// on every cell in the model.
pub fn pack(model: &Model) -> Value {
    let mut out = Map::new();
    for (key, entry) in &model.entries {
        let value = match entry {
            Entry::Cell(obs) => obs.get(),
            Entry::Nested(nested) => pack(nested),
            Entry::Plain(value) => value.clone(),
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

/// Makes every leaf of the object `data` observable.
///
/// With a `target`, keys already present are reused: nested models are
/// recursed into and cells are written in place (keeping their identity and
/// their subscribers). Everything else becomes a new cell or nested model.
/// Keys of `target` absent from `data` are left alone.
pub fn unpack(data: &Value, target: Option<Model>) -> Result<Model> {
    let Value::Object(fields) = data else {
        return Err(ModelError::NotAnObject(kind_of(data)));
    };
    let mut model = target.unwrap_or_default();
    for (key, value) in fields {
        match (value, model.entries.get_mut(key)) {
            (Value::Object(_), Some(Entry::Nested(nested))) => {
                let inner = std::mem::take(nested);
                *nested = unpack(value, Some(inner))?;
                continue;
            }
            (_, Some(Entry::Cell(obs))) if !value.is_object() => {
                obs.set(value.clone());
                continue;
            }
            _ => {}
        }
        let entry = if value.is_object() {
            Entry::Nested(unpack(value, None)?)
        } else {
            log::trace!("unpack: new cell `{key}`");
            Entry::Cell(Observable::new(value.clone()))
        };
        model.entries.insert(key.clone(), entry);
    }
    Ok(model)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
