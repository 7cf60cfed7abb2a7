//! # Formats
//!
//! A format pairs a formatter (value → display text) with a sanitizer
//! (user text → value). Leaf observables can be bound to a format by name at
//! construction; binding to a name that is not registered, or that is
//! registered for another value type, fails immediately.
//!
//! ```rust
//! use honey_core::*;
//!
//! let price = Observable::with_format(10i64, "money").unwrap();
//! assert_eq!(price.formatted().as_deref(), Some("$10"));
//!
//! price.set_formatted("$25").unwrap();
//! assert_eq!(price.get(), 25);
//! ```
//!
//! The registry is per thread and always contains the built‑in `"money"`
//! format for `i64`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::error::{HoneyError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot sanitize {input:?}: {reason}")]
pub struct SanitizeError {
    pub input: String,
    pub reason: String,
}

impl SanitizeError {
    pub fn new(input: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

pub struct Formatter<T> {
    format: Rc<dyn Fn(&T) -> String>,
    sanitize: Rc<dyn Fn(&str) -> std::result::Result<T, SanitizeError>>,
}

impl<T> Clone for Formatter<T> {
    fn clone(&self) -> Self {
        Self {
            format: self.format.clone(),
            sanitize: self.sanitize.clone(),
        }
    }
}

impl<T> Formatter<T> {
    pub fn new(
        format: impl Fn(&T) -> String + 'static,
        sanitize: impl Fn(&str) -> std::result::Result<T, SanitizeError> + 'static,
    ) -> Self {
        Self {
            format: Rc::new(format),
            sanitize: Rc::new(sanitize),
        }
    }

    pub fn format(&self, value: &T) -> String {
        (self.format)(value)
    }

    pub fn sanitize(&self, text: &str) -> std::result::Result<T, SanitizeError> {
        (self.sanitize)(text)
    }
}

/// Whole currency units: `25` ↔ `"$25"`. The sanitizer also accepts input
/// without the `$`.
pub fn money() -> Formatter<i64> {
    Formatter::new(
        |v: &i64| format!("${v}"),
        |text: &str| {
            let trimmed = text.trim();
            let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
            digits
                .parse::<i64>()
                .map_err(|e| SanitizeError::new(text, e))
        },
    )
}

struct Registered {
    type_name: &'static str,
    formatter: Box<dyn Any>,
}

impl Registered {
    fn new<T: 'static>(formatter: Formatter<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            formatter: Box::new(formatter),
        }
    }
}

thread_local! {
    static FORMATS: RefCell<HashMap<String, Registered>> = RefCell::new(builtin_formats());
}

fn builtin_formats() -> HashMap<String, Registered> {
    let mut formats = HashMap::new();
    formats.insert("money".to_string(), Registered::new(money()));
    formats
}

/// Registers (or replaces) a format. Returns `true` if a previous
/// registration under `name` was replaced.
pub fn register_format<T: 'static>(name: impl Into<String>, formatter: Formatter<T>) -> bool {
    let name = name.into();
    log::debug!("registering format `{name}` for {}", std::any::type_name::<T>());
    FORMATS.with(|f| {
        f.borrow_mut()
            .insert(name, Registered::new(formatter))
            .is_some()
    })
}

pub fn unregister_format(name: &str) -> bool {
    FORMATS.with(|f| f.borrow_mut().remove(name).is_some())
}

pub fn has_format(name: &str) -> bool {
    FORMATS.with(|f| f.borrow().contains_key(name))
}

pub(crate) fn lookup<T: 'static>(name: &str) -> Result<Formatter<T>> {
    FORMATS.with(|f| {
        let formats = f.borrow();
        let registered = formats
            .get(name)
            .ok_or_else(|| HoneyError::UnknownFormat(name.to_string()))?;
        registered
            .formatter
            .downcast_ref::<Formatter<T>>()
            .cloned()
            .ok_or_else(|| HoneyError::FormatTypeMismatch {
                name: name.to_string(),
                registered: registered.type_name,
                requested: std::any::type_name::<T>(),
            })
    })
}
