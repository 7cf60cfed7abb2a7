//! # Observables, recording, and cascades
//!
//! Honey is a small push-based reactive engine. There are three pieces:
//!
//! - `Observable<T>`: a cell holding a value. Leaves are assigned; computed
//!   observables derive their value from other observables.
//! - recording: while a computed observable is set up, every read of
//!   another observable is recorded and turned into a subscription.
//! - cascades: a write pushes the new value to subscribers synchronously;
//!   computed observables re-derive and push on in turn.
//!
//! ## Leaves and computed observables
//!
//! ```rust
//! use honey_core::*;
//!
//! let first = Observable::new("Jane".to_string());
//! let last = Observable::new("Doe".to_string());
//!
//! let full = Observable::computed({
//!     let first = first.clone();
//!     let last = last.clone();
//!     move || format!("{} {}", first.get(), last.get())
//! });
//! assert_eq!(full.get(), "Jane Doe");
//!
//! last.set("Smith".to_string());
//! assert_eq!(full.get(), "Jane Smith");
//! ```
//!
//! Nothing is declared: `full` depends on `first` and `last` because its
//! derivation read them. Reads never recompute anything; a computed value is
//! always up to date because it was pushed when its inputs changed.
//!
//! ## Minimal subscriptions
//!
//! When a derivation reads both an observable and something already derived
//! from it, only the derived one is subscribed to:
//!
//! ```rust
//! use honey_core::*;
//!
//! let a = Observable::new(1);
//! let b = Observable::computed({
//!     let a = a.clone();
//!     move || a.get() + 1
//! });
//! let c = Observable::computed({
//!     let (a, b) = (a.clone(), b.clone());
//!     move || a.get() * b.get()
//! });
//!
//! assert_eq!(c.dependencies(), vec![b.as_any()]);
//! a.set(2);
//! assert_eq!(c.get(), 6);
//! ```
//!
//! ## Writing
//!
//! - Writing a value equal to the current one is a no-op.
//! - Writing to a computed observable ignores the argument and re-runs the
//!   derivation (`refresh`).
//! - Leaves bound to a format (see [`format`]) accept text through
//!   `set_formatted` and render through `formatted`.
//!
//! ## Threading
//!
//! Handles are `Rc`-based and stay on the thread that created them. The
//! recording slot, format registry, configuration, and counters are all
//! thread-local.

pub mod config;
pub mod error;
pub mod format;
pub mod node;
pub mod observable;
pub mod prelude;
pub mod propagate;
pub mod recording;
pub mod resolve;
pub mod stats;

pub use config::*;
pub use error::*;
pub use format::{
    Formatter, SanitizeError, has_format, money, register_format, unregister_format,
};
pub use node::AnyObservable;
pub use observable::*;
pub use propagate::cascade_depth;
pub use recording::{is_recording, record_reads, untracked};
pub use stats::*;
