pub use crate::config::{EngineConfig, config, with_config};
pub use crate::error::{HoneyError, Result};
pub use crate::format::{Formatter, SanitizeError, register_format};
pub use crate::node::AnyObservable;
pub use crate::observable::{Observable, ObservableId, SubscriptionId};
pub use crate::recording::untracked;
pub use crate::stats::{EngineStats, stats};
