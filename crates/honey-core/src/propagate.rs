use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::config::config;
use crate::observable::ObservableId;
use crate::stats;

thread_local! {
    /// Observables whose delivery is in flight, outermost first.
    static DELIVERING: RefCell<IndexSet<ObservableId>> = RefCell::new(IndexSet::new());
}

/// One level of an in-flight cascade.
///
/// Entering panics when `origin` is already delivering further up the
/// stack: its new value was produced by its own subscribers, so the cascade
/// would never settle. Independently of cycles, nesting deeper than
/// `EngineConfig::max_cascade_depth` panics as stack exhaustion.
struct CascadeFrame;

impl CascadeFrame {
    fn enter(origin: ObservableId) -> Self {
        let outcome = DELIVERING.with(|d| {
            let mut d = d.borrow_mut();
            if let Some(start) = d.get_index_of(&origin) {
                let path: Vec<String> = d
                    .iter()
                    .skip(start)
                    .chain(std::iter::once(&origin))
                    .map(ToString::to_string)
                    .collect();
                return Err(format!(
                    "dependency cycle while notifying subscribers: {}",
                    path.join(" -> ")
                ));
            }
            let max = config().max_cascade_depth;
            if d.len() >= max {
                return Err(format!(
                    "cascade depth exceeded ({max}) while notifying subscribers of {origin}: \
                     raise EngineConfig::max_cascade_depth for deeper graphs"
                ));
            }
            d.insert(origin);
            Ok(())
        });
        if let Err(msg) = outcome {
            log::error!("{msg}");
            panic!("{msg}");
        }
        Self
    }
}

impl Drop for CascadeFrame {
    fn drop(&mut self) {
        let _ = DELIVERING.try_with(|d| d.borrow_mut().pop());
    }
}

/// Current nesting of notification deliveries on this thread.
pub fn cascade_depth() -> usize {
    DELIVERING.with(|d| d.borrow().len())
}

/// Calls every subscriber in order with `value`. The caller passes a
/// snapshot, so subscribers may freely (un)subscribe while being notified.
pub(crate) fn deliver<T: 'static>(
    origin: ObservableId,
    value: &T,
    subscribers: &[Rc<dyn Fn(&T)>],
) {
    if subscribers.is_empty() {
        return;
    }
    let _frame = CascadeFrame::enter(origin);
    for subscriber in subscribers {
        stats::bump(|s| s.notifications += 1);
        subscriber(value);
    }
}
