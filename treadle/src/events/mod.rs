//! Lifecycle event sinks.
//!
//! The runner emits structured lifecycle events (stage start/stop/exception,
//! parallel bookkeeping, run bracketing) into an [`EventSink`]. The sink is
//! owned explicitly by the runner — there is no ambient global — so the
//! transport behind it (logger, metrics pipeline, test buffer) is entirely
//! the caller's choice.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
