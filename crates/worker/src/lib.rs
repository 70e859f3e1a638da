//! Worker runtime primitives shared by the scheduler.
//!
//! * [`TaskClass`]: classification attached to every spawn for tracing
//! * [`spawn`] / [`spawn_blocking`]: runtime-agnostic spawn helpers
//! * [`GenerationClock`] / [`GenerationToken`]: generation-scoped cancellation

mod class;
mod spawn;
mod token;

pub use class::TaskClass;
pub use spawn::{spawn, spawn_blocking};
pub use token::{GenerationClock, GenerationToken};
pub use tokio_util::sync::CancellationToken;

/// Extracts the panic message from a failed join, if the task panicked.
///
/// Returns `None` for cancelled tasks.
pub fn join_error_panic_message(err: tokio::task::JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return Some(msg.clone());
	}
	Some("non-string panic payload".to_string())
}
