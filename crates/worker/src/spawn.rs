use std::future::Future;
use std::io;
use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Returns the ambient runtime, or a shared fallback runtime when called
/// from outside one.
fn runtime_handle() -> io::Result<Handle> {
	if let Ok(handle) = Handle::try_current() {
		return Ok(handle);
	}

	static GLOBAL_RT: OnceLock<io::Result<Runtime>> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("scopeline-worker-global")
			.build()
	});
	match runtime {
		Ok(runtime) => Ok(runtime.handle().clone()),
		Err(error) => Err(io::Error::new(error.kind(), error.to_string())),
	}
}

/// Spawns an async task tagged with its worker class.
pub fn spawn<F>(class: TaskClass, fut: F) -> io::Result<JoinHandle<F::Output>>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	Ok(runtime_handle()?.spawn(fut))
}

/// Spawns blocking work tagged with its worker class.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> io::Result<JoinHandle<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	Ok(runtime_handle()?.spawn_blocking(f))
}
