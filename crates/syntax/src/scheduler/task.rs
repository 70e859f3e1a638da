use std::sync::Arc;

use scopeline_primitives::{ByteIdx, ByteRange, ByteRangeExt, shift_offset};
use scopeline_tokenizer::{Cancelled, GrammarId, LanguageRegistry, TokenizeRequest, TokenizerResult};
use scopeline_worker::{GenerationToken, TaskClass};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

pub(super) type TaskOutput = Result<TokenizerResult, Cancelled>;

/// A queued or running tokenization of one layer.
pub(super) struct Task {
	pub(super) layer: usize,
	/// Requested range, in the coordinates of the snapshot it runs on.
	pub(super) range: ByteRange,
	/// Sum of the length deltas of edits landed before the range since
	/// dispatch.
	pub(super) offset: isize,
	/// Start of the nearest dirty range dispatched after this task and
	/// after its range, in current coordinates.
	pub(super) horizon: Option<ByteIdx>,
	pub(super) token: GenerationToken,
	pub(super) handle: JoinHandle<TaskOutput>,
}

impl Task {
	pub(super) fn id(&self) -> u64 {
		self.token.generation()
	}

	/// The requested range in current coordinates.
	pub(super) fn current_range(&self) -> ByteRange {
		self.range.shifted(self.offset)
	}

	/// Records an edit whose dirty range `dirty` (pre-edit) does not touch
	/// this task.
	pub(super) fn note_edit(&mut self, dirty: &ByteRange, delta: isize) {
		if self.current_range().start >= dirty.end {
			self.offset += delta;
			self.horizon = self.horizon.map(|h| shift_offset(h, delta));
		} else {
			self.horizon = Some(self.horizon.map_or(dirty.start, |h| h.min(dirty.start)));
		}
	}
}

/// Everything a task needs, moved onto the worker.
pub(super) struct TaskParams {
	pub(super) registry: Arc<LanguageRegistry>,
	pub(super) grammar: GrammarId,
	pub(super) text: Arc<str>,
	pub(super) range: ByteRange,
	pub(super) resync: Vec<ByteIdx>,
	pub(super) cancel_check_lines: usize,
	pub(super) token: GenerationToken,
	pub(super) permits: Arc<Semaphore>,
}

pub(super) fn spawn_task(params: TaskParams) -> std::io::Result<JoinHandle<TaskOutput>> {
	scopeline_worker::spawn(TaskClass::Background, run_task(params))
}

/// Waits for a concurrency permit, then tokenizes on the blocking pool.
async fn run_task(params: TaskParams) -> TaskOutput {
	let TaskParams {
		registry,
		grammar,
		text,
		range,
		resync,
		cancel_check_lines,
		token,
		permits,
	} = params;
	let id = token.generation();

	let permit = tokio::select! {
		biased;
		_ = token.cancelled() => return Err(Cancelled),
		permit = permits.acquire_owned() => permit,
	};
	let Ok(_permit) = permit else {
		return Err(Cancelled);
	};
	trace!(task = id, range = ?range, "syntax.task_running");

	let worker = token.clone();
	let job = scopeline_worker::spawn_blocking(TaskClass::CpuBlocking, move || {
		let request = TokenizeRequest::new(&text, range)
			.with_resync(&resync)
			.with_cancel_check_lines(cancel_check_lines);
		registry.tokenize_with(grammar, request, &|| worker.is_cancelled())
	});
	let handle = match job {
		Ok(handle) => handle,
		Err(err) => {
			warn!(task = id, error = %err, "syntax.task_spawn_failed");
			return Err(Cancelled);
		}
	};
	match handle.await {
		Ok(output) => output,
		Err(err) => {
			if let Some(panic) = scopeline_worker::join_error_panic_message(err) {
				warn!(task = id, panic = %panic, "syntax.task_panicked");
			}
			Err(Cancelled)
		}
	}
}
