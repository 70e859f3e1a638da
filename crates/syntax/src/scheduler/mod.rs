//! Incremental parse scheduler.
//!
//! One [`SyntaxScheduler`] serves one document. Edits are funnelled to a
//! single consumer task that owns the per-layer [`SyntaxTree`]s and the task
//! queue, so the tree has exactly one writer. Tokenization runs on the
//! blocking pool over immutable text snapshots; results are applied and
//! published in the order their tasks were enqueued.
//!
//! # Edit handling
//!
//! For an edit the consumer computes a dirty range in pre-edit coordinates:
//! the edited span, grown to the start of its line and to every tree node
//! and queued task it touches, until nothing changes. Tasks inside it are
//! cancelled; tasks after it keep running and record the edit as an offset.
//! Tree nodes inside it are dropped, nodes after it are shifted. One new
//! task per layer then covers the dirty range (post-edit) plus one byte.
//!
//! A task may tokenize past its requested end: it stops at the next line
//! boundary or at the start of a surviving node. Nodes it runs over are
//! replaced, and text they covered beyond the result gets a follow-up task.

mod consumer;
mod task;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use scopeline_primitives::{ByteRange, Rope, SyntaxNode, TextEdit};
use scopeline_tokenizer::{GrammarId, LanguageRegistry};
use scopeline_worker::{CancellationToken, TaskClass};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use self::consumer::Consumer;
use crate::config::{ConfigError, SchedulerCfg};
use crate::tree::SyntaxTree;

/// Errors from [`SyntaxScheduler`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
	#[error("syntax scheduler is shut down")]
	Closed,
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("no runtime to run the scheduler on: {0}")]
	Runtime(#[from] std::io::Error),
}

/// One published change: `range` of tree layer `layer` now holds `nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxUpdate {
	pub layer: usize,
	pub range: ByteRange,
	pub nodes: Vec<SyntaxNode>,
}

/// Stream of [`SyntaxUpdate`]s for one subscriber.
///
/// Starts with one update per layer describing the whole current tree. Ends
/// when the scheduler shuts down.
#[derive(Debug)]
pub struct SyntaxUpdates {
	rx: mpsc::UnboundedReceiver<SyntaxUpdate>,
}

impl SyntaxUpdates {
	pub async fn recv(&mut self) -> Option<SyntaxUpdate> {
		self.rx.recv().await
	}

	/// Returns an update if one is ready, without waiting.
	pub fn try_recv(&mut self) -> Option<SyntaxUpdate> {
		self.rx.try_recv().ok()
	}
}

impl Stream for SyntaxUpdates {
	type Item = SyntaxUpdate;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.rx.poll_recv(cx)
	}
}

pub(crate) enum Command {
	Edit { edit: TextEdit, text: Rope },
	Subscribe(mpsc::UnboundedSender<SyntaxUpdate>),
	Settled(oneshot::Sender<Vec<SyntaxTree>>),
}

/// Handle to the per-document scheduler.
///
/// Dropping the handle shuts the scheduler down.
#[derive(Debug)]
pub struct SyntaxScheduler {
	tx: mpsc::UnboundedSender<Command>,
	shutdown: CancellationToken,
	consumer: JoinHandle<()>,
}

impl SyntaxScheduler {
	/// Starts a scheduler over `text` and dispatches its initial full parse.
	///
	/// Each entry point grammar owns one tree layer; updates carry the index
	/// of the entry point in `entry_points`.
	pub fn new(
		registry: Arc<LanguageRegistry>,
		entry_points: Vec<GrammarId>,
		text: Rope,
		cfg: SchedulerCfg,
	) -> Result<Self, SchedulerError> {
		if entry_points.is_empty() {
			return Err(ConfigError::Invalid {
				key: "entry_points",
				reason: "at least one grammar is required".into(),
			}
			.into());
		}
		if let Some(missing) = entry_points.iter().find(|id| registry.grammar(**id).is_none()) {
			return Err(ConfigError::Invalid {
				key: "entry_points",
				reason: format!("grammar {} is not registered", missing.index()),
			}
			.into());
		}

		let (tx, rx) = mpsc::unbounded_channel();
		let shutdown = CancellationToken::new();
		let consumer = Consumer::new(registry, entry_points, &text, cfg.normalized());
		let consumer = scopeline_worker::spawn(TaskClass::Background, consumer.run(rx, shutdown.clone()))?;
		debug!(len = text.len_bytes(), "syntax.scheduler_started");
		Ok(Self { tx, shutdown, consumer })
	}

	fn send(&self, cmd: Command) -> Result<(), SchedulerError> {
		if self.shutdown.is_cancelled() {
			return Err(SchedulerError::Closed);
		}
		self.tx.send(cmd).map_err(|_| SchedulerError::Closed)
	}

	/// Reports an edit. `text` is the document after the edit.
	pub fn notify_edit(&self, edit: TextEdit, text: Rope) -> Result<(), SchedulerError> {
		self.send(Command::Edit { edit, text })
	}

	pub fn subscribe(&self) -> Result<SyntaxUpdates, SchedulerError> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.send(Command::Subscribe(tx))?;
		Ok(SyntaxUpdates { rx })
	}

	/// Waits until every edit sent so far is fully tokenized and returns a
	/// copy of each layer's tree.
	pub async fn settled(&self) -> Result<Vec<SyntaxTree>, SchedulerError> {
		let (tx, rx) = oneshot::channel();
		self.send(Command::Settled(tx))?;
		rx.await.map_err(|_| SchedulerError::Closed)
	}

	/// Cancels all outstanding work and ends every subscription.
	pub fn shutdown(&self) {
		self.shutdown.cancel();
	}

	pub fn is_closed(&self) -> bool {
		self.shutdown.is_cancelled() || self.tx.is_closed()
	}

	/// Shuts down and waits for the consumer task to exit.
	pub async fn join(mut self) {
		self.shutdown();
		if let Err(err) = (&mut self.consumer).await
			&& let Some(panic) = scopeline_worker::join_error_panic_message(err)
		{
			tracing::error!(panic = %panic, "syntax.consumer_panicked");
		}
	}
}

impl Drop for SyntaxScheduler {
	fn drop(&mut self) {
		self.shutdown.cancel();
	}
}
