use std::collections::VecDeque;
use std::sync::Arc;

use scopeline_primitives::rope::{line_bounds, shared_text};
use scopeline_primitives::{ByteRange, ByteRangeExt, Rope, SyntaxNode, TextEdit, shift_offset};
use scopeline_tokenizer::{GrammarId, LanguageRegistry};
use scopeline_worker::{CancellationToken, GenerationClock, GenerationToken};
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::task::{Task, TaskOutput, TaskParams, spawn_task};
use super::{Command, SyntaxUpdate};
use crate::config::SchedulerCfg;
use crate::tree::SyntaxTree;

/// One entry point grammar and the tree it produces.
struct Layer {
	grammar: GrammarId,
	tree: SyntaxTree,
}

enum Event {
	Shutdown,
	Command(Option<Command>),
	Completed(Result<TaskOutput, JoinError>),
}

/// Single writer of the trees and the task queue.
pub(super) struct Consumer {
	registry: Arc<LanguageRegistry>,
	cfg: SchedulerCfg,
	layers: Vec<Layer>,
	text: Arc<str>,
	/// In enqueue order. Cancelled tasks are removed at once.
	tasks: VecDeque<Task>,
	clock: GenerationClock,
	root: GenerationToken,
	permits: Arc<Semaphore>,
	subscribers: Vec<mpsc::UnboundedSender<SyntaxUpdate>>,
	waiters: Vec<oneshot::Sender<Vec<SyntaxTree>>>,
}

/// True if `a` overlaps `b` or shares an endpoint with it.
///
/// An insertion at a task's start moves the text the task begins with, so
/// empty ranges count as touching at either end.
fn touches(a: &ByteRange, b: &ByteRange) -> bool {
	a.start <= b.end && a.end >= b.start
}

/// The first character boundary after `pos`, or `pos` at the end of text.
fn next_boundary(text: &str, pos: usize) -> usize {
	text.get(pos..).and_then(|rest| rest.chars().next()).map_or(pos, |c| pos + c.len_utf8())
}

async fn front_completion(tasks: &mut VecDeque<Task>) -> Result<TaskOutput, JoinError> {
	match tasks.front_mut() {
		Some(task) => (&mut task.handle).await,
		None => std::future::pending().await,
	}
}

impl Consumer {
	pub(super) fn new(registry: Arc<LanguageRegistry>, entry_points: Vec<GrammarId>, text: &Rope, cfg: SchedulerCfg) -> Self {
		Self {
			registry,
			cfg,
			layers: entry_points
				.into_iter()
				.map(|grammar| Layer {
					grammar,
					tree: SyntaxTree::new(),
				})
				.collect(),
			text: shared_text(text.slice(..)),
			tasks: VecDeque::new(),
			clock: GenerationClock::new(),
			root: GenerationToken::new(0, CancellationToken::new()),
			permits: Arc::new(Semaphore::new(cfg.max_concurrency)),
			subscribers: Vec::new(),
			waiters: Vec::new(),
		}
	}

	pub(super) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>, shutdown: CancellationToken) {
		self.dispatch_all(0..self.text.len());

		loop {
			let event = tokio::select! {
				biased;
				_ = shutdown.cancelled() => Event::Shutdown,
				cmd = rx.recv() => Event::Command(cmd),
				joined = front_completion(&mut self.tasks), if !self.tasks.is_empty() => Event::Completed(joined),
			};
			match event {
				Event::Shutdown | Event::Command(None) => break,
				Event::Command(Some(cmd)) => self.handle(cmd),
				Event::Completed(joined) => self.complete(joined),
			}
			self.notify_settled();
		}
		self.teardown();
	}

	fn handle(&mut self, cmd: Command) {
		match cmd {
			Command::Edit { edit, text } => self.on_edit(edit, &text),
			Command::Subscribe(tx) => {
				let len = self.text.len();
				for (layer, entry) in self.layers.iter().enumerate() {
					let snapshot = SyntaxUpdate {
						layer,
						range: 0..len,
						nodes: entry.tree.nodes().to_vec(),
					};
					if tx.send(snapshot).is_err() {
						return;
					}
				}
				self.subscribers.push(tx);
			}
			Command::Settled(reply) => self.waiters.push(reply),
		}
	}

	fn on_edit(&mut self, edit: TextEdit, text: &Rope) {
		let old = std::mem::replace(&mut self.text, shared_text(text.slice(..)));
		let delta = edit.length_delta;
		debug!(range = ?edit.range, delta, "syntax.edit");

		let consistent = edit.range.start <= edit.range.end
			&& edit.range.end <= old.len()
			&& old.len() as isize + delta == self.text.len() as isize
			&& edit.range.len() as isize + delta >= 0;
		if !consistent {
			warn!(
				range = ?edit.range,
				delta,
				old_len = old.len(),
				new_len = self.text.len(),
				"syntax.edit_inconsistent"
			);
			self.reset();
			return;
		}

		let dirty = self.dirty_range(&old, &edit.range);
		debug!(dirty = ?dirty, "syntax.dirty");

		self.tasks.retain_mut(|task| {
			if touches(&task.current_range(), &dirty) {
				debug!(task = task.id(), "syntax.task_cancelled");
				task.token.cancel();
				return false;
			}
			task.note_edit(&dirty, delta);
			true
		});
		for layer in &mut self.layers {
			layer.tree.delete_touching(&dirty);
			layer.tree.shift_after(dirty.end, delta);
		}

		let end = shift_offset(dirty.end, delta);
		let end = next_boundary(&self.text, end.min(self.text.len()));
		self.dispatch_all(dirty.start..end);
	}

	/// Grows `range` (pre-edit) to line starts, touched nodes and touched
	/// tasks until stable.
	fn dirty_range(&self, old: &str, range: &ByteRange) -> ByteRange {
		let mut dirty = range.clone();
		loop {
			let before = dirty.clone();
			dirty.start = line_bounds(old, dirty.start).start;
			for task in &self.tasks {
				let current = task.current_range();
				if touches(&current, &dirty) {
					dirty = dirty.union(&current);
				}
			}
			for layer in &self.layers {
				let touched = layer.tree.touching(&dirty);
				if let (Some(first), Some(last)) = (touched.first(), touched.last()) {
					dirty = dirty.union(&(first.start()..last.end()));
				}
			}
			if dirty == before {
				return dirty;
			}
		}
	}

	/// Drops all state and reparses the whole document.
	fn reset(&mut self) {
		for task in self.tasks.drain(..) {
			task.token.cancel();
		}
		for layer in &mut self.layers {
			layer.tree.clear();
		}
		self.dispatch_all(0..self.text.len());
	}

	fn dispatch_all(&mut self, range: ByteRange) {
		for layer in 0..self.layers.len() {
			self.dispatch(layer, range.clone());
		}
	}

	fn dispatch(&mut self, layer: usize, range: ByteRange) {
		let token = self.root.child(self.clock.next());
		let params = TaskParams {
			registry: Arc::clone(&self.registry),
			grammar: self.layers[layer].grammar,
			text: Arc::clone(&self.text),
			range: range.clone(),
			resync: self.layers[layer].tree.starts_from(range.end),
			cancel_check_lines: self.cfg.cancel_check_lines,
			token: token.clone(),
			permits: Arc::clone(&self.permits),
		};
		match spawn_task(params) {
			Ok(handle) => {
				debug!(task = token.generation(), layer, range = ?range, "syntax.dispatch");
				self.tasks.push_back(Task {
					layer,
					range,
					offset: 0,
					horizon: None,
					token,
					handle,
				});
			}
			Err(err) => warn!(layer, range = ?range, error = %err, "syntax.dispatch_failed"),
		}
	}

	/// Applies the result of the front task.
	fn complete(&mut self, joined: Result<TaskOutput, JoinError>) {
		let Some(task) = self.tasks.pop_front() else {
			return;
		};
		let result = match joined {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => {
				debug!(task = task.id(), "syntax.task_cancelled");
				return;
			}
			Err(err) => {
				if let Some(panic) = scopeline_worker::join_error_panic_message(err) {
					warn!(task = task.id(), panic = %panic, "syntax.task_panicked");
				}
				return;
			}
		};

		let requested = task.current_range();
		let covered = result.range.shifted(task.offset);
		// A block ending right at a later edit may continue past it.
		if let Some(horizon) = task.horizon
			&& covered.end >= horizon
		{
			debug!(task = task.id(), covered = ?covered, horizon, "syntax.result_stale");
			self.dispatch(task.layer, requested);
			return;
		}

		let layer = task.layer;
		let nodes: Vec<SyntaxNode> = result.nodes.into_iter().map(|n| n.shifted(task.offset)).collect();
		let mut reach = covered.end;
		for swallowed in self.layers[layer].tree.delete(&covered) {
			reach = reach.max(swallowed.end());
		}
		// Queued tasks reaching into the requested range come from later
		// edits and overwrite this result; those starting past it assumed a
		// state the overflow replaces.
		self.tasks.retain(|queued| {
			let current = queued.current_range();
			if queued.layer != layer || current.start < requested.end || !current.overlaps(&covered) {
				return true;
			}
			debug!(task = queued.id(), by = task.id(), "syntax.task_cancelled");
			queued.token.cancel();
			reach = reach.max(current.end);
			false
		});

		self.layers[layer].tree.insert(covered.clone(), nodes.clone());
		self.publish(SyntaxUpdate {
			layer,
			range: covered.clone(),
			nodes,
		});
		if reach > covered.end {
			self.dispatch(layer, covered.end..reach);
		}
	}

	fn publish(&mut self, update: SyntaxUpdate) {
		debug!(
			layer = update.layer,
			range = ?update.range,
			nodes = update.nodes.len(),
			"syntax.publish"
		);
		self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
	}

	fn notify_settled(&mut self) {
		if !self.tasks.is_empty() || self.waiters.is_empty() {
			return;
		}
		let trees: Vec<SyntaxTree> = self.layers.iter().map(|l| l.tree.clone()).collect();
		for waiter in self.waiters.drain(..) {
			let _ = waiter.send(trees.clone());
		}
	}

	fn teardown(&mut self) {
		self.root.cancel();
		self.tasks.clear();
		self.layers.clear();
		self.subscribers.clear();
		self.waiters.clear();
		debug!("syntax.shutdown");
	}
}
