use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use scopeline_grammar::Grammar;
use scopeline_primitives::{Rope, Scope, TextEdit, pretty_print_nodes};
use scopeline_syntax::{ScopelineConfig, SyntaxScheduler};
use scopeline_tokenizer::{GrammarId, LanguageRegistry};
use tracing::{info, warn};

use crate::cli::{EditArg, GrammarArgs};

/// Loads and registers every grammar; any load error aborts.
fn load_registry(paths: &[PathBuf], config: &ScopelineConfig) -> anyhow::Result<LanguageRegistry> {
	let mut registry = LanguageRegistry::new(config.engine_cfg());
	for path in paths {
		let grammar = Grammar::load(path).with_context(|| format!("loading grammar {}", path.display()))?;
		let id = registry.register(grammar).with_context(|| format!("registering {}", path.display()))?;
		if let Some(compiled) = registry.grammar(id) {
			for diagnostic in compiled.diagnostics() {
				warn!(grammar = %compiled.scope(), error = %diagnostic, "grammar.pattern_disabled");
			}
		}
	}
	Ok(registry)
}

/// Picks the entry grammar: `--scope`, then the input's file name, then its
/// first line, then the first grammar given.
fn entry_grammar(registry: &LanguageRegistry, args: &GrammarArgs, input: &Path, text: &str) -> anyhow::Result<GrammarId> {
	if let Some(scope) = &args.scope {
		return Ok(registry.require_scope(&Scope::from(scope.as_str()))?);
	}
	let detected = registry
		.for_path(input)
		.or_else(|| registry.for_first_line(text))
		.or_else(|| registry.grammars().next().map(|g| g.id()));
	match detected {
		Some(id) => Ok(id),
		None => bail!("no grammar registered"),
	}
}

fn read_input(path: &Path) -> anyhow::Result<String> {
	std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn tokenize(config: &ScopelineConfig, args: &GrammarArgs, input: &Path) -> anyhow::Result<()> {
	let registry = load_registry(&args.grammars, config)?;
	let text = read_input(input)?;
	let id = entry_grammar(&registry, args, input, &text)?;

	let result = registry.tokenize(id, &text, 0..text.len());
	info!(nodes = result.nodes.len(), "tokenize.done");
	print!("{}", pretty_print_nodes(&result.nodes, &text));
	Ok(())
}

pub fn check(config: &ScopelineConfig, paths: &[PathBuf]) -> anyhow::Result<()> {
	let mut registry = LanguageRegistry::new(config.engine_cfg());
	let mut failed = 0usize;
	for path in paths {
		let grammar = match Grammar::load(path) {
			Ok(grammar) => grammar,
			Err(err) => {
				println!("{}: error: {err}", path.display());
				failed += 1;
				continue;
			}
		};
		let id = match registry.register(grammar) {
			Ok(id) => id,
			Err(err) => {
				println!("{}: error: {err}", path.display());
				failed += 1;
				continue;
			}
		};
		let Some(compiled) = registry.grammar(id) else {
			continue;
		};
		let diagnostics = compiled.diagnostics();
		println!(
			"{}: {} ({} tokenizers, {} disabled patterns)",
			path.display(),
			compiled.scope(),
			compiled.len(),
			diagnostics.len()
		);
		for diagnostic in diagnostics {
			println!("  {diagnostic}");
		}
	}
	if failed > 0 {
		bail!("{failed} grammar(s) failed to load");
	}
	Ok(())
}

pub async fn replay(config: &ScopelineConfig, args: &GrammarArgs, input: &Path, edits: &[EditArg]) -> anyhow::Result<()> {
	let registry = Arc::new(load_registry(&args.grammars, config)?);
	let mut doc = read_input(input)?;
	let id = entry_grammar(&registry, args, input, &doc)?;

	let scheduler = SyntaxScheduler::new(Arc::clone(&registry), vec![id], Rope::from(doc.as_str()), config.scheduler)?;
	scheduler.settled().await?;
	let mut updates = scheduler.subscribe()?;
	// Skip the snapshot of the initial parse.
	updates.recv().await;

	for (step, edit) in edits.iter().enumerate() {
		if edit.offset > doc.len() || !doc.is_char_boundary(edit.offset) {
			bail!("edit {step}: offset {} is not a character boundary", edit.offset);
		}
		let end = (edit.offset + edit.delete).min(doc.len());
		if !doc.is_char_boundary(end) {
			bail!("edit {step}: deletion ends inside a character");
		}
		doc.replace_range(edit.offset..end, &edit.insert);
		scheduler.notify_edit(TextEdit::replace(edit.offset..end, edit.insert.len()), Rope::from(doc.as_str()))?;
		scheduler.settled().await?;

		println!("# edit {step}: {}..{end} -> {:?}", edit.offset, edit.insert);
		while let Some(update) = updates.try_recv() {
			println!("update layer={} range={:?}", update.layer, update.range);
			print!("{}", pretty_print_nodes(&update.nodes, &doc));
		}
	}

	let trees = scheduler.settled().await?;
	println!("# final");
	for tree in &trees {
		print!("{}", pretty_print_nodes(tree.nodes(), &doc));
	}
	scheduler.join().await;
	Ok(())
}
