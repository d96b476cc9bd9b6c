//! `bt`: runs a behavior tree script against a simulated clock.
//!
//! ```bash
//! # Ten steps of 0.1s, the player shows up at step 4 and leaves at step 8
//! bt --tree guard --ticks 10 --trigger Player@4 --trigger Player@8:exit
//!
//! # Per-traversal diagnostics as JSON
//! bt --data-dir ./data --tree guard --json
//!
//! # Node reference
//! bt --nodes
//! ```

mod config;
mod script;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use behavior_tree::{
    Builtin, COMPOSITE_DOCS, Diagnostic, DiagnosticLog, NodeDoc, Scheduler, Traversal, Value,
};
use bt_content::ContentLoader;
use clap::Parser;
use serde::Serialize;
use strum::IntoEnumIterator;

use config::CliConfig;
use script::ScriptedTrigger;

/// Runs a behavior tree script against a simulated clock
#[derive(Parser)]
#[command(name = "bt")]
#[command(about = "Behavior tree runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory holding `config.toml` and `trees/` [env: BT_DATA_DIR]
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Tree to run, by name (`trees/<NAME>.bt`)
    #[arg(short, long, value_name = "NAME", required_unless_present = "nodes")]
    tree: Option<String>,

    /// Number of simulation steps
    #[arg(short = 'n', long, default_value_t = 10)]
    ticks: u32,

    /// Seconds per simulation step
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Trigger contact as `kind@step` or `kind@step:exit` (repeatable)
    #[arg(long, value_name = "KIND@STEP")]
    trigger: Vec<ScriptedTrigger>,

    /// Print traversals and diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Seed for wandering leaves (`roam`, random `moveto`)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the compiled tree back as DSL text and exit
    #[arg(long)]
    print: bool,

    /// List node types with their parameters and exit
    #[arg(long)]
    nodes: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    tree: &'a str,
    clock: f64,
    traversals: Vec<Traversal>,
    diagnostics: Vec<Diagnostic>,
    variables: BTreeMap<&'a str, &'a Value>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.nodes {
        return print_nodes(cli.json);
    }
    let tree_name = cli.tree.as_deref().context("--tree is required")?;
    let env = CliConfig::from_env();

    let loader = ContentLoader::new(cli.data_dir.clone().unwrap_or(env.data_dir));
    let mut config = loader.load_config()?;
    if let Some(period) = env.tick_period {
        config.scheduler.tick_period = period;
    }

    let registry = config.registry().context("Failed to build node registry")?;
    let mut compiled = loader.compile_tree(tree_name, &registry)?;
    if !compiled.is_clean() {
        tracing::warn!(issues = compiled.issues.len(), "tree compiled with issues");
    }

    if cli.print {
        print!("{}", compiled.tree.stringify());
        return Ok(());
    }

    if let Some(seed) = cli.seed {
        compiled.tree.agent_mut().seed(seed);
    }

    let log = DiagnosticLog::new();
    let mut scheduler = Scheduler::new(config.scheduler);
    if cli.json || scheduler.config().diagnostics {
        scheduler.set_observer(log.clone());
    }
    scheduler.load(compiled.tree);

    let traversals = run(&mut scheduler, &cli);

    let tree = scheduler.tree().context("tree unloaded during run")?;
    if cli.json {
        let report = Report {
            tree: tree_name,
            clock: scheduler.clock(),
            traversals,
            diagnostics: log.records(),
            variables: tree.variables().iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for traversal in &traversals {
        let marker = if traversal.aborted { "  abort" } else { "" };
        println!(
            "#{:<4} {:>3} -> {:<3}{}",
            traversal.number, traversal.in_index, traversal.out_index, marker
        );
    }
    for record in log.records() {
        println!(
            "#{:<4} [{}] {} {} {}",
            record.traversal, record.index, record.short_name, record.params, record.status
        );
    }
    let current = tree.current_node();
    println!(
        "clock {:.2}s, current node {} `{}`",
        scheduler.clock(),
        current.index(),
        current.token()
    );
    for (name, value) in tree.variables().iter().collect::<BTreeMap<_, _>>() {
        println!("{name} = {value}");
    }
    Ok(())
}

/// Steps the scheduler, delivering scripted triggers before each step.
fn run(scheduler: &mut Scheduler, cli: &Cli) -> Vec<Traversal> {
    let mut traversals = Vec::new();
    for step in 0..cli.ticks {
        for contact in cli.trigger.iter().filter(|t| t.step == step) {
            tracing::info!(kind = %contact.kind, event = %contact.event, step, "trigger");
            let object = contact.object_name();
            traversals.extend(scheduler.trigger(&contact.kind, contact.event, &object));
        }
        traversals.extend(scheduler.advance(cli.dt));
    }
    traversals
}

/// Composites first, then every built-in under its default token.
fn node_docs() -> Vec<NodeDoc> {
    COMPOSITE_DOCS
        .into_iter()
        .chain(Builtin::iter().map(Builtin::doc))
        .collect()
}

fn print_nodes(json: bool) -> Result<()> {
    let docs = node_docs();
    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }
    for doc in docs {
        println!("{}\n    {}", doc.prototype, doc.description);
        for param in doc.params {
            match param.default {
                Some(default) => println!(
                    "    - {} (default {}): {}",
                    param.name, default, param.description
                ),
                None => println!("    - {}: {}", param.name, param.description),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_listing_covers_the_grammar_and_every_builtin() {
        let docs = node_docs();
        assert_eq!(docs.len(), 2 + Builtin::iter().count());
        assert_eq!(docs[0].prototype, "?");
        assert!(docs.iter().any(|doc| doc.prototype.starts_with("moveto ")));
    }

    #[test]
    fn tree_is_only_optional_when_listing_nodes() {
        assert!(Cli::try_parse_from(["bt"]).is_err());
        let cli = Cli::try_parse_from(["bt", "--nodes"]).unwrap();
        assert!(cli.nodes && cli.tree.is_none());
        let cli = Cli::try_parse_from(["bt", "-t", "guard", "--seed", "3"]).unwrap();
        assert_eq!((cli.tree.as_deref(), cli.seed), (Some("guard"), Some(3)));
    }
}
