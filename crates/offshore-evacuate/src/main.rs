//! CLI entry point for the offshore fleet evacuation tool.
//!
//! Narration and fleet snapshots go to stdout, logs to stderr.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use offshore_core::Fleet;
use offshore_evacuate::config::{load_graph_config, load_planner_config};
use offshore_evacuate::{EvacuateError, EvacuationEngine, Plan};
use offshore_graph::{mutations, GraphClient, MemoryGraph, QueryExecutor};

#[derive(Parser)]
#[command(name = "offshore")]
#[command(about = "Evacuation planning for an offshore platform fleet")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: offshore).
    #[arg(short, long, default_value = "offshore", global = true)]
    config: String,

    /// Run against a seeded in-memory graph instead of Neo4j.
    #[arg(long, global = true)]
    memory: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Wipe the graph and recreate the example fleet.
    Reset,
    /// Print the current fleet as JSON.
    Fleet,
    /// Evacuate a platform and print what was done.
    Evacuate {
        /// Platform to evacuate.
        #[arg(long)]
        platform: String,
        /// Undo the evacuation right after printing it.
        #[arg(long)]
        decline: bool,
    },
    /// Re-anchor a vessel at another platform.
    MoveVessel {
        #[arg(long)]
        vessel: String,
        #[arg(long)]
        platform: String,
    },
    /// Move workers between a platform and its vessels.
    Redeploy {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        count: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let planner_config = load_planner_config(&cli.config)?;
    let executor: Arc<dyn QueryExecutor> = if cli.memory {
        let graph = MemoryGraph::new();
        mutations::reset(&graph).await?;
        Arc::new(graph)
    } else {
        let graph_config = load_graph_config(&cli.config);
        Arc::new(GraphClient::connect(&graph_config).await?)
    };
    let engine = EvacuationEngine::new(executor).with_config(planner_config);

    let outcome = run(&engine, cli.command).await;
    if let Err(e) = &outcome {
        tracing::error!(title = e.title(), error = %e, "Operation failed");
    }
    Ok(outcome?)
}

async fn run(engine: &EvacuationEngine, command: Command) -> Result<(), EvacuateError> {
    match command {
        Command::Reset => print_fleet(&engine.reset().await?),
        Command::Fleet => {
            let fleet = engine
                .spawn_reload()
                .await
                .map_err(|e| EvacuateError::Task(e.to_string()))??;
            print_fleet(&fleet)
        }
        Command::Evacuate { platform, decline } => {
            let handle = engine.spawn_evacuation(platform);
            let plan = match handle.await {
                Ok(Ok(plan)) => plan,
                Ok(Err(EvacuateError::PlanAborted { source, partial })) => {
                    // Roll back whatever was applied before the failure.
                    print_plan(&partial);
                    engine.decline(&partial).await?;
                    return Err(EvacuateError::PlanAborted { source, partial });
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(EvacuateError::Task(e.to_string())),
            };
            print_plan(&plan);
            if decline {
                engine.decline(&plan).await?;
            } else {
                engine.accept(plan).await?;
            }
        }
        Command::MoveVessel { vessel, platform } => {
            print_fleet(&engine.move_vessel(&vessel, &platform).await?)
        }
        Command::Redeploy { from, to, count } => {
            print_fleet(&engine.redeploy_workers(&from, &to, &count).await?)
        }
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    for line in plan.narration() {
        println!("{line}");
    }
    for vessel in &plan.unplaced_vessels {
        println!("No partner platform could take the ship named '{vessel}'");
    }
}

fn print_fleet(fleet: &Fleet) {
    match serde_json::to_string_pretty(&fleet.entries()) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize fleet"),
    }
}
