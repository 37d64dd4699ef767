//! Write operations: wiping the store and seeding the example dataset.

use offshore_core::cypher;
use offshore_core::{Clause, Node, Platform};

use crate::client::GraphError;
use crate::executor::QueryExecutor;

/// The four-platform demo fleet.
pub fn example_platforms() -> Vec<Platform> {
    vec![
        Platform::new("Sea Troll", 760, 4, 5),
        Platform::new("Byford Dolphin", 520, 4, 4),
        Platform::new("Petronius", 360, 4, 3),
        Platform::new("Perdido", 120, 2, 2),
    ]
}

/// One statement creating the platforms, their pairwise partnerships, their
/// initial vessels and their initial workers.
pub fn dataset_query(platforms: &[Platform]) -> String {
    let variables: Vec<String> = (0..platforms.len()).map(|i| format!("p{i}")).collect();
    let mut fragments: Vec<String> = platforms
        .iter()
        .zip(&variables)
        .map(|(p, var)| Node::from(p.clone()).render(Clause::Create, var))
        .collect();
    if platforms.len() > 1 {
        fragments.push(cypher::create_partners(&variables));
    }
    for (p, var) in platforms.iter().zip(&variables) {
        for part in [cypher::create_vessels(p, var), cypher::create_workers(p, var)] {
            if !part.is_empty() {
                fragments.push(part);
            }
        }
    }
    fragments.join("\n")
}

/// Wipe the store, then create `platforms` and their initial fleets.
pub async fn seed(executor: &dyn QueryExecutor, platforms: &[Platform]) -> Result<(), GraphError> {
    executor.execute(&cypher::wipe()).await?;
    executor.execute(&dataset_query(platforms)).await?;
    tracing::info!(platforms = platforms.len(), "Graph seeded");
    Ok(())
}

/// Restore the example dataset.
pub async fn reset(executor: &dyn QueryExecutor) -> Result<(), GraphError> {
    seed(executor, &example_platforms()).await
}
