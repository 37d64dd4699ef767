//! Neo4j connection management and the Bolt-backed query executor.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Row};
use serde::Deserialize;

use offshore_core::Value;

use crate::executor::{QueryExecutor, Record};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Graph state is inconsistent, reload before retrying: {0}")]
    Structural(String),
}

impl GraphError {
    pub fn title(&self) -> &'static str {
        match self {
            GraphError::Connection(_) => "Connection failed",
            GraphError::Query(_) | GraphError::Execution(_) => "Query failed",
            GraphError::Structural(_) => "Inconsistent graph",
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "offshore-dev".to_string(),
            max_connections: 16,
            fetch_size: 256,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }
}

#[async_trait]
impl QueryExecutor for GraphClient {
    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        tracing::debug!(query = %cypher, "Executing query");
        let columns = return_aliases(cypher);
        if columns.is_empty() {
            self.graph.run(query(cypher)).await?;
            return Ok(Vec::new());
        }

        let mut stream = self.graph.execute(query(cypher)).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(to_record(&row, &columns));
        }
        Ok(records)
    }
}

fn to_record(row: &Row, columns: &[String]) -> Record {
    let mut record = Record::new();
    for column in columns {
        let value = match row.get::<i64>(column) {
            Ok(i) => Value::Int(i),
            Err(_) => row
                .get::<String>(column)
                .map(Value::Str)
                .unwrap_or(Value::Null),
        };
        record.push(column, value);
    }
    record
}

/// Column aliases of the trailing `RETURN a AS x, b AS y [ORDER BY ..] [LIMIT ..]`.
///
/// Items without an alias keep their expression text as the column name.
pub(crate) fn return_aliases(cypher: &str) -> Vec<String> {
    let Some(line) = cypher
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("RETURN "))
    else {
        return Vec::new();
    };
    let mut items = &line["RETURN ".len()..];
    for tail in [" ORDER BY ", " LIMIT "] {
        if let Some(i) = items.find(tail) {
            items = &items[..i];
        }
    }
    items
        .split(", ")
        .map(|item| match item.rsplit_once(" AS ") {
            Some((_, alias)) => alias.trim().to_string(),
            None => item.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_from_return_clause() {
        let q = "MATCH (p:Platform {})\nRETURN p.name AS name, p.initialWorkers AS initialWorkers ORDER BY name";
        assert_eq!(return_aliases(q), ["name", "initialWorkers"]);
        assert_eq!(
            return_aliases("MATCH (w:Worker {})\nRETURN w.name AS name, w.job AS job ORDER BY name LIMIT 5"),
            ["name", "job"]
        );
        assert_eq!(return_aliases("MATCH (v:Vessel {})\nRETURN count(v) AS count"), ["count"]);
    }

    #[test]
    fn test_write_queries_have_no_columns() {
        assert!(return_aliases("MATCH (n)\nDETACH DELETE n").is_empty());
    }

    #[test]
    fn test_error_titles() {
        assert_eq!(GraphError::Connection("refused".into()).title(), "Connection failed");
        assert_eq!(GraphError::Execution("reset".into()).title(), "Query failed");
        let structural = GraphError::Structural("expected exactly one record, got 0".into());
        assert_eq!(structural.title(), "Inconsistent graph");
        assert!(structural.to_string().contains("reload before retrying"));
    }

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.fetch_size, 256);
    }
}
