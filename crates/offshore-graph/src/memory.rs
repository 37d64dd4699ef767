//! In-memory property graph that executes the synthesized Cypher subset.
//!
//! Supports exactly what the query builders emit: node and relationship
//! `MATCH` patterns, `WHERE var.prop = literal`, `CREATE` of nodes and
//! relationships, `DELETE`, `DETACH DELETE`, and a trailing `RETURN` of
//! `var.prop AS alias` or `count(var) AS alias` items with optional
//! `ORDER BY alias` and `LIMIT n`. Anything else fails with
//! [`GraphError::Execution`].
//!
//! Each statement runs against a copy of the store that replaces the live
//! one only when every clause succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use offshore_core::Value;

use crate::client::GraphError;
use crate::executor::{QueryExecutor, Record};

#[derive(Debug, Clone)]
struct StoredNode {
    label: String,
    props: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
struct StoredRel {
    kind: String,
    from: usize,
    to: usize,
    props: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct Store {
    nodes: BTreeMap<usize, StoredNode>,
    rels: BTreeMap<usize, StoredRel>,
    next_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Node(usize),
    Rel(usize),
}

type Row = HashMap<String, Bound>;

/// Executor backed by an in-process graph; used for tests and `--memory` runs.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    store: Mutex<Store>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.store.lock().map(|s| s.nodes.len()).unwrap_or_default()
    }

    pub fn relationship_count(&self) -> usize {
        self.store.lock().map(|s| s.rels.len()).unwrap_or_default()
    }

    fn run(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        let mut live = self
            .store
            .lock()
            .map_err(|_| GraphError::Execution("in-memory graph lock poisoned".to_string()))?;
        let mut draft = live.clone();
        let records = draft.execute(cypher)?;
        *live = draft;
        Ok(records)
    }
}

#[async_trait]
impl QueryExecutor for MemoryGraph {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, GraphError> {
        tracing::debug!(query = %query, "Executing query in memory");
        self.run(query)
    }
}

// ── Parsed clauses ────────────────────────────────────────────────

#[derive(Debug)]
struct NodePattern {
    var: String,
    label: Option<String>,
    props: Vec<(String, Value)>,
}

#[derive(Debug)]
struct RelPattern {
    from: String,
    var: String,
    kind: Option<String>,
    props: Vec<(String, Value)>,
    to: String,
}

#[derive(Debug)]
enum Item {
    Property { var: String, prop: String, alias: String },
    Count { var: String, alias: String },
}

#[derive(Debug)]
enum Step {
    MatchNode(NodePattern),
    MatchRel(RelPattern),
    Where { var: String, prop: String, value: Value },
    CreateNode(NodePattern),
    CreateRel(RelPattern),
    Delete { vars: Vec<String>, detach: bool },
    Return { items: Vec<Item>, order_by: Option<String>, limit: Option<usize> },
}

fn unsupported(what: &str) -> GraphError {
    GraphError::Execution(format!("unsupported statement: {what}"))
}

fn parse_step(line: &str) -> Result<Step, GraphError> {
    if let Some(rest) = line.strip_prefix("MATCH ") {
        return Ok(if rest.contains(")-[") {
            Step::MatchRel(parse_rel(rest)?)
        } else {
            Step::MatchNode(parse_node(rest)?)
        });
    }
    if let Some(rest) = line.strip_prefix("CREATE ") {
        return Ok(if rest.contains(")-[") {
            Step::CreateRel(parse_rel(rest)?)
        } else {
            Step::CreateNode(parse_node(rest)?)
        });
    }
    if let Some(rest) = line.strip_prefix("WHERE ") {
        let (lhs, rhs) = rest.split_once(" = ").ok_or_else(|| unsupported(line))?;
        let (var, prop) = lhs.trim().split_once('.').ok_or_else(|| unsupported(line))?;
        return Ok(Step::Where {
            var: var.to_string(),
            prop: prop.to_string(),
            value: parse_literal(rhs.trim())?,
        });
    }
    if let Some(rest) = line.strip_prefix("DETACH DELETE ") {
        return Ok(Step::Delete { vars: split_vars(rest), detach: true });
    }
    if let Some(rest) = line.strip_prefix("DELETE ") {
        return Ok(Step::Delete { vars: split_vars(rest), detach: false });
    }
    if let Some(rest) = line.strip_prefix("RETURN ") {
        return parse_return(rest);
    }
    Err(unsupported(line))
}

fn split_vars(text: &str) -> Vec<String> {
    text.split(',').map(|v| v.trim().to_string()).collect()
}

fn parse_node(text: &str) -> Result<NodePattern, GraphError> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| unsupported(text))?;
    let (head, props) = split_props(inner)?;
    let (var, label) = match head.split_once(':') {
        Some((var, label)) => (var.trim(), Some(label.trim().to_string())),
        None => (head.trim(), None),
    };
    Ok(NodePattern { var: var.to_string(), label, props })
}

fn parse_rel(text: &str) -> Result<RelPattern, GraphError> {
    let text = text.trim();
    let bad = || unsupported(text);
    let open = text.find(")-[").ok_or_else(bad)?;
    let close = text.rfind("]->(").ok_or_else(bad)?;
    let from = text[..open].strip_prefix('(').ok_or_else(bad)?;
    let to = text[close + 4..].strip_suffix(')').ok_or_else(bad)?;
    let (head, props) = split_props(&text[open + 3..close])?;
    let (var, kind) = match head.split_once(':') {
        Some((var, kind)) => (var.trim(), Some(kind.trim().to_string())),
        None => (head.trim(), None),
    };
    Ok(RelPattern {
        from: from.trim().to_string(),
        var: var.to_string(),
        kind: kind.filter(|k| !k.is_empty()),
        props,
        to: to.trim().to_string(),
    })
}

/// Split `head {k:v, ...}` into the head and its parsed property map.
fn split_props(text: &str) -> Result<(&str, Vec<(String, Value)>), GraphError> {
    match text.find('{') {
        None => Ok((text, Vec::new())),
        Some(i) => {
            let body = text[i + 1..]
                .trim_end()
                .strip_suffix('}')
                .ok_or_else(|| unsupported(text))?;
            Ok((&text[..i], parse_map(body)?))
        }
    }
}

fn parse_map(body: &str) -> Result<Vec<(String, Value)>, GraphError> {
    let mut entries = Vec::new();
    let mut chars = body.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }
        let key: String = chars.by_ref().take_while(|c| *c != ':').collect();
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let value = if chars.next_if_eq(&'"').is_some() {
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('\\') => s.extend(chars.next()),
                    Some('"') => break,
                    Some(c) => s.push(c),
                    None => return Err(unsupported(body)),
                }
            }
            Value::Str(s)
        } else {
            let mut raw = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',') {
                raw.push(c);
            }
            parse_literal(raw.trim())?
        };
        entries.push((key.trim().to_string(), value));

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(_) => return Err(unsupported(body)),
        }
    }
    Ok(entries)
}

fn parse_literal(text: &str) -> Result<Value, GraphError> {
    if text == "null" {
        return Ok(Value::Null);
    }
    if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return Ok(Value::Str(inner.replace("\\\"", "\"").replace("\\\\", "\\")));
    }
    text.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| unsupported(text))
}

fn parse_return(text: &str) -> Result<Step, GraphError> {
    let mut items = text;
    let mut limit = None;
    if let Some((head, n)) = items.split_once(" LIMIT ") {
        limit = Some(n.trim().parse::<usize>().map_err(|_| unsupported(text))?);
        items = head;
    }
    let mut order_by = None;
    if let Some((head, alias)) = items.split_once(" ORDER BY ") {
        order_by = Some(alias.trim().to_string());
        items = head;
    }

    let items = items
        .split(", ")
        .map(|item| {
            let (expr, alias) = item.split_once(" AS ").ok_or_else(|| unsupported(item))?;
            let alias = alias.trim().to_string();
            let expr = expr.trim();
            if let Some(var) = expr.strip_prefix("count(").and_then(|e| e.strip_suffix(')')) {
                return Ok(Item::Count { var: var.to_string(), alias });
            }
            let (var, prop) = expr.split_once('.').ok_or_else(|| unsupported(item))?;
            Ok(Item::Property { var: var.to_string(), prop: prop.to_string(), alias })
        })
        .collect::<Result<Vec<_>, GraphError>>()?;

    Ok(Step::Return { items, order_by, limit })
}

// ── Execution ─────────────────────────────────────────────────────

impl Store {
    fn execute(&mut self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        let mut rows: Vec<Row> = vec![Row::new()];
        for line in cypher.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_step(line)? {
                Step::MatchNode(pattern) => rows = self.match_node(rows, &pattern),
                Step::MatchRel(pattern) => rows = self.match_rel(rows, &pattern),
                Step::Where { var, prop, value } => {
                    rows.retain(|row| self.property(row, &var, &prop) == value);
                }
                Step::CreateNode(pattern) => {
                    for row in &mut rows {
                        let id = self.create_node(&pattern)?;
                        if !pattern.var.is_empty() {
                            row.insert(pattern.var.clone(), Bound::Node(id));
                        }
                    }
                }
                Step::CreateRel(pattern) => {
                    for row in &mut rows {
                        let id = self.create_rel(row, &pattern)?;
                        if !pattern.var.is_empty() {
                            row.insert(pattern.var.clone(), Bound::Rel(id));
                        }
                    }
                }
                Step::Delete { vars, detach } => {
                    for row in &rows {
                        for var in &vars {
                            self.delete(row, var, detach)?;
                        }
                    }
                }
                Step::Return { items, order_by, limit } => {
                    return self.project(&rows, &items, order_by.as_deref(), limit);
                }
            }
        }
        Ok(Vec::new())
    }

    fn node_matches(&self, id: usize, pattern: &NodePattern) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        pattern.label.as_ref().map_or(true, |l| *l == node.label)
            && pattern.props.iter().all(|(k, v)| node.props.get(k) == Some(v))
    }

    fn rel_matches(rel: &StoredRel, pattern: &RelPattern) -> bool {
        pattern.kind.as_ref().map_or(true, |k| *k == rel.kind)
            && pattern.props.iter().all(|(k, v)| rel.props.get(k) == Some(v))
    }

    fn match_node(&self, rows: Vec<Row>, pattern: &NodePattern) -> Vec<Row> {
        let candidates: Vec<usize> = self
            .nodes
            .keys()
            .copied()
            .filter(|id| self.node_matches(*id, pattern))
            .collect();

        let mut out = Vec::new();
        for row in rows {
            match row.get(&pattern.var) {
                Some(Bound::Node(id)) => {
                    if self.node_matches(*id, pattern) {
                        out.push(row);
                    }
                }
                Some(Bound::Rel(_)) => {}
                None => {
                    for id in &candidates {
                        let mut next = row.clone();
                        if !pattern.var.is_empty() {
                            next.insert(pattern.var.clone(), Bound::Node(*id));
                        }
                        out.push(next);
                    }
                }
            }
        }
        out
    }

    fn match_rel(&self, rows: Vec<Row>, pattern: &RelPattern) -> Vec<Row> {
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut all = Vec::new();
        for (id, rel) in &self.rels {
            if Self::rel_matches(rel, pattern) {
                outgoing.entry(rel.from).or_default().push(*id);
                all.push(*id);
            }
        }

        let mut out = Vec::new();
        for row in rows {
            let candidates: &[usize] = match row.get(&pattern.from) {
                Some(Bound::Node(from)) => outgoing.get(from).map(Vec::as_slice).unwrap_or_default(),
                Some(Bound::Rel(_)) => &[],
                None => all.as_slice(),
            };
            for id in candidates {
                let rel = &self.rels[id];
                let mut next = row.clone();
                if bind(&mut next, &pattern.from, Bound::Node(rel.from))
                    && bind(&mut next, &pattern.to, Bound::Node(rel.to))
                    && bind(&mut next, &pattern.var, Bound::Rel(*id))
                {
                    out.push(next);
                }
            }
        }
        out
    }

    fn property(&self, row: &Row, var: &str, prop: &str) -> Value {
        let props = match row.get(var) {
            Some(Bound::Node(id)) => self.nodes.get(id).map(|n| &n.props),
            Some(Bound::Rel(id)) => self.rels.get(id).map(|r| &r.props),
            None => None,
        };
        props
            .and_then(|p| p.get(prop))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn create_node(&mut self, pattern: &NodePattern) -> Result<usize, GraphError> {
        let label = pattern
            .label
            .clone()
            .ok_or_else(|| unsupported("CREATE of an unlabeled node"))?;
        let id = self.next_id;
        self.next_id += 1;
        let props = pattern
            .props
            .iter()
            .filter(|(_, v)| !v.is_null())
            .cloned()
            .collect();
        self.nodes.insert(id, StoredNode { label, props });
        Ok(id)
    }

    fn create_rel(&mut self, row: &Row, pattern: &RelPattern) -> Result<usize, GraphError> {
        let endpoint = |var: &str| match row.get(var) {
            Some(Bound::Node(id)) if self.nodes.contains_key(id) => Ok(*id),
            _ => Err(GraphError::Execution(format!(
                "relationship endpoint '{var}' is not a bound node"
            ))),
        };
        let from = endpoint(&pattern.from)?;
        let to = endpoint(&pattern.to)?;
        let kind = pattern
            .kind
            .clone()
            .ok_or_else(|| unsupported("CREATE of an untyped relationship"))?;
        let id = self.next_id;
        self.next_id += 1;
        let props = pattern.props.iter().cloned().collect();
        self.rels.insert(id, StoredRel { kind, from, to, props });
        Ok(id)
    }

    fn delete(&mut self, row: &Row, var: &str, detach: bool) -> Result<(), GraphError> {
        match row.get(var) {
            Some(Bound::Rel(id)) => {
                self.rels.remove(id);
                Ok(())
            }
            Some(Bound::Node(id)) => {
                let attached = self
                    .rels
                    .values()
                    .any(|r| r.from == *id || r.to == *id);
                if attached && !detach {
                    return Err(GraphError::Execution(format!(
                        "cannot delete node '{var}' while it still has relationships"
                    )));
                }
                self.rels.retain(|_, r| r.from != *id && r.to != *id);
                self.nodes.remove(id);
                Ok(())
            }
            None => Err(GraphError::Execution(format!("variable '{var}' is not bound"))),
        }
    }

    fn project(
        &self,
        rows: &[Row],
        items: &[Item],
        order_by: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, GraphError> {
        let counts = items.iter().filter(|i| matches!(i, Item::Count { .. })).count();
        let mut records = if counts == items.len() {
            let mut record = Record::new();
            for item in items {
                if let Item::Count { var, alias } = item {
                    let n = rows.iter().filter(|r| r.contains_key(var)).count();
                    record.push(alias, n as i64);
                }
            }
            vec![record]
        } else if counts == 0 {
            rows.iter()
                .map(|row| {
                    let mut record = Record::new();
                    for item in items {
                        if let Item::Property { var, prop, alias } = item {
                            record.push(alias, self.property(row, var, prop));
                        }
                    }
                    record
                })
                .collect()
        } else {
            return Err(unsupported("grouped aggregation"));
        };

        if let Some(alias) = order_by {
            records.sort_by(|a, b| a.get(alias).cmp(&b.get(alias)));
        }
        if let Some(n) = limit {
            records.truncate(n);
        }
        Ok(records)
    }
}

/// Bind `var` to `value` in `row`, or check an existing binding agrees.
/// Anonymous variables always match.
fn bind(row: &mut Row, var: &str, value: Bound) -> bool {
    if var.is_empty() {
        return true;
    }
    match row.get(var) {
        Some(existing) => *existing == value,
        None => {
            row.insert(var.to_string(), value);
            true
        }
    }
}
