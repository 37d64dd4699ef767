//! Core domain types for the offshore fleet graph.
//!
//! Nodes are a closed set of variants (platform, vessel, worker) plus a
//! partially-specified pattern used only to synthesize `MATCH` clauses.
//! Every node renders itself as a Cypher node pattern and can render a
//! relationship from itself to another bound variable.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cypher::Clause;

// ── Attribute keys ────────────────────────────────────────────────

pub const ATTR_NAME: &str = "name";
pub const ATTR_INITIAL_WORKERS: &str = "initialWorkers";
pub const ATTR_INITIAL_SMALL_VESSELS: &str = "initialSmallVessels";
pub const ATTR_INITIAL_BIG_VESSELS: &str = "initialBigVessels";
pub const ATTR_MAX_CAPACITY: &str = "maxCapacity";
pub const ATTR_JOB: &str = "job";

// ── Values ────────────────────────────────────────────────────────

/// A scalar attribute value, as stored on a node or returned in a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Str(String),
}

impl Value {
    /// Render the value as a Cypher literal. `Null` has no literal form here:
    /// null-valued attributes are omitted from patterns entirely.
    pub fn to_cypher(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Str(s) => Some(quote(s)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Str(_) => 2,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Double-quote a string literal, escaping backslashes and quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

// ── Attributes ────────────────────────────────────────────────────

/// Insertion-ordered attribute map.
///
/// Rendering follows insertion order. Equality ignores order and treats a
/// null value the same as an absent key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes(Vec<(String, Value)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value, keeping the original position of the key.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// `k1:v1, k2:v2` with null values omitted and no trailing separator.
    pub fn to_cypher(&self) -> String {
        self.0
            .iter()
            .filter_map(|(k, v)| v.to_cypher().map(|lit| format!("{k}:{lit}")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn present(&self) -> BTreeMap<&str, &Value> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.present() == other.present()
    }
}

impl Eq for Attributes {}

// ── Labels ────────────────────────────────────────────────────────

/// The label of a node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Platform,
    Vessel,
    Worker,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Platform => "Platform",
            Label::Vessel => "Vessel",
            Label::Worker => "Worker",
        }
    }

    /// The word used for this kind of node in user-facing narration.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Label::Platform => "oil rig",
            Label::Vessel => "ship",
            Label::Worker => "worker",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Node payloads ─────────────────────────────────────────────────

/// An offshore platform with worker and vessel capacity bounds.
///
/// The `initial_*` fields are persisted; the `current_*` fields are cached
/// counts refreshed on every fleet reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub initial_workers: u32,
    pub current_workers: u32,
    pub initial_small_vessels: u32,
    pub initial_big_vessels: u32,
    current_small_vessels: u32,
    current_big_vessels: u32,
    current_vessels: u32,
}

impl Platform {
    /// Create a platform whose current counts equal its initial counts.
    pub fn new(name: &str, initial_workers: u32, initial_small: u32, initial_big: u32) -> Self {
        Self {
            name: name.to_string(),
            initial_workers,
            current_workers: initial_workers,
            initial_small_vessels: initial_small,
            initial_big_vessels: initial_big,
            current_small_vessels: initial_small,
            current_big_vessels: initial_big,
            current_vessels: initial_small + initial_big,
        }
    }

    pub fn min_workers(&self) -> u32 {
        self.initial_workers / 10
    }

    pub fn max_workers(&self) -> u32 {
        2 * self.initial_workers
    }

    pub fn max_small_vessels(&self) -> u32 {
        4 + self.initial_small_vessels
    }

    pub fn max_big_vessels(&self) -> u32 {
        4 + self.initial_big_vessels
    }

    pub fn max_vessels(&self, size: VesselSize) -> u32 {
        match size {
            VesselSize::Small => self.max_small_vessels(),
            VesselSize::Big => self.max_big_vessels(),
        }
    }

    pub fn current_small_vessels(&self) -> u32 {
        self.current_small_vessels
    }

    pub fn current_big_vessels(&self) -> u32 {
        self.current_big_vessels
    }

    pub fn current_vessels(&self) -> u32 {
        self.current_vessels
    }

    pub fn vessel_count(&self, size: VesselSize) -> u32 {
        match size {
            VesselSize::Small => self.current_small_vessels,
            VesselSize::Big => self.current_big_vessels,
        }
    }

    pub fn set_vessel_count(&mut self, size: VesselSize, count: u32) {
        match size {
            VesselSize::Small => self.current_small_vessels = count,
            VesselSize::Big => self.current_big_vessels = count,
        }
        self.current_vessels = self.current_small_vessels + self.current_big_vessels;
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with(ATTR_NAME, self.name.as_str())
            .with(ATTR_INITIAL_WORKERS, self.initial_workers)
            .with(ATTR_INITIAL_SMALL_VESSELS, self.initial_small_vessels)
            .with(ATTR_INITIAL_BIG_VESSELS, self.initial_big_vessels)
    }
}

/// Vessel class, fixed by its worker capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselSize {
    Small,
    Big,
}

impl VesselSize {
    pub fn capacity(&self) -> u32 {
        match self {
            VesselSize::Small => 50,
            VesselSize::Big => 100,
        }
    }

    pub fn from_capacity(capacity: i64) -> Option<Self> {
        match capacity {
            50 => Some(VesselSize::Small),
            100 => Some(VesselSize::Big),
            _ => None,
        }
    }
}

/// A vessel anchored at a platform, carrying workers up to its capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vessel {
    pub name: String,
    pub size: VesselSize,
    pub current_workers: u32,
}

impl Vessel {
    pub fn new(name: &str, size: VesselSize) -> Self {
        Self {
            name: name.to_string(),
            size,
            current_workers: 0,
        }
    }

    pub fn max_capacity(&self) -> u32 {
        self.size.capacity()
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with(ATTR_NAME, self.name.as_str())
            .with(ATTR_MAX_CAPACITY, self.max_capacity())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub name: String,
    pub job: String,
}

impl Worker {
    pub fn new(name: &str, job: &str) -> Self {
        Self {
            name: name.to_string(),
            job: job.to_string(),
        }
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new()
            .with(ATTR_NAME, self.name.as_str())
            .with(ATTR_JOB, self.job.as_str())
    }
}

// ── Node ──────────────────────────────────────────────────────────

/// Variant payload of a [`Node`].
#[derive(Debug, Clone)]
pub enum NodeKind {
    Platform(Platform),
    Vessel(Vessel),
    Worker(Worker),
    /// Partially-specified node used only to synthesize match clauses.
    Pattern { label: Label, attributes: Attributes },
}

/// A labeled vertex plus the query variable it was last rendered under.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    variable: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            variable: None,
        }
    }

    /// A pattern node with no attributes: matches every node of `label`.
    pub fn pattern(label: Label) -> Self {
        Self::pattern_with(label, Attributes::new())
    }

    pub fn pattern_with(label: Label, attributes: Attributes) -> Self {
        Self::new(NodeKind::Pattern { label, attributes })
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn label(&self) -> Label {
        match &self.kind {
            NodeKind::Platform(_) => Label::Platform,
            NodeKind::Vessel(_) => Label::Vessel,
            NodeKind::Worker(_) => Label::Worker,
            NodeKind::Pattern { label, .. } => *label,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Platform(p) => Some(&p.name),
            NodeKind::Vessel(v) => Some(&v.name),
            NodeKind::Worker(w) => Some(&w.name),
            NodeKind::Pattern { attributes, .. } => {
                attributes.get(ATTR_NAME).and_then(Value::as_str)
            }
        }
    }

    pub fn attributes(&self) -> Attributes {
        match &self.kind {
            NodeKind::Platform(p) => p.attributes(),
            NodeKind::Vessel(v) => v.attributes(),
            NodeKind::Worker(w) => w.attributes(),
            NodeKind::Pattern { attributes, .. } => attributes.clone(),
        }
    }

    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    /// Bind the query variable without rendering.
    pub fn bind(&mut self, variable: &str) {
        self.variable = Some(variable.to_string());
    }

    /// `<CLAUSE> (<var>:<Label> {<attrs>})`, binding `variable` as this
    /// node's identifier for subsequent relationship rendering.
    pub fn render(&mut self, clause: Clause, variable: &str) -> String {
        self.bind(variable);
        format!(
            "{clause} ({variable}:{} {{{}}})",
            self.label(),
            self.attributes().to_cypher()
        )
    }

    /// `<CLAUSE> (<self>)-[<rel>]->(<other>)` using the variable bound by the
    /// most recent [`Node::render`] or [`Node::bind`]. An empty
    /// `other_variable` renders an anonymous endpoint.
    pub fn render_relationship_to(
        &self,
        clause: Clause,
        other_variable: &str,
        relationship: &Relationship,
        relationship_variable: &str,
    ) -> String {
        format!(
            "{clause} ({})-{}->({other_variable})",
            self.variable().unwrap_or_default(),
            relationship.to_cypher(relationship_variable)
        )
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label() && self.attributes() == other.attributes()
    }
}

impl From<Platform> for Node {
    fn from(p: Platform) -> Self {
        Node::new(NodeKind::Platform(p))
    }
}

impl From<Vessel> for Node {
    fn from(v: Vessel) -> Self {
        Node::new(NodeKind::Vessel(v))
    }
}

impl From<Worker> for Node {
    fn from(w: Worker) -> Self {
        Node::new(NodeKind::Worker(w))
    }
}

// ── Relationships ─────────────────────────────────────────────────

pub const REL_PARTNER: &str = "PARTNER";
pub const REL_ANCHORED: &str = "ANCHORED";
pub const REL_DEPLOYED: &str = "DEPLOYED";

/// A directed, optionally-attributed edge type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    label: String,
    attributes: Attributes,
}

impl Relationship {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            attributes: Attributes::new(),
        }
    }

    /// Platform to platform, created once per unordered pair.
    pub fn partner() -> Self {
        Self::new(REL_PARTNER)
    }

    /// Vessel to platform.
    pub fn anchored() -> Self {
        Self::new(REL_ANCHORED)
    }

    /// Worker to platform or vessel.
    pub fn deployed() -> Self {
        Self::new(REL_DEPLOYED)
    }

    /// Untyped edge: matches a relationship regardless of its type.
    pub fn any() -> Self {
        Self::new("")
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn to_cypher(&self, variable: &str) -> String {
        let attrs = self.attributes.to_cypher();
        match (self.label.is_empty(), attrs.is_empty()) {
            (true, true) => format!("[{variable}]"),
            (true, false) => format!("[{variable} {{{attrs}}}]"),
            (false, true) => format!("[{variable}:{}]", self.label),
            (false, false) => format!("[{variable}:{} {{{attrs}}}]", self.label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_bounds_follow_initial_counts() {
        let sea_troll = Platform::new("Sea Troll", 760, 4, 5);
        assert_eq!(sea_troll.min_workers(), 76);
        assert_eq!(sea_troll.max_workers(), 1520);
        assert_eq!(sea_troll.max_small_vessels(), 8);
        assert_eq!(sea_troll.max_big_vessels(), 9);
        assert_eq!(sea_troll.current_vessels(), 9);
    }

    #[test]
    fn test_vessel_count_mutation_keeps_total_in_sync() {
        let mut p = Platform::new("Perdido", 120, 2, 2);
        p.set_vessel_count(VesselSize::Small, 5);
        assert_eq!(p.current_vessels(), 7);
        p.set_vessel_count(VesselSize::Big, 0);
        assert_eq!(p.current_vessels(), 5);
    }

    #[test]
    fn test_render_platform() {
        let mut node = Node::from(Platform::new("Petronius", 360, 4, 3));
        assert_eq!(
            node.render(Clause::Match, "o"),
            "MATCH (o:Platform {name:\"Petronius\", initialWorkers:360, initialSmallVessels:4, initialBigVessels:3})"
        );
        assert_eq!(node.variable(), Some("o"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut node = Node::from(Vessel::new("bigShip0Petronius", VesselSize::Big));
        let first = node.render(Clause::Create, "s");
        let second = node.render(Clause::Create, "s");
        assert_eq!(first, second);
    }

    #[test]
    fn test_null_attributes_are_omitted() {
        let attrs = Attributes::new()
            .with("name", "w1")
            .with("job", Value::Null)
            .with("age", 42i64);
        let mut node = Node::pattern_with(Label::Worker, attrs);
        assert_eq!(
            node.render(Clause::Match, "w"),
            "MATCH (w:Worker {name:\"w1\", age:42})"
        );
    }

    #[test]
    fn test_empty_pattern_renders_empty_map() {
        let mut node = Node::pattern(Label::Vessel);
        assert_eq!(node.render(Clause::Match, "v"), "MATCH (v:Vessel {})");
    }

    #[test]
    fn test_strings_are_escaped() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn test_relationship_rendering() {
        let mut vessel = Node::from(Vessel::new("smallShip0Perdido", VesselSize::Small));
        vessel.bind("s");
        assert_eq!(
            vessel.render_relationship_to(Clause::Create, "o", &Relationship::anchored(), ""),
            "CREATE (s)-[:ANCHORED]->(o)"
        );
        assert_eq!(
            vessel.render_relationship_to(Clause::Match, "", &Relationship::any(), "d"),
            "MATCH (s)-[d]->()"
        );
        let weighted = Relationship::partner().with_attributes(Attributes::new().with("since", 1999i64));
        assert_eq!(weighted.to_cypher("r"), "[r:PARTNER {since:1999}]");
    }

    #[test]
    fn test_equality_ignores_order_and_nulls() {
        let a = Node::pattern_with(
            Label::Worker,
            Attributes::new().with("name", "w").with("job", "diver"),
        );
        let b = Node::pattern_with(
            Label::Worker,
            Attributes::new()
                .with("job", "diver")
                .with("shift", Value::Null)
                .with("name", "w"),
        );
        assert_eq!(a, b);
        assert_eq!(a, Node::from(Worker::new("w", "diver")));
    }

    #[test]
    fn test_equality_detects_mismatch() {
        let a = Node::from(Worker::new("w", "diver"));
        let b = Node::from(Worker::new("w", "welder"));
        let c = Node::pattern_with(Label::Vessel, Attributes::new().with("name", "w").with("job", "diver"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Node::pattern_with(Label::Worker, Attributes::new().with("name", "w")));
    }

    #[test]
    fn test_vessel_size_from_capacity() {
        assert_eq!(VesselSize::from_capacity(50), Some(VesselSize::Small));
        assert_eq!(VesselSize::from_capacity(100), Some(VesselSize::Big));
        assert_eq!(VesselSize::from_capacity(75), None);
    }
}
