//! The record of an evacuation: what ran, how to undo it, and what to tell
//! the user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Forward queries, their compensations and narration of one evacuation.
///
/// `compensating` is kept in replay order: the undo of the most recent
/// forward query comes first, so replaying the list front to back restores
/// the graph step by step in reverse.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: Uuid,
    pub platform: String,
    pub created_at: DateTime<Utc>,
    forward: Vec<String>,
    compensating: Vec<String>,
    narration: Vec<String>,
    /// Vessels that took part but found no partner able to take them.
    pub unplaced_vessels: Vec<String>,
    /// Planner's final estimate of workers left on the platform.
    pub remaining_estimate: i64,
}

impl Plan {
    pub fn new(platform: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform: platform.to_string(),
            created_at: Utc::now(),
            forward: Vec::new(),
            compensating: Vec::new(),
            narration: Vec::new(),
            unplaced_vessels: Vec::new(),
            remaining_estimate: 0,
        }
    }

    /// Append one applied step.
    pub(crate) fn record(&mut self, forward: String, compensating: String, narration: String) {
        self.forward.push(forward);
        self.compensating.insert(0, compensating);
        self.narration.push(narration);
    }

    pub fn forward(&self) -> &[String] {
        &self.forward
    }

    pub fn compensating(&self) -> &[String] {
        &self.compensating
    }

    pub fn narration(&self) -> &[String] {
        &self.narration
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensations_replay_in_reverse() {
        let mut plan = Plan::new("Petronius");
        plan.record("f1".into(), "u1".into(), "n1".into());
        plan.record("f2".into(), "u2".into(), "n2".into());
        plan.record("f3".into(), "u3".into(), "n3".into());

        assert_eq!(plan.forward(), ["f1", "f2", "f3"]);
        assert_eq!(plan.compensating(), ["u3", "u2", "u1"]);
        assert_eq!(plan.narration(), ["n1", "n2", "n3"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_serializes_steps() {
        let mut plan = Plan::new("Perdido");
        plan.record("f".into(), "u".into(), "n".into());
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["platform"], "Perdido");
        assert_eq!(json["compensating"][0], "u");
    }
}
