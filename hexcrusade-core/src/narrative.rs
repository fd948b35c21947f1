//! Outbound narrative and score streams
//!
//! The engine never calls its collaborators directly. It appends
//! `EngineEvent`s to an outbox that the host drains and forwards to whatever
//! `NarrativeSink`/`ScoreSink` it runs with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Story graph node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Story graph edge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGraph {
    pub nodes: Vec<StoryNode>,
    pub edges: Vec<StoryEdge>,
}

impl StoryGraph {
    /// The crusade's story graph
    pub fn crusade() -> Self {
        let node = |id: &str, label: &str, kind: &str| StoryNode {
            id: id.into(),
            label: label.into(),
            kind: kind.into(),
        };
        let edge = |from: &str, to: &str, label: Option<&str>| StoryEdge {
            from: from.into(),
            to: to.into(),
            label: label.map(Into::into),
        };

        Self {
            nodes: vec![
                node("intro", "The Crusade Begins", "scene"),
                node("battle-1", "Border Outpost", "scene"),
                node("choice-1", "Mercy or Raze?", "choice"),
                node("battle-2", "Forest Stronghold", "scene"),
                node("choice-2", "Shortcut or Safe?", "choice"),
                node("battle-3", "Dark Fortress", "scene"),
                node("victory", "Victory!", "scene"),
                node("defeat", "Defeat", "scene"),
            ],
            edges: vec![
                edge("intro", "battle-1", None),
                edge("battle-1", "choice-1", None),
                edge("choice-1", "battle-2", Some("Mercy")),
                edge("choice-1", "battle-2", Some("Raze")),
                edge("battle-2", "choice-2", None),
                edge("choice-2", "battle-3", Some("Shortcut")),
                edge("choice-2", "battle-3", Some("Safe path")),
                edge("battle-3", "victory", None),
                edge("battle-3", "defeat", None),
            ],
        }
    }
}

/// Snapshot sent to the narrative sink
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativePayload {
    pub variables: BTreeMap<String, Value>,
    pub current_node: String,
    pub graph: StoryGraph,
    pub event: String,
}

/// Something the host must forward
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    Narrative(NarrativePayload),
    Score { score: i64 },
}

/// Receives narrative updates
pub trait NarrativeSink {
    fn update(&mut self, payload: &NarrativePayload);
}

/// Receives the final score of a run
pub trait ScoreSink {
    fn submit(&mut self, score: i64);
}

/// Tracked story state; every change queues a payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    variables: BTreeMap<String, Value>,
    current_node: String,
    graph: StoryGraph,
}

impl Default for Narrative {
    fn default() -> Self {
        let mut variables = BTreeMap::new();
        variables.insert("morale".to_string(), Value::from(5));
        variables.insert("battles_won".to_string(), Value::from(0));
        variables.insert("casualties".to_string(), Value::from(0));
        Self {
            variables,
            current_node: "intro".to_string(),
            graph: StoryGraph::crusade(),
        }
    }
}

impl Narrative {
    pub fn current_node(&self) -> &str {
        &self.current_node
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Integer variable, 0 when missing or not a number
    pub fn int_var(&self, name: &str) -> i64 {
        self.var(name).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Move to a story node
    pub fn transition(&mut self, node: &str, event: impl Into<String>) -> EngineEvent {
        self.current_node = node.to_string();
        self.report(event.into())
    }

    /// Set a tracked variable
    pub fn set_var(&mut self, name: &str, value: impl Into<Value>, reason: Option<String>) -> EngineEvent {
        let value = value.into();
        let event = reason.unwrap_or_else(|| format!("{} = {}", name, value));
        self.variables.insert(name.to_string(), value);
        self.report(event)
    }

    fn report(&self, event: String) -> EngineEvent {
        EngineEvent::Narrative(NarrativePayload {
            variables: self.variables.clone(),
            current_node: self.current_node.clone(),
            graph: self.graph.clone(),
            event,
        })
    }
}

/// Forward drained events to the sinks
pub fn dispatch(
    events: impl IntoIterator<Item = EngineEvent>,
    narrative: &mut dyn NarrativeSink,
    score: &mut dyn ScoreSink,
) {
    for event in events {
        match event {
            EngineEvent::Narrative(payload) => narrative.update(&payload),
            EngineEvent::Score { score: value } => score.submit(value),
        }
    }
}

/// Sink that keeps everything it receives
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub payloads: Vec<NarrativePayload>,
    pub scores: Vec<i64>,
}

impl NarrativeSink for Recorder {
    fn update(&mut self, payload: &NarrativePayload) {
        self.payloads.push(payload.clone());
    }
}

impl ScoreSink for Recorder {
    fn submit(&mut self, score: i64) {
        self.scores.push(score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_payload() {
        let mut narrative = Narrative::default();
        let event = narrative.transition("battle-1", "The crusade begins");
        match event {
            EngineEvent::Narrative(payload) => {
                assert_eq!(payload.current_node, "battle-1");
                assert_eq!(payload.event, "The crusade begins");
                assert_eq!(payload.variables["morale"], Value::from(5));
                assert_eq!(payload.graph.nodes.len(), 8);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_var_default_reason() {
        let mut narrative = Narrative::default();
        let event = narrative.set_var("battles_won", 1, None);
        assert_eq!(narrative.int_var("battles_won"), 1);
        let EngineEvent::Narrative(payload) = event else {
            panic!("expected narrative event");
        };
        assert_eq!(payload.event, "battles_won = 1");
    }

    #[test]
    fn test_payload_json_shape() {
        let mut narrative = Narrative::default();
        let EngineEvent::Narrative(payload) = narrative.transition("intro", "loaded") else {
            panic!("expected narrative event");
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["currentNode"], "intro");
        assert_eq!(json["graph"]["nodes"][0]["type"], "scene");
        assert!(json["graph"]["edges"][0].get("label").is_none());
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut narrative = Narrative::default();
        let events = vec![narrative.transition("defeat", "lost"), EngineEvent::Score { score: 120 }];
        let mut story = Recorder::default();
        let mut scores = Recorder::default();
        dispatch(events, &mut story, &mut scores);
        assert_eq!(story.payloads.len(), 1);
        assert_eq!(scores.scores, vec![120]);
    }
}
