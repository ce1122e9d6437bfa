//! Wire types for engine <-> backend communication
//!
//! The backend forwards operator commands to `/command` on the engine;
//! the engine pushes transition events and the world configuration to the
//! backend's `/command`, `/event`, and `/area-config` routes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sim::location::Location;

/// Operator command as the backend sends it.
///
/// `command` stays a free string at the wire boundary; recognition and
/// validation happen in `sim::command` so unknown kinds are rejected with
/// a proper error instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// House placed at world init
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: String,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Store placed at world init
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: Location,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Person placed at world init; becomes a simulated entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub sex: String,
    pub location: Location,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Initial display state hint for the backend ("sleeping", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Initial area configuration pushed to the backend before the first tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    pub timestamp: String,
    pub area_id: String,
    pub houses: Vec<House>,
    pub stores: Vec<Store>,
    pub people: Vec<Person>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Synthetic command carrying an arrival position update
#[derive(Debug, Clone, Serialize)]
struct MoveToCommand<'a> {
    command: &'static str,
    entity_id: &'a str,
    destination: Location,
}

/// Event envelope for non-positional transitions
#[derive(Debug, Clone, Serialize)]
struct EventMsg<'a> {
    event: &'static str,
    entity_id: &'a str,
    target: Value,
    timestamp: String,
}

/// A state transition bound for the backend
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Movement finished; pushed as a synthetic `move_to` command
    Arrived {
        entity_id: String,
        destination: Location,
    },
    /// Sleep deadline passed
    WokeUp { entity_id: String },
}

impl OutboundEvent {
    /// Backend route this event posts to
    pub fn endpoint(&self) -> &'static str {
        match self {
            OutboundEvent::Arrived { .. } => "command",
            OutboundEvent::WokeUp { .. } => "event",
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            OutboundEvent::Arrived { entity_id, .. } => entity_id,
            OutboundEvent::WokeUp { entity_id } => entity_id,
        }
    }

    /// Wire payload, stamped at serialization time
    pub fn to_payload(&self) -> Value {
        match self {
            OutboundEvent::Arrived {
                entity_id,
                destination,
            } => serde_json::to_value(MoveToCommand {
                command: "move_to",
                entity_id,
                destination: *destination,
            })
            .unwrap_or(Value::Null),
            OutboundEvent::WokeUp { entity_id } => serde_json::to_value(EventMsg {
                event: "woke_up",
                entity_id,
                target: Value::Object(Map::new()),
                timestamp: Utc::now().to_rfc3339(),
            })
            .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_request_accepts_minimal_body() {
        let cmd: CommandRequest =
            serde_json::from_str(r#"{"command": "wake", "entity_id": "person_001"}"#).unwrap();
        assert_eq!(cmd.command, "wake");
        assert_eq!(cmd.entity_id, "person_001");
        assert!(cmd.destination.is_none());
        assert!(cmd.duration.is_none());
    }

    #[test]
    fn command_request_carries_locations() {
        let cmd: CommandRequest = serde_json::from_str(
            r#"{
                "command": "walk",
                "entity_id": "person_002",
                "destination": {"x": 1.5, "y": 0.0, "z": -2.0},
                "speed": 3.0
            }"#,
        )
        .unwrap();
        let dest = cmd.destination.unwrap();
        assert_eq!(dest, Location::new(1.5, 0.0, -2.0));
        assert_eq!(cmd.speed, Some(3.0));
    }

    #[test]
    fn arrival_serializes_as_move_to() {
        let event = OutboundEvent::Arrived {
            entity_id: "person_001".to_string(),
            destination: Location::new(10.0, 0.0, 0.0),
        };
        assert_eq!(event.endpoint(), "command");
        let payload = event.to_payload();
        assert_eq!(payload["command"], "move_to");
        assert_eq!(payload["entity_id"], "person_001");
        assert_eq!(payload["destination"]["x"], 10.0);
    }

    #[test]
    fn woke_up_serializes_with_timestamp() {
        let event = OutboundEvent::WokeUp {
            entity_id: "person_002".to_string(),
        };
        assert_eq!(event.endpoint(), "event");
        let payload = event.to_payload();
        assert_eq!(payload["event"], "woke_up");
        assert_eq!(payload["entity_id"], "person_002");
        assert!(payload["target"].as_object().unwrap().is_empty());
        let stamp = payload["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn area_config_round_trips() {
        let json = r#"{
            "timestamp": "2026-08-06T08:00:00Z",
            "area_id": "test_area",
            "houses": [{"id": "house_001", "name": "Victorian Mansion",
                        "location": {"x": 100.0, "y": 0.0, "z": 100.0},
                        "properties": {"style": "victorian", "rooms": 4}}],
            "stores": [{"id": "store_001", "name": "General Store", "type": "retail",
                        "location": {"x": 120.0, "y": 0.0, "z": 120.0},
                        "properties": {"size": "medium"}}],
            "people": [{"id": "person_001", "name": "John Walker", "sex": "male",
                        "location": {"x": 100.0, "y": 0.0, "z": 100.0},
                        "properties": {"age": 30}, "state": "sleeping"}],
            "metadata": {"time_of_day": "morning", "weather": "sunny"}
        }"#;
        let config: AreaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.area_id, "test_area");
        assert_eq!(config.stores[0].kind, "retail");
        assert_eq!(config.people[0].state.as_deref(), Some("sleeping"));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["stores"][0]["type"], "retail");
        assert_eq!(back["metadata"]["weather"], "sunny");
    }
}
