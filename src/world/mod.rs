//! World initialization
//!
//! Builds the initial area configuration, loads it into the registry, and
//! pushes it to the backend with unbounded retry: the simulation cannot
//! start without a reachable backend.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::app::AppState;
use crate::backend::protocol::{AreaConfig, House, Person, Store};
use crate::sim::location::Location;
use crate::sim::registry::WorldRegistry;
use crate::util::time::epoch_secs;

fn props(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// The built-in test area: one house, one store, two people.
pub fn default_area(area_id: &str) -> AreaConfig {
    AreaConfig {
        timestamp: chrono::Utc::now().to_rfc3339(),
        area_id: area_id.to_string(),
        houses: vec![House {
            id: "house_001".to_string(),
            name: "Victorian Mansion".to_string(),
            location: Location::new(100.0, 0.0, 100.0),
            properties: props(json!({"style": "victorian", "rooms": 4})),
        }],
        stores: vec![Store {
            id: "store_001".to_string(),
            name: "General Store".to_string(),
            kind: "retail".to_string(),
            location: Location::new(120.0, 0.0, 120.0),
            properties: props(json!({"size": "medium"})),
        }],
        people: vec![
            Person {
                id: "person_001".to_string(),
                name: "John Walker".to_string(),
                sex: "male".to_string(),
                location: Location::new(100.0, 0.0, 100.0),
                properties: props(json!({"age": 30})),
                state: Some("sleeping".to_string()),
            },
            Person {
                id: "person_002".to_string(),
                name: "Sarah Chen".to_string(),
                sex: "female".to_string(),
                location: Location::new(150.0, 0.0, 150.0),
                properties: props(json!({"age": 25})),
                state: Some("sleeping".to_string()),
            },
        ],
        metadata: props(json!({"time_of_day": "morning", "weather": "sunny"})),
    }
}

/// Load an area configuration into the registry. People become simulated
/// entities; houses and stores are static.
pub fn load_registry(registry: &WorldRegistry, config: &AreaConfig, now: f64) {
    registry.load_static(config.houses.clone(), config.stores.clone());
    for person in &config.people {
        registry.add_entity(&person.id, &person.name, person.location, now);
    }
}

/// Build the world, populate the registry, and push the configuration to
/// the backend, polling until it is reachable.
pub async fn initialize(state: &AppState) {
    let config = default_area(&state.config.area_id);
    load_registry(&state.registry, &config, epoch_secs());
    info!(
        area_id = %config.area_id,
        people = config.people.len(),
        houses = config.houses.len(),
        stores = config.stores.len(),
        "world loaded"
    );

    let payload = serde_json::to_value(&config).unwrap_or(Value::Null);
    state.backend.deliver_until_ready("area-config", &payload).await;
    info!("initial world configuration sent to backend");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_area_has_expected_population() {
        let area = default_area("test_area");
        assert_eq!(area.area_id, "test_area");
        assert_eq!(area.houses.len(), 1);
        assert_eq!(area.stores.len(), 1);
        assert_eq!(area.people.len(), 2);
        assert_eq!(area.people[0].id, "person_001");
        assert_eq!(area.metadata["weather"], "sunny");
        assert!(chrono::DateTime::parse_from_rfc3339(&area.timestamp).is_ok());
    }

    #[test]
    fn load_registry_populates_entities_and_statics() {
        let registry = WorldRegistry::new();
        let area = default_area("test_area");
        load_registry(&registry, &area, 0.0);

        assert_eq!(registry.entity_count(), 2);
        assert!(registry.contains_entity("person_001"));
        assert!(registry.contains_entity("person_002"));
        assert_eq!(registry.houses().len(), 1);
        assert_eq!(registry.stores().len(), 1);

        let view = registry.entity_view("person_002", 0.0).unwrap();
        assert_eq!(view.name, "Sarah Chen");
        assert!(!view.is_moving);
    }
}
