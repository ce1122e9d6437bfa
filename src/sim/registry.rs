//! World registry: entities, static objects, and the last-command slot

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::backend::protocol::{CommandRequest, House, Store};

use super::entity::{AdvanceReport, EntityState, MovementKind};
use super::location::Location;

/// Most recent command, kept purely for observability
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub command: CommandRequest,
    pub at: f64,
}

/// Read-only snapshot of one entity, served over HTTP and echoed in
/// command responses
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub entity_id: String,
    pub name: String,
    pub location: Location,
    pub is_moving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<MovementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_to_target: Option<f64>,
    pub is_sleeping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_time_remaining: Option<f64>,
}

impl EntityView {
    fn of(entity: &EntityState, now: f64) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            name: entity.name.clone(),
            location: entity.current_location(),
            is_moving: entity.is_moving(),
            movement_type: entity.movement_kind(),
            target: entity.target_location(),
            distance_to_target: entity.distance_to_target(),
            is_sleeping: entity.is_sleeping(),
            sleep_time_remaining: entity.sleep_time_remaining(now),
        }
    }
}

/// A movement or sleep transition observed during a tick, with the
/// entity's location copied out for dispatch
#[derive(Debug, Clone)]
pub struct Transition {
    pub entity_id: String,
    pub report: AdvanceReport,
    pub location: Location,
}

/// Owns all simulated entities and the static world.
///
/// The entity map is a DashMap: a command mutates one entity under its
/// entry lock while a tick is advancing others, so each entity has a
/// single writer at a time. Static objects are written once at world init.
pub struct WorldRegistry {
    entities: DashMap<String, EntityState>,
    houses: RwLock<Vec<House>>,
    stores: RwLock<Vec<Store>>,
    last_command: Mutex<Option<RecordedCommand>>,
}

impl WorldRegistry {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
            houses: RwLock::new(Vec::new()),
            stores: RwLock::new(Vec::new()),
            last_command: Mutex::new(None),
        }
    }

    /// Insert an entity with Idle/Awake defaults.
    ///
    /// Re-adding an existing id resets it: world init is the only call
    /// site and ids are expected unique, so a duplicate means a fresh
    /// start rather than an error.
    pub fn add_entity(&self, id: &str, name: &str, location: Location, now: f64) {
        self.entities.insert(
            id.to_string(),
            EntityState::new(id.to_string(), name.to_string(), location, now),
        );
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Run `f` against the named entity under its entry lock.
    /// Returns `None` for an unknown id.
    pub fn with_entity<R>(&self, id: &str, f: impl FnOnce(&mut EntityState) -> R) -> Option<R> {
        self.entities.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Snapshot one entity for a command response
    pub fn entity_view(&self, id: &str, now: f64) -> Option<EntityView> {
        self.entities.get(id).map(|entry| EntityView::of(entry.value(), now))
    }

    /// Snapshot every entity for the status endpoint
    pub fn entity_views(&self, now: f64) -> Vec<EntityView> {
        let mut views: Vec<EntityView> = self
            .entities
            .iter()
            .map(|entry| EntityView::of(entry.value(), now))
            .collect();
        views.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        views
    }

    /// Advance every entity to `now`, collecting the transitions that
    /// fired. Iteration order is irrelevant; entities are independent.
    pub fn advance_all(&self, now: f64) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for mut entry in self.entities.iter_mut() {
            let entity = entry.value_mut();
            let report = entity.advance(now);
            if report.arrived || report.woke {
                transitions.push(Transition {
                    entity_id: entity.entity_id.clone(),
                    report,
                    location: entity.current_location(),
                });
            }
        }
        transitions
    }

    /// Store the static world. Called once at world init.
    pub fn load_static(&self, houses: Vec<House>, stores: Vec<Store>) {
        *self.houses.write() = houses;
        *self.stores.write() = stores;
    }

    pub fn houses(&self) -> Vec<House> {
        self.houses.read().clone()
    }

    pub fn stores(&self) -> Vec<Store> {
        self.stores.read().clone()
    }

    /// Remember the most recent command. Most recent wins; nothing else
    /// depends on this slot.
    pub fn record_command(&self, command: CommandRequest, at: f64) {
        *self.last_command.lock() = Some(RecordedCommand { command, at });
    }

    /// The last command, if one arrived within `window` seconds of `now`
    pub fn last_command(&self, now: f64, window: f64) -> Option<RecordedCommand> {
        self.last_command
            .lock()
            .clone()
            .filter(|recorded| now - recorded.at <= window)
    }
}

impl Default for WorldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::MovementKind;

    fn sample_command(kind: &str) -> CommandRequest {
        CommandRequest {
            command: kind.to_string(),
            entity_id: "person_001".to_string(),
            target: None,
            destination: None,
            direction: None,
            target_name: None,
            speed: None,
            duration: None,
        }
    }

    #[test]
    fn add_and_lookup() {
        let registry = WorldRegistry::new();
        registry.add_entity("person_001", "John Walker", Location::new(1.0, 0.0, 1.0), 0.0);

        assert_eq!(registry.entity_count(), 1);
        assert!(registry.contains_entity("person_001"));
        assert!(!registry.contains_entity("person_999"));

        let view = registry.entity_view("person_001", 0.0).unwrap();
        assert_eq!(view.name, "John Walker");
        assert!(!view.is_moving);
        assert!(!view.is_sleeping);

        assert!(registry.entity_view("person_999", 0.0).is_none());
        assert!(registry.with_entity("person_999", |_| ()).is_none());
    }

    #[test]
    fn readding_an_id_resets_the_entity() {
        let registry = WorldRegistry::new();
        registry.add_entity("person_001", "John Walker", Location::new(0.0, 0.0, 0.0), 0.0);
        registry
            .with_entity("person_001", |e| {
                e.set_movement_target(Location::new(9.0, 0.0, 0.0), MovementKind::Run);
                e.sleep(0.0, None);
            })
            .unwrap();

        registry.add_entity("person_001", "John Walker", Location::new(5.0, 5.0, 5.0), 1.0);
        let view = registry.entity_view("person_001", 1.0).unwrap();
        assert_eq!(view.location, Location::new(5.0, 5.0, 5.0));
        assert!(!view.is_moving);
        assert!(!view.is_sleeping);
    }

    #[test]
    fn advance_all_reports_only_transitions() {
        let registry = WorldRegistry::new();
        registry.add_entity("walker", "Walker", Location::new(0.0, 0.0, 0.0), 0.0);
        registry.add_entity("sleeper", "Sleeper", Location::new(0.0, 0.0, 0.0), 0.0);
        registry.add_entity("idler", "Idler", Location::new(0.0, 0.0, 0.0), 0.0);

        registry
            .with_entity("walker", |e| {
                e.set_movement_target(Location::new(100.0, 0.0, 0.0), MovementKind::Walk)
            })
            .unwrap();
        registry
            .with_entity("sleeper", |e| e.sleep(0.0, Some(5.0)))
            .unwrap();

        // Mid-flight, pre-deadline: nothing fires
        assert!(registry.advance_all(1.0).is_empty());

        // Sleeper's deadline passes; walker still has 90+ units to go
        let transitions = registry.advance_all(6.0);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].entity_id, "sleeper");
        assert!(transitions[0].report.woke);
        assert!(!transitions[0].report.arrived);
    }

    #[test]
    fn last_command_is_most_recent_and_windowed() {
        let registry = WorldRegistry::new();
        registry.record_command(sample_command("walk"), 10.0);
        registry.record_command(sample_command("sleep"), 20.0);

        let recorded = registry.last_command(21.0, 5.0).unwrap();
        assert_eq!(recorded.command.command, "sleep");

        assert!(registry.last_command(26.0, 5.0).is_none());
    }

    #[test]
    fn static_objects_survive_load() {
        let registry = WorldRegistry::new();
        registry.load_static(
            vec![House {
                id: "house_001".to_string(),
                name: "Victorian Mansion".to_string(),
                location: Location::new(100.0, 0.0, 100.0),
                properties: serde_json::Map::new(),
            }],
            Vec::new(),
        );
        assert_eq!(registry.houses().len(), 1);
        assert_eq!(registry.houses()[0].id, "house_001");
        assert!(registry.stores().is_empty());
    }
}
