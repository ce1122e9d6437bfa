//! Per-entity movement and sleep state machines

use serde::{Deserialize, Serialize};

use super::location::Location;

/// Walking pace in world units per second
pub const WALK_SPEED: f64 = 2.0;
/// Running pace in world units per second
pub const RUN_SPEED: f64 = 5.0;

/// How an entity travels toward its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Walk,
    Run,
}

impl MovementKind {
    pub fn speed(self) -> f64 {
        match self {
            MovementKind::Walk => WALK_SPEED,
            MovementKind::Run => RUN_SPEED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Walk => "walk",
            MovementKind::Run => "run",
        }
    }
}

/// Movement axis. A target exists exactly while the entity is moving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Movement {
    Idle,
    Moving {
        target: Location,
        speed: f64,
        kind: MovementKind,
    },
}

/// Sleep axis. `wake_at` is an absolute deadline in epoch seconds;
/// `None` means the entity sleeps until an explicit wake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sleep {
    Awake,
    Asleep { wake_at: Option<f64> },
}

/// Transitions observed by a single `advance` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Movement finished this tick (Moving -> Idle)
    pub arrived: bool,
    /// Sleep deadline passed this tick (Asleep -> Awake)
    pub woke: bool,
}

/// Authoritative state for one simulated entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub entity_id: String,
    pub name: String,
    current_location: Location,
    movement: Movement,
    sleep: Sleep,
    /// Timestamp of the last `advance`, used to compute per-tick delta time
    last_update: f64,
}

impl EntityState {
    pub fn new(entity_id: String, name: String, location: Location, now: f64) -> Self {
        Self {
            entity_id,
            name,
            current_location: location,
            movement: Movement::Idle,
            sleep: Sleep::Awake,
            last_update: now,
        }
    }

    pub fn current_location(&self) -> Location {
        self.current_location
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.movement, Movement::Moving { .. })
    }

    pub fn is_sleeping(&self) -> bool {
        matches!(self.sleep, Sleep::Asleep { .. })
    }

    pub fn target_location(&self) -> Option<Location> {
        match self.movement {
            Movement::Moving { target, .. } => Some(target),
            Movement::Idle => None,
        }
    }

    pub fn movement_kind(&self) -> Option<MovementKind> {
        match self.movement {
            Movement::Moving { kind, .. } => Some(kind),
            Movement::Idle => None,
        }
    }

    /// Begin walking or running toward `target`.
    ///
    /// Overwrites any in-flight movement; there is no queueing.
    pub fn set_movement_target(&mut self, target: Location, kind: MovementKind) {
        self.movement = Movement::Moving {
            target,
            speed: kind.speed(),
            kind,
        };
    }

    /// Relocate instantly, cancelling any in-flight walk or run.
    pub fn teleport(&mut self, location: Location) {
        self.current_location = location;
        self.movement = Movement::Idle;
    }

    /// Enter sleep. With a duration the entity wakes on its own at
    /// `now + duration`; without one it sleeps until an explicit `wake`.
    /// Re-entrant: sleeping again resets the deadline.
    pub fn sleep(&mut self, now: f64, duration: Option<f64>) {
        self.sleep = Sleep::Asleep {
            wake_at: duration.map(|d| now + d),
        };
    }

    /// Exit sleep. Idempotent.
    pub fn wake(&mut self) {
        self.sleep = Sleep::Awake;
    }

    /// Advance the entity to `now`. The only place position and sleep
    /// change as a function of elapsed time.
    ///
    /// A zero or negative delta (clock went backward between ticks) is a
    /// movement no-op; the entity never moves backward and no division by
    /// the elapsed time occurs.
    pub fn advance(&mut self, now: f64) -> AdvanceReport {
        let dt = now - self.last_update;
        self.last_update = now;

        let mut report = AdvanceReport::default();

        if dt > 0.0 {
            if let Movement::Moving { target, speed, .. } = self.movement {
                let remaining = self.current_location.distance_to(&target);
                let step = speed * dt;
                if step >= remaining {
                    self.current_location = target;
                    self.movement = Movement::Idle;
                    report.arrived = true;
                } else {
                    self.current_location = self.current_location.step_toward(&target, step);
                }
            }
        }

        if let Sleep::Asleep { wake_at: Some(wake_at) } = self.sleep {
            if now >= wake_at {
                self.sleep = Sleep::Awake;
                report.woke = true;
            }
        }

        report
    }

    /// Distance left to the movement target, `None` when idle
    pub fn distance_to_target(&self) -> Option<f64> {
        self.target_location()
            .map(|target| self.current_location.distance_to(&target))
    }

    /// Seconds until the wake deadline, `None` when awake or sleeping
    /// indefinitely
    pub fn sleep_time_remaining(&self, now: f64) -> Option<f64> {
        match self.sleep {
            Sleep::Asleep { wake_at: Some(wake_at) } => Some((wake_at - now).max(0.0)),
            _ => None,
        }
    }
}
