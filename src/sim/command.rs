//! Operator command validation and application

use thiserror::Error;
use tracing::info;

use crate::backend::protocol::CommandRequest;

use super::entity::MovementKind;
use super::location::Location;
use super::registry::{EntityView, WorldRegistry};

/// Why a command was rejected. Validation and lookup failures never touch
/// entity state.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command type: {0}")]
    UnknownCommand(String),

    #[error("{0} command requires destination")]
    MissingDestination(&'static str),

    #[error("Teleport command requires target location")]
    MissingTarget,

    #[error("Entity not found: {0}")]
    UnknownEntity(String),
}

/// A fully validated command, ready to apply
enum Action {
    Move { target: Location, kind: MovementKind },
    Teleport(Location),
    Sleep(Option<f64>),
    Wake,
}

impl Action {
    /// Validate the raw request. No entity state is read or written here,
    /// so a rejected command provably leaves the world untouched.
    fn parse(request: &CommandRequest) -> Result<Self, CommandError> {
        match request.command.as_str() {
            "walk" => Ok(Action::Move {
                target: request
                    .destination
                    .ok_or(CommandError::MissingDestination("walk"))?,
                kind: MovementKind::Walk,
            }),
            "run" => Ok(Action::Move {
                target: request
                    .destination
                    .ok_or(CommandError::MissingDestination("run"))?,
                kind: MovementKind::Run,
            }),
            "teleport" => Ok(Action::Teleport(
                request
                    .target
                    .or(request.destination)
                    .ok_or(CommandError::MissingTarget)?,
            )),
            "sleep" => Ok(Action::Sleep(request.duration)),
            "wake" => Ok(Action::Wake),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Apply an operator command and return the entity's post-command view.
///
/// The command is recorded for observability before any outcome is known,
/// so rejected commands show up on the status surface too.
pub fn apply_command(
    registry: &WorldRegistry,
    request: &CommandRequest,
    now: f64,
) -> Result<EntityView, CommandError> {
    registry.record_command(request.clone(), now);

    if !registry.contains_entity(&request.entity_id) {
        return Err(CommandError::UnknownEntity(request.entity_id.clone()));
    }

    let action = Action::parse(request)?;
    let entity_id = request.entity_id.as_str();

    registry.with_entity(entity_id, |entity| match action {
        Action::Move { target, kind } => {
            entity.set_movement_target(target, kind);
            info!(entity_id, kind = kind.as_str(), ?target, "movement started");
        }
        Action::Teleport(location) => {
            entity.teleport(location);
            info!(entity_id, ?location, "teleported");
        }
        Action::Sleep(duration) => {
            entity.sleep(now, duration);
            info!(entity_id, ?duration, "going to sleep");
        }
        Action::Wake => {
            entity.wake();
            info!(entity_id, "waking up");
        }
    });

    registry
        .entity_view(entity_id, now)
        .ok_or_else(|| CommandError::UnknownEntity(request.entity_id.clone()))
}
