//! Entity simulation modules

pub mod command;
pub mod entity;
pub mod location;
pub mod registry;
pub mod tick;

pub use registry::WorldRegistry;
pub use tick::TickLoop;
