//! HTTP surface of the engine

pub mod routes;

pub use routes::build_router;
