// Adapters layer: concrete implementations for external systems.

pub mod sqlite;

pub use sqlite::Destination;
