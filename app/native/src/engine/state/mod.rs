//! Runtime state types owned by the engine.
//!
//! Clients and screens are mutated only by the engine's event loop; everything
//! here is plain data.

mod types;

pub use types::{
    Client, ClientFlags, ClientId, GeometryParseError, Rect, Screen, TagSet, ViewSet,
};
