//! Services layer (ports + adapters).
//!
//! - `ports`: contracts the stores depend on (surface, mode resolution, settings).
//! - `adapters`: concrete implementations used by the replay tool and tests.

pub mod adapters;
pub mod ports;
