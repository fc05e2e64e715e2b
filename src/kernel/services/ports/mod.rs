//! Service ports: traits + data contracts.

pub mod mode;
pub mod settings;
pub mod surface;

pub use mode::{ModeDescriptor, ModeResolver};
pub use settings::Settings;
pub use surface::{EditorOptions, EditorSurface, SurfaceFactory};
