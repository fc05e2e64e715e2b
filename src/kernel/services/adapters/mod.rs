//! Service adapters.

pub mod mode;
pub mod settings;
pub mod surface;

pub use mode::ExtensionModeResolver;
pub use settings::{get_settings_path, load_settings, SettingsError};
pub use surface::{HeadlessSurfaceFactory, SharedSurfaceLog, SurfaceEvent, SurfaceLog};
