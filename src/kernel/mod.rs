//! Headless workbench state (stores, actions, effects).

pub mod action;
pub mod editor;
pub mod effect;
pub mod error;
pub mod ids;
pub mod registry;
pub mod services;
pub mod store;
pub mod tabs;

pub use action::Action;
pub use editor::{EditorInstance, EditorProps, EditorStore, EditorUpdate, GitBlame};
pub use effect::Effect;
pub use error::StoreError;
pub use ids::{EditorId, GroupId, TabId};
pub use store::{DispatchResult, Store, TabState};
pub use tabs::{ContextMenuState, GroupProps, Tab, TabFlags, TabGroup, TabProps, TabStore};
