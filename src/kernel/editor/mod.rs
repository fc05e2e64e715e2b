//! Editor store: editing-surface instances keyed by id.

mod state;

pub use state::{EditorInstance, EditorProps, EditorStore, EditorUpdate, GitBlame};
