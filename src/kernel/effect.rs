use serde::{Deserialize, Serialize};

use crate::kernel::ids::EditorId;
use crate::kernel::services::ports::ModeDescriptor;

/// Work the store asks its host to carry out. Completions come back as
/// actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Load the syntax mode, then dispatch `Action::ModeLoaded`.
    LoadMode {
        editor_id: EditorId,
        descriptor: ModeDescriptor,
    },
}
