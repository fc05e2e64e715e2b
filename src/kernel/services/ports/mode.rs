use serde::{Deserialize, Serialize};

use crate::models::FileEntity;

/// Syntax mode a surface can be switched to once it has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    pub mode: String,
    pub mime: String,
}

pub trait ModeResolver {
    fn resolve_mode_for_file(&self, file: &FileEntity) -> Option<ModeDescriptor>;
}
