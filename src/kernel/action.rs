use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::ids::{EditorId, GroupId, TabId};
use crate::kernel::tabs::{GroupProps, TabFlags, TabProps};
use crate::models::FilePatch;

/// A mutation request. Every variant maps to one store entry point and
/// serializes as `{"name": ..., "args": ...}` so it can be logged and
/// replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all_fields = "camelCase")]
pub enum Action {
    #[serde(rename = "file:upsert")]
    UpsertFile {
        path: String,
        #[serde(default)]
        attributes: FilePatch,
    },
    #[serde(rename = "file:rename")]
    RenameFile { from: String, to: String },
    #[serde(rename = "file:remove")]
    RemoveFile { path: String },
    #[serde(rename = "tab:create")]
    CreateTab(TabProps),
    /// `props.id` names the tab to update.
    #[serde(rename = "tab:update")]
    UpdateTab(TabProps),
    /// Applies `props` to every tab whose editor is bound to `path`.
    #[serde(rename = "tab:update_by_path")]
    UpdateTabByPath {
        path: String,
        #[serde(default)]
        props: TabProps,
    },
    #[serde(rename = "tab:update_flags")]
    UpdateTabFlags { tab_id: TabId, flags: TabFlags },
    #[serde(rename = "tab:remove")]
    RemoveTab { tab_id: TabId },
    #[serde(rename = "tab:remove_other")]
    RemoveOtherTabs { tab_id: TabId },
    #[serde(rename = "tab:remove_all")]
    RemoveAllTabs { tab_id: TabId },
    #[serde(rename = "tab:activate")]
    ActivateTab { tab_id: TabId },
    #[serde(rename = "tab:insert_at")]
    InsertTabBefore { tab_id: TabId, before_tab_id: TabId },
    #[serde(rename = "tab:move_to_tab_group")]
    MoveTabToGroup { tab_id: TabId, group_id: GroupId },
    #[serde(rename = "tab:create_tab_group")]
    CreateGroup(GroupProps),
    #[serde(rename = "tab:remove_tab_group")]
    RemoveGroup { group_id: GroupId },
    #[serde(rename = "tab:activate_tab_group")]
    ActivateGroup { group_id: GroupId },
    #[serde(rename = "tab:context_menu_open")]
    OpenContextMenu {
        x: i32,
        y: i32,
        #[serde(default)]
        tab_id: Option<TabId>,
        #[serde(default)]
        group_id: Option<GroupId>,
    },
    #[serde(rename = "tab:context_menu_close")]
    CloseContextMenu,
    #[serde(rename = "editor:set_default_option")]
    SetDefaultOption { option: String, value: Value },
    #[serde(rename = "editor:set_option")]
    SetEditorOption {
        editor_id: EditorId,
        option: String,
        value: Value,
    },
    #[serde(rename = "editor:clear_option")]
    ClearEditorOption { editor_id: EditorId, option: String },
    /// Completion of an `Effect::LoadMode`.
    #[serde(rename = "editor:mode_loaded")]
    ModeLoaded { editor_id: EditorId, mime: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::UpsertFile { .. } => "file:upsert",
            Action::RenameFile { .. } => "file:rename",
            Action::RemoveFile { .. } => "file:remove",
            Action::CreateTab(_) => "tab:create",
            Action::UpdateTab(_) => "tab:update",
            Action::UpdateTabByPath { .. } => "tab:update_by_path",
            Action::UpdateTabFlags { .. } => "tab:update_flags",
            Action::RemoveTab { .. } => "tab:remove",
            Action::RemoveOtherTabs { .. } => "tab:remove_other",
            Action::RemoveAllTabs { .. } => "tab:remove_all",
            Action::ActivateTab { .. } => "tab:activate",
            Action::InsertTabBefore { .. } => "tab:insert_at",
            Action::MoveTabToGroup { .. } => "tab:move_to_tab_group",
            Action::CreateGroup(_) => "tab:create_tab_group",
            Action::RemoveGroup { .. } => "tab:remove_tab_group",
            Action::ActivateGroup { .. } => "tab:activate_tab_group",
            Action::OpenContextMenu { .. } => "tab:context_menu_open",
            Action::CloseContextMenu => "tab:context_menu_close",
            Action::SetDefaultOption { .. } => "editor:set_default_option",
            Action::SetEditorOption { .. } => "editor:set_option",
            Action::ClearEditorOption { .. } => "editor:clear_option",
            Action::ModeLoaded { .. } => "editor:mode_loaded",
        }
    }

    pub fn from_json(value: Value) -> Result<Self, super::StoreError> {
        serde_json::from_value(value)
            .map_err(|e| super::StoreError::InvalidArgument(format!("command: {e}")))
    }
}
