use serde_json::Value;

use super::editor::{EditorInstance, EditorStore};
use super::error::{Result, StoreError};
use super::ids::{EditorId, GroupId, TabId};
use super::services::ports::{EditorOptions, ModeResolver, Settings, SurfaceFactory};
use super::tabs::{GroupProps, TabFlags, TabProps, TabStore};
use super::{Action, Effect};
use crate::models::{FileEntity, FilePatch, FileTree};

pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
}

impl DispatchResult {
    fn changed(state_changed: bool) -> Self {
        Self {
            effects: Vec::new(),
            state_changed,
        }
    }
}

/// Whether a tab is the active one of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Active,
    Inactive,
}

/// Owns the file tree, editor and tab stores. Its methods are the only way
/// to change them; each one leaves all three consistent before returning.
pub struct Store {
    files: FileTree,
    editors: EditorStore,
    tabs: TabStore,
    modes: Box<dyn ModeResolver>,
}

impl Store {
    pub fn new(
        settings: &Settings,
        surfaces: Box<dyn SurfaceFactory>,
        modes: Box<dyn ModeResolver>,
    ) -> Self {
        Self {
            files: FileTree::new(settings.project_name.as_deref()),
            editors: EditorStore::new(settings.editor_defaults.clone(), surfaces),
            tabs: TabStore::new(),
            modes,
        }
    }

    pub fn files(&self) -> &FileTree {
        &self.files
    }

    pub fn editors(&self) -> &EditorStore {
        &self.editors
    }

    pub fn tabs(&self) -> &TabStore {
        &self.tabs
    }

    pub fn dispatch(&mut self, action: Action) -> Result<DispatchResult> {
        let name = action.name();
        tracing::debug!(action = name, "dispatch");
        let result = self.apply(action);
        if let Err(err) = &result {
            if err.is_fatal() {
                tracing::error!(action = name, error = %err, "mutation aborted");
            } else {
                tracing::debug!(action = name, error = %err, "mutation rejected");
            }
        }
        result
    }

    fn apply(&mut self, action: Action) -> Result<DispatchResult> {
        match action {
            Action::UpsertFile { path, attributes } => {
                self.upsert_file(&path, attributes)?;
                Ok(DispatchResult::changed(true))
            }
            Action::RenameFile { from, to } => {
                self.rename_file(&from, &to)?;
                Ok(DispatchResult::changed(from != to))
            }
            Action::RemoveFile { path } => {
                self.remove_file(&path)?;
                Ok(DispatchResult::changed(true))
            }
            Action::CreateTab(props) => {
                let (_, effects) = self.create_tab(props)?;
                Ok(DispatchResult {
                    effects,
                    state_changed: true,
                })
            }
            Action::UpdateTab(props) => {
                let (state_changed, effects) = self.update_tab(props)?;
                Ok(DispatchResult {
                    effects,
                    state_changed,
                })
            }
            Action::UpdateTabByPath { path, props } => {
                let (updated, effects) = self.update_tabs_by_path(&path, props)?;
                Ok(DispatchResult {
                    effects,
                    state_changed: updated > 0,
                })
            }
            Action::UpdateTabFlags { tab_id, flags } => {
                Ok(DispatchResult::changed(self.update_tab_flags(&tab_id, flags)?))
            }
            Action::RemoveTab { tab_id } => {
                self.remove_tab(&tab_id)?;
                Ok(DispatchResult::changed(true))
            }
            Action::RemoveOtherTabs { tab_id } => {
                let removed = self.remove_other_tabs(&tab_id)?;
                Ok(DispatchResult::changed(removed > 0))
            }
            Action::RemoveAllTabs { tab_id } => {
                let removed = self.remove_all_tabs(&tab_id)?;
                Ok(DispatchResult::changed(removed > 0))
            }
            Action::ActivateTab { tab_id } => {
                Ok(DispatchResult::changed(self.activate_tab(&tab_id)?))
            }
            Action::InsertTabBefore {
                tab_id,
                before_tab_id,
            } => {
                self.insert_tab_before(&tab_id, &before_tab_id)?;
                Ok(DispatchResult::changed(true))
            }
            Action::MoveTabToGroup { tab_id, group_id } => Ok(DispatchResult::changed(
                self.move_tab_to_group(&tab_id, &group_id)?,
            )),
            Action::CreateGroup(props) => {
                self.create_group(props)?;
                Ok(DispatchResult::changed(true))
            }
            Action::RemoveGroup { group_id } => {
                self.remove_group(&group_id)?;
                Ok(DispatchResult::changed(true))
            }
            Action::ActivateGroup { group_id } => {
                Ok(DispatchResult::changed(self.activate_group(&group_id)?))
            }
            Action::OpenContextMenu {
                x,
                y,
                tab_id,
                group_id,
            } => {
                self.open_context_menu((x, y), tab_id, group_id)?;
                Ok(DispatchResult::changed(true))
            }
            Action::CloseContextMenu => Ok(DispatchResult::changed(self.close_context_menu())),
            Action::SetDefaultOption { option, value } => Ok(DispatchResult::changed(
                self.set_default_option(&option, value),
            )),
            Action::SetEditorOption {
                editor_id,
                option,
                value,
            } => Ok(DispatchResult::changed(
                self.set_editor_option(&editor_id, &option, value)?,
            )),
            Action::ClearEditorOption { editor_id, option } => Ok(DispatchResult::changed(
                self.clear_editor_option(&editor_id, &option)?,
            )),
            Action::ModeLoaded { editor_id, mime } => {
                Ok(DispatchResult::changed(self.mode_loaded(&editor_id, mime)?))
            }
        }
    }

    // ---- files ----

    /// Creates or merges a file entity; editors bound to it see the new
    /// content before this returns.
    pub fn upsert_file(&mut self, path: &str, patch: FilePatch) -> Result<()> {
        self.files.upsert(path, patch)?;
        self.editors.sync_bound_to(path, &self.files);
        Ok(())
    }

    /// Renames a subtree and rebinds every editor that pointed into it.
    pub fn rename_file(&mut self, from: &str, to: &str) -> Result<()> {
        self.files.rename(from, to)?;
        let rebound = self.editors.rebind_paths(from, to);
        self.editors.sync_bound_to(to, &self.files);
        tracing::debug!(from, to, rebound, "file renamed");
        Ok(())
    }

    /// Removes a subtree. Editors bound into it fall back to their local
    /// content.
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        self.files.remove(path)?;
        self.editors.sync_bound_to(path, &self.files);
        Ok(())
    }

    // ---- tabs ----

    pub fn create_tab(&mut self, props: TabProps) -> Result<(TabId, Vec<Effect>)> {
        let group_id = self.tabs.resolve_group(props.group_id.as_ref())?;
        let tab_id = self.tabs.claim_tab_id(props.id.clone())?;
        let editor_props = props.editor.clone().unwrap_or_default();
        let editor_id = self
            .editors
            .create(editor_props, tab_id.clone(), &self.files)?;

        if let Err(err) = self
            .tabs
            .insert_tab(tab_id.clone(), group_id, editor_id.clone(), &props)
        {
            self.editors.destroy(&editor_id);
            return Err(err);
        }

        let effects = self.mode_effect(&editor_id).into_iter().collect();
        Ok((tab_id, effects))
    }

    /// Merges tab attributes, moves it when `group_id` names another group
    /// and forwards `editor` to the owned editor.
    pub fn update_tab(&mut self, props: TabProps) -> Result<(bool, Vec<Effect>)> {
        let tab_id = props
            .id
            .clone()
            .ok_or_else(|| StoreError::InvalidArgument("tab:update needs an id".to_string()))?;
        let tab = self.tabs.require_tab(&tab_id)?;
        let editor_id = tab.editor_id().clone();
        let current_group = tab.group_id().clone();
        if let Some(group_id) = &props.group_id {
            self.tabs.require_group(group_id)?;
        }
        let renames_editor = props
            .editor
            .as_ref()
            .and_then(|editor| editor.id.as_ref())
            .is_some_and(|id| *id != editor_id);
        if renames_editor {
            return Err(StoreError::InvalidArgument(
                "editor id cannot be changed".to_string(),
            ));
        }

        let mut props = props;
        if self.tab_file(&tab_id)?.is_some() {
            if let Some(flags) = props.flags.take() {
                props.flags = Some(flags.without(TabFlags::MODIFIED));
            }
        }
        let mut changed = self.tabs.merge_props(&tab_id, &props)?;

        if let Some(group_id) = props.group_id.as_ref().filter(|g| **g != current_group) {
            changed |= self.tabs.move_to_group(&tab_id, group_id)?;
        }

        let mut effects = Vec::new();
        if let Some(editor_props) = props.editor {
            let update = self.editors.update(&editor_id, editor_props, &self.files)?;
            changed |= update.changed;
            if update.newly_bound {
                effects.extend(self.mode_effect(&editor_id));
            }
        }
        Ok((changed, effects))
    }

    /// Runs [`Store::update_tab`] for each tab whose editor is bound exactly
    /// to `path`, in id order. Returns how many of them changed.
    pub fn update_tabs_by_path(
        &mut self,
        path: &str,
        props: TabProps,
    ) -> Result<(usize, Vec<Effect>)> {
        if props.id.is_some() {
            return Err(StoreError::InvalidArgument(
                "tab:update_by_path selects tabs by path, not id".to_string(),
            ));
        }
        let mut targets: Vec<TabId> = self
            .tabs
            .tabs()
            .filter(|tab| {
                self.editors
                    .get(tab.editor_id())
                    .and_then(|editor| editor.file_path())
                    == Some(path)
            })
            .map(|tab| tab.id().clone())
            .collect();
        targets.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut updated = 0;
        let mut effects = Vec::new();
        for tab_id in targets {
            let (changed, more) = self.update_tab(TabProps {
                id: Some(tab_id),
                ..props.clone()
            })?;
            updated += usize::from(changed);
            effects.extend(more);
        }
        tracing::debug!(path, updated, "tabs updated by path");
        Ok((updated, effects))
    }

    /// Merges flags. `modified` is derived from the file while one is bound,
    /// so it is dropped from the update in that case.
    pub fn update_tab_flags(&mut self, tab_id: &TabId, flags: TabFlags) -> Result<bool> {
        let flags = if self.tab_file(tab_id)?.is_some() {
            if flags.contains(TabFlags::MODIFIED) {
                tracing::debug!(tab = %tab_id, "ignoring modified flag on a file-bound tab");
            }
            flags.without(TabFlags::MODIFIED)
        } else {
            flags
        };
        self.tabs.merge_flags(tab_id, flags)
    }

    pub fn remove_tab(&mut self, tab_id: &TabId) -> Result<()> {
        self.destroy_tab(tab_id)
    }

    /// Activates `tab_id` and removes every other tab of its group.
    pub fn remove_other_tabs(&mut self, tab_id: &TabId) -> Result<usize> {
        self.tabs.activate(tab_id)?;
        let group_id = self.tabs.group_of(tab_id)?.id().clone();
        let mut removed = 0;
        // The member list is read again after every removal.
        while let Some(victim) = self
            .tabs
            .ordered_tab_ids(&group_id)?
            .into_iter()
            .find(|id| id != tab_id)
        {
            self.destroy_tab(&victim)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Removes every tab of `tab_id`'s group, `tab_id` included.
    pub fn remove_all_tabs(&mut self, tab_id: &TabId) -> Result<usize> {
        let group_id = self.tabs.group_of(tab_id)?.id().clone();
        let mut removed = 0;
        while let Some(victim) = self.tabs.ordered_tab_ids(&group_id)?.into_iter().next() {
            self.destroy_tab(&victim)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn activate_tab(&mut self, tab_id: &TabId) -> Result<bool> {
        self.tabs.activate(tab_id)
    }

    pub fn insert_tab_before(&mut self, tab_id: &TabId, anchor_id: &TabId) -> Result<f64> {
        self.tabs.insert_before(tab_id, anchor_id)
    }

    pub fn move_tab_to_group(&mut self, tab_id: &TabId, group_id: &GroupId) -> Result<bool> {
        self.tabs.move_to_group(tab_id, group_id)
    }

    pub fn create_group(&mut self, props: GroupProps) -> Result<GroupId> {
        self.tabs.create_group(props)
    }

    pub fn remove_group(&mut self, group_id: &GroupId) -> Result<()> {
        self.tabs.remove_group(group_id)
    }

    pub fn activate_group(&mut self, group_id: &GroupId) -> Result<bool> {
        self.tabs.activate_group(group_id)
    }

    pub fn open_context_menu(
        &mut self,
        pos: (i32, i32),
        tab_id: Option<TabId>,
        group_id: Option<GroupId>,
    ) -> Result<()> {
        self.tabs.open_context_menu(pos, tab_id, group_id)
    }

    pub fn close_context_menu(&mut self) -> bool {
        self.tabs.close_context_menu()
    }

    // ---- editors ----

    pub fn set_default_option(&mut self, option: &str, value: Value) -> bool {
        self.editors.set_default_option(option, value, &self.files)
    }

    pub fn set_editor_option(
        &mut self,
        editor_id: &EditorId,
        option: &str,
        value: Value,
    ) -> Result<bool> {
        self.editors.set_option(editor_id, option, value, &self.files)
    }

    /// Drops an editor's own value so the global default shows through again.
    pub fn clear_editor_option(&mut self, editor_id: &EditorId, option: &str) -> Result<bool> {
        self.editors.clear_option(editor_id, option, &self.files)
    }

    /// Applies a finished mode load. The editor may have been destroyed while
    /// the load was in flight; that is not an error.
    pub fn mode_loaded(&mut self, editor_id: &EditorId, mime: String) -> Result<bool> {
        if self.editors.get(editor_id).is_none() {
            let retired = self.editors.is_retired(editor_id);
            tracing::warn!(
                editor = %editor_id,
                retired,
                "mode loaded for a missing editor; ignoring"
            );
            return Ok(false);
        }
        self.editors
            .set_option(editor_id, "mode", Value::String(mime), &self.files)
    }

    // ---- derived views ----

    pub fn tab_editor(&self, tab_id: &TabId) -> Result<&EditorInstance> {
        let tab = self.tabs.require_tab(tab_id)?;
        self.editors.get(tab.editor_id()).ok_or_else(|| {
            StoreError::consistency(format!(
                "tab '{tab_id}' owns missing editor '{}'",
                tab.editor_id()
            ))
        })
    }

    pub fn tab_file(&self, tab_id: &TabId) -> Result<Option<&FileEntity>> {
        Ok(self.tab_editor(tab_id)?.bound_file(&self.files))
    }

    /// The bound file's name, otherwise the stored title.
    pub fn tab_title(&self, tab_id: &TabId) -> Result<Option<&str>> {
        if let Some(file) = self.tab_file(tab_id)? {
            return Ok(Some(file.name()));
        }
        Ok(self.tabs.require_tab(tab_id)?.title_override())
    }

    /// Stored flags with `modified` taken from the bound file, if any.
    pub fn tab_flags(&self, tab_id: &TabId) -> Result<TabFlags> {
        let mut flags = self.tabs.require_tab(tab_id)?.stored_flags().clone();
        if let Some(file) = self.tab_file(tab_id)? {
            flags.set(TabFlags::MODIFIED, !file.is_synced);
        }
        Ok(flags)
    }

    pub fn is_tab_modified(&self, tab_id: &TabId) -> Result<bool> {
        Ok(self.tab_flags(tab_id)?.modified())
    }

    pub fn tab_state(&self, tab_id: &TabId) -> Result<TabState> {
        Ok(if self.tabs.is_active(tab_id)? {
            TabState::Active
        } else {
            TabState::Inactive
        })
    }

    pub fn active_tab(&self, group_id: &GroupId) -> Result<Option<&TabId>> {
        Ok(self.tabs.require_group(group_id)?.active_tab_id())
    }

    pub fn editor_content(&self, editor_id: &EditorId) -> Result<&str> {
        let editor = self
            .editors
            .get(editor_id)
            .ok_or_else(|| StoreError::not_found("editor", editor_id.as_str()))?;
        Ok(editor.content(&self.files))
    }

    pub fn effective_options(&self, editor_id: &EditorId) -> Result<EditorOptions> {
        self.editors.effective_options(editor_id)
    }

    /// Single removal path for tabs: the owned editor goes first, then the
    /// tab entry.
    fn destroy_tab(&mut self, tab_id: &TabId) -> Result<()> {
        let editor_id = self.tabs.require_tab(tab_id)?.editor_id().clone();
        self.editors.destroy(&editor_id);
        self.tabs.detach(tab_id)?;
        tracing::debug!(tab = %tab_id, editor = %editor_id, "tab removed");
        Ok(())
    }

    fn mode_effect(&self, editor_id: &EditorId) -> Option<Effect> {
        let file = self.editors.get(editor_id)?.bound_file(&self.files)?;
        let descriptor = self.modes.resolve_mode_for_file(file)?;
        Some(Effect::LoadMode {
            editor_id: editor_id.clone(),
            descriptor,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
