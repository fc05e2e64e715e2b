use compact_str::CompactString;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::error::{Result, StoreError};
use crate::kernel::ids::{EditorId, IdAllocator, TabId};
use crate::kernel::registry::{Disposable, Registry};
use crate::kernel::services::ports::{EditorOptions, EditorSurface, SurfaceFactory};
use crate::models::{FileEntity, FileTree};

/// Attributes accepted by [`EditorStore::create`] and [`EditorStore::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EditorProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EditorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Initial text for an editor that has no bound file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "EditorOptions::is_empty")]
    pub options: EditorOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_blame: Option<GitBlame>,
}

/// Blame overlay state. `data` holds the VCS collaborator's per-line records
/// as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitBlame {
    pub show: bool,
    pub data: Vec<Value>,
}

impl EditorProps {
    pub fn for_file(path: impl Into<String>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

pub struct EditorInstance {
    id: EditorId,
    document_id: TabId,
    file_path: Option<CompactString>,
    local_content: String,
    overrides: EditorOptions,
    git_blame: GitBlame,
    surface: Option<Box<dyn EditorSurface>>,
    applied_options: EditorOptions,
    applied_content: Option<String>,
}

impl EditorInstance {
    pub fn id(&self) -> &EditorId {
        &self.id
    }

    pub fn document_id(&self) -> &TabId {
        &self.document_id
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn local_content(&self) -> &str {
        &self.local_content
    }

    pub fn overrides(&self) -> &EditorOptions {
        &self.overrides
    }

    pub fn git_blame(&self) -> &GitBlame {
        &self.git_blame
    }

    pub fn bound_file<'a>(&self, files: &'a FileTree) -> Option<&'a FileEntity> {
        files.get(self.file_path.as_deref()?)
    }

    pub fn content<'a>(&'a self, files: &'a FileTree) -> &'a str {
        match self.bound_file(files) {
            Some(file) => &file.content,
            None => &self.local_content,
        }
    }

    /// Global defaults with this instance's overrides laid on top.
    pub fn effective_options(&self, defaults: &EditorOptions) -> EditorOptions {
        let mut options = defaults.clone();
        options.extend(
            self.overrides
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        options
    }

    /// Pushes whatever differs from what the surface last received.
    fn sync(&mut self, defaults: &EditorOptions, files: &FileTree) {
        let effective = self.effective_options(defaults);
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        for (name, value) in &effective {
            if self.applied_options.get(name) == Some(value) {
                continue;
            }
            surface.set_option(name, value);
            self.applied_options.insert(name.clone(), value.clone());
        }

        let dropped: Vec<String> = self
            .applied_options
            .keys()
            .filter(|name| !effective.contains_key(*name))
            .cloned()
            .collect();
        for name in dropped {
            surface.set_option(&name, &Value::Null);
            self.applied_options.remove(&name);
        }

        let content = match self.file_path.as_deref().and_then(|p| files.get(p)) {
            Some(file) => file.content.as_str(),
            None => self.local_content.as_str(),
        };
        if self.applied_content.as_deref() != Some(content) {
            surface.set_content(content);
            self.applied_content = Some(content.to_string());
        }
    }

    fn push_content(&mut self, files: &FileTree) {
        let content = self.content(files).to_string();
        if let Some(surface) = self.surface.as_mut() {
            surface.set_content(&content);
            self.applied_content = Some(content);
        }
    }
}

impl Disposable for EditorInstance {
    fn release(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
            tracing::debug!(editor = %self.id, "editor surface disposed");
        }
    }
}

/// What changed in an editor after [`EditorStore::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorUpdate {
    pub changed: bool,
    /// The editor went from no file path to a file path.
    pub newly_bound: bool,
}

pub struct EditorStore {
    entities: Registry<EditorId, EditorInstance>,
    /// Ids of destroyed editors. They are never handed out again, so a late
    /// continuation addressed to one cannot reach a newer editor.
    retired: FxHashSet<EditorId>,
    defaults: EditorOptions,
    factory: Box<dyn SurfaceFactory>,
    ids: IdAllocator,
}

impl EditorStore {
    pub fn new(defaults: EditorOptions, factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            entities: Registry::new(),
            retired: FxHashSet::default(),
            defaults,
            factory,
            ids: IdAllocator::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EditorId) -> Option<&EditorInstance> {
        self.entities.get(id)
    }

    pub fn defaults(&self) -> &EditorOptions {
        &self.defaults
    }

    pub fn effective_options(&self, id: &EditorId) -> Result<EditorOptions> {
        Ok(self.require(id)?.effective_options(&self.defaults))
    }

    /// Registers a new instance and acquires its surface. A bound file wins
    /// over `props.content`.
    pub fn create(
        &mut self,
        props: EditorProps,
        document_id: TabId,
        files: &FileTree,
    ) -> Result<EditorId> {
        let id = match props.id {
            Some(id) if self.entities.contains(&id) => {
                return Err(StoreError::InvalidArgument(format!(
                    "editor '{id}' already exists"
                )));
            }
            Some(id) if self.retired.contains(&id) => {
                return Err(StoreError::InvalidArgument(format!(
                    "editor '{id}' was destroyed and cannot be reused"
                )));
            }
            Some(id) => id,
            None => self.allocate_id(),
        };

        let mut editor = EditorInstance {
            id: id.clone(),
            document_id,
            file_path: props.file_path.map(CompactString::from),
            local_content: String::new(),
            overrides: props.options,
            git_blame: props.git_blame.unwrap_or_default(),
            surface: None,
            applied_options: EditorOptions::new(),
            applied_content: None,
        };
        if editor.bound_file(files).is_none() {
            if let Some(content) = props.content {
                editor.local_content = content;
            }
        }

        let effective = editor.effective_options(&self.defaults);
        let mut surface = self.factory.create(&effective);
        let content = editor.content(files).to_string();
        surface.set_content(&content);
        editor.surface = Some(surface);
        editor.applied_options = effective;
        editor.applied_content = Some(content);

        tracing::debug!(editor = %id, document = %editor.document_id, "editor created");
        self.entities.insert(id.clone(), editor);
        Ok(id)
    }

    /// Merges `props` into the instance. When the file path goes from unset to
    /// set the surface is reloaded from the file once; after that the
    /// content follows the file through [`EditorStore::sync`].
    pub fn update(
        &mut self,
        id: &EditorId,
        props: EditorProps,
        files: &FileTree,
    ) -> Result<EditorUpdate> {
        if props.id.as_ref().is_some_and(|new_id| new_id != id) {
            return Err(StoreError::InvalidArgument(
                "editor id cannot be changed".to_string(),
            ));
        }
        let defaults = &self.defaults;
        let editor = self
            .entities
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("editor", id.as_str()))?;

        let mut update = EditorUpdate::default();
        if let Some(path) = props.file_path {
            update.newly_bound = editor.file_path.is_none();
            update.changed |= editor.file_path.as_deref() != Some(path.as_str());
            editor.file_path = Some(CompactString::from(path));
        }
        if let Some(content) = props.content {
            if editor.bound_file(files).is_none() && editor.local_content != content {
                editor.local_content = content;
                update.changed = true;
            }
        }
        for (name, value) in props.options {
            if editor.overrides.get(&name) != Some(&value) {
                editor.overrides.insert(name, value);
                update.changed = true;
            }
        }
        if let Some(blame) = props.git_blame {
            update.changed |= editor.git_blame != blame;
            editor.git_blame = blame;
        }

        if update.newly_bound {
            editor.push_content(files);
        }
        editor.sync(defaults, files);
        Ok(update)
    }

    /// Releases the surface and drops the entry. Unknown ids are a no-op so a
    /// second destroy is harmless.
    pub fn destroy(&mut self, id: &EditorId) -> bool {
        let removed = self.entities.remove(id);
        if removed {
            self.retired.insert(id.clone());
            tracing::debug!(editor = %id, "editor destroyed");
        }
        removed
    }

    pub fn is_retired(&self, id: &EditorId) -> bool {
        self.retired.contains(id)
    }

    pub fn set_option(
        &mut self,
        id: &EditorId,
        name: &str,
        value: Value,
        files: &FileTree,
    ) -> Result<bool> {
        let defaults = &self.defaults;
        let editor = self
            .entities
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("editor", id.as_str()))?;
        if editor.overrides.get(name) == Some(&value) {
            return Ok(false);
        }
        editor.overrides.insert(name.to_string(), value);
        editor.sync(defaults, files);
        Ok(true)
    }

    pub fn clear_option(&mut self, id: &EditorId, name: &str, files: &FileTree) -> Result<bool> {
        let defaults = &self.defaults;
        let editor = self
            .entities
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("editor", id.as_str()))?;
        if editor.overrides.remove(name).is_none() {
            return Ok(false);
        }
        editor.sync(defaults, files);
        Ok(true)
    }

    /// Changes a global default; every instance without its own override
    /// picks it up.
    pub fn set_default_option(&mut self, name: &str, value: Value, files: &FileTree) -> bool {
        if self.defaults.get(name) == Some(&value) {
            return false;
        }
        self.defaults.insert(name.to_string(), value);
        self.sync_all(files);
        true
    }

    pub fn sync_all(&mut self, files: &FileTree) {
        let ids: Vec<EditorId> = self.entities.keys().cloned().collect();
        for id in ids {
            self.sync(&id, files);
        }
    }

    /// Resyncs every editor whose file path is `path` or lies below it.
    pub fn sync_bound_to(&mut self, path: &str, files: &FileTree) {
        let ids: Vec<EditorId> = self
            .entities
            .values()
            .filter(|e| e.file_path.as_deref().is_some_and(|p| path_matches(p, path)))
            .map(|e| e.id.clone())
            .collect();
        for id in ids {
            self.sync(&id, files);
        }
    }

    /// Rewrites file paths after `from` was renamed to `to`.
    pub fn rebind_paths(&mut self, from: &str, to: &str) -> usize {
        let ids: Vec<EditorId> = self
            .entities
            .values()
            .filter(|e| e.file_path.as_deref().is_some_and(|p| path_matches(p, from)))
            .map(|e| e.id.clone())
            .collect();
        for id in &ids {
            if let Some(editor) = self.entities.get_mut(id) {
                if let Some(path) = editor.file_path.as_deref() {
                    let rebound = format!("{to}{}", &path[from.len()..]);
                    editor.file_path = Some(CompactString::from(rebound));
                }
            }
        }
        ids.len()
    }

    fn sync(&mut self, id: &EditorId, files: &FileTree) {
        let defaults = &self.defaults;
        if let Some(editor) = self.entities.get_mut(id) {
            editor.sync(defaults, files);
        }
    }

    fn require(&self, id: &EditorId) -> Result<&EditorInstance> {
        self.entities
            .get(id)
            .ok_or_else(|| StoreError::not_found("editor", id.as_str()))
    }

    fn allocate_id(&mut self) -> EditorId {
        loop {
            let id = self.ids.next_editor();
            if !self.entities.contains(&id) && !self.retired.contains(&id) {
                return id;
            }
        }
    }
}

fn path_matches(path: &str, target: &str) -> bool {
    path == target
        || path
            .strip_prefix(target)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/editor.rs"]
mod tests;
