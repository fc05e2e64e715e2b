//! 文件树数据模型
//!
//! The tree is a flat `path -> FileEntity` map. Parent, children, siblings and
//! depth are all derived from the path strings; nothing stores a pointer to
//! another node.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::kernel::error::StoreError;

pub const ROOT_PATH: &str = "";
const SEPARATOR: char = '/';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VcsStatus {
    #[default]
    None,
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Conflicted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntity {
    path: CompactString,
    pub display_name: Option<String>,
    pub content_type: Option<String>,
    pub content: String,
    pub is_directory: bool,
    pub is_synced: bool,
    pub vcs_status: VcsStatus,
    pub size: u64,
}

impl FileEntity {
    fn new(path: &str) -> Self {
        Self {
            path: CompactString::new(path),
            display_name: None,
            content_type: None,
            content: String::new(),
            is_directory: false,
            is_synced: true,
            vcs_status: VcsStatus::None,
            size: 0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        if let Some(name) = self.display_name.as_deref() {
            return name;
        }
        last_segment(&self.path)
    }

    pub fn depth(&self) -> usize {
        depth_of(&self.path)
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }

    pub fn parent_path(&self) -> Option<&str> {
        parent_path_of(&self.path)
    }

    fn apply(&mut self, patch: FilePatch) {
        if let Some(name) = patch.display_name {
            self.display_name = Some(name);
        }
        if let Some(content_type) = patch.content_type {
            self.content_type = Some(content_type);
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(is_directory) = patch.is_directory {
            self.is_directory = is_directory;
        }
        if let Some(is_synced) = patch.is_synced {
            self.is_synced = is_synced;
        }
        if let Some(status) = patch.vcs_status {
            self.vcs_status = status;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
    }
}

/// Partial attribute set merged into a [`FileEntity`] by [`FileTree::upsert`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct FilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_directory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_synced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_status: Option<VcsStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FilePatch {
    pub fn directory() -> Self {
        Self {
            is_directory: Some(true),
            ..Self::default()
        }
    }

    pub fn file(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, StoreError> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidArgument(format!("file attributes: {e}")))
    }
}

pub struct FileTree {
    root: FileEntity,
    entities: BTreeMap<CompactString, FileEntity>,
}

impl FileTree {
    pub fn new(project_name: Option<&str>) -> Self {
        let mut root = FileEntity::new(ROOT_PATH);
        root.is_directory = true;
        root.display_name = project_name.map(str::to_string);
        Self {
            root,
            entities: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &FileEntity {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entities.len() + 1
    }

    pub fn contains(&self, path: &str) -> bool {
        path == ROOT_PATH || self.entities.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntity> {
        if path == ROOT_PATH {
            return Some(&self.root);
        }
        self.entities.get(path)
    }

    /// Ancestors must exist first; validation runs before any write.
    pub fn upsert(&mut self, path: &str, patch: FilePatch) -> Result<&FileEntity, StoreError> {
        validate_path(path)?;

        if path == ROOT_PATH {
            if patch.is_directory == Some(false) {
                return Err(StoreError::InvalidArgument(
                    "the root entity must stay a directory".to_string(),
                ));
            }
            self.root.apply(patch);
            return Ok(&self.root);
        }

        match self.entities.get(path) {
            Some(existing) => {
                if patch.is_directory == Some(false)
                    && existing.is_directory
                    && self.child_entities(path).next().is_some()
                {
                    return Err(StoreError::InvalidArgument(format!(
                        "'{path}' has children and cannot become a file"
                    )));
                }
            }
            None => self.check_parent_for_insert(path)?,
        }

        let entity = self
            .entities
            .entry(CompactString::new(path))
            .or_insert_with(|| {
                tracing::debug!(path, "file entity created");
                FileEntity::new(path)
            });
        entity.apply(patch);
        Ok(entity)
    }

    /// A stored entity whose parent is gone is a consistency failure.
    pub fn parent(&self, path: &str) -> Result<Option<&FileEntity>, StoreError> {
        let entity = self.require(path)?;
        let Some(parent_path) = entity.parent_path() else {
            return Ok(None);
        };
        match self.get(parent_path) {
            Some(parent) => Ok(Some(parent)),
            None => Err(StoreError::consistency(format!(
                "missing internal node of path '{parent_path}'"
            ))),
        }
    }

    /// Sorted direct children: directories first, then by full path.
    pub fn children(&self, path: &str) -> Result<Vec<&FileEntity>, StoreError> {
        let entity = self.require(path)?;
        Ok(self.sorted_children(entity))
    }

    pub fn siblings(&self, path: &str) -> Result<Vec<&FileEntity>, StoreError> {
        match self.parent(path)? {
            Some(parent) => Ok(self.sorted_children(parent)),
            None => Ok(vec![&self.root]),
        }
    }

    pub fn first_child(&self, path: &str) -> Result<Option<&FileEntity>, StoreError> {
        Ok(self.children(path)?.first().copied())
    }

    pub fn last_child(&self, path: &str) -> Result<Option<&FileEntity>, StoreError> {
        Ok(self.children(path)?.last().copied())
    }

    pub fn prev(&self, path: &str) -> Result<Option<&FileEntity>, StoreError> {
        let siblings = self.siblings(path)?;
        let pos = sibling_position(&siblings, path)?;
        Ok(pos.checked_sub(1).map(|i| siblings[i]))
    }

    pub fn next(&self, path: &str) -> Result<Option<&FileEntity>, StoreError> {
        let siblings = self.siblings(path)?;
        let pos = sibling_position(&siblings, path)?;
        Ok(siblings.get(pos + 1).copied())
    }

    /// Pre-order traversal below `path` (the node itself is not visited).
    pub fn descendants<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a FileEntity> + 'a {
        let mut cursor = Descendants::new(path);
        std::iter::from_fn(move || cursor.next(self))
    }

    pub fn for_each_descendant(&self, path: &str, mut visit: impl FnMut(&FileEntity)) {
        for entity in self.descendants(path) {
            visit(entity);
        }
    }

    /// Moves `from` and its whole subtree to `to`, rewriting every descendant
    /// path. All checks run before anything is removed.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        validate_path(to)?;
        if from == ROOT_PATH || to == ROOT_PATH {
            return Err(StoreError::InvalidPath {
                path: from.to_string(),
                reason: "the root cannot be renamed",
            });
        }
        self.require(from)?;
        if from == to {
            return Ok(());
        }
        if is_inside(to, from) {
            return Err(StoreError::InvalidPath {
                path: to.to_string(),
                reason: "cannot move a node into its own subtree",
            });
        }
        if self.contains(to) {
            return Err(StoreError::InvalidPath {
                path: to.to_string(),
                reason: "target already exists",
            });
        }
        self.check_parent_for_insert(to)?;

        for mut entity in self.take_subtree(from) {
            let new_path = CompactString::new(format!("{to}{}", &entity.path[from.len()..]));
            entity.path = new_path.clone();
            self.entities.insert(new_path, entity);
        }
        tracing::debug!(from, to, "file subtree renamed");
        Ok(())
    }

    /// Removes `path` and everything below it, returning the removed paths.
    pub fn remove(&mut self, path: &str) -> Result<Vec<CompactString>, StoreError> {
        if path == ROOT_PATH {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "the root cannot be removed",
            });
        }
        self.require(path)?;
        let removed: Vec<CompactString> = self
            .take_subtree(path)
            .into_iter()
            .map(|entity| entity.path)
            .collect();
        tracing::debug!(path, count = removed.len(), "file subtree removed");
        Ok(removed)
    }

    fn require(&self, path: &str) -> Result<&FileEntity, StoreError> {
        self.get(path)
            .ok_or_else(|| StoreError::not_found("file", path))
    }

    fn check_parent_for_insert(&self, path: &str) -> Result<(), StoreError> {
        let Some(parent_path) = parent_path_of(path) else {
            return Ok(());
        };
        match self.get(parent_path) {
            None => Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "parent entity does not exist",
            }),
            Some(parent) if !parent.is_directory => Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "parent is not a directory",
            }),
            Some(_) => Ok(()),
        }
    }

    fn take_subtree(&mut self, path: &str) -> Vec<FileEntity> {
        let prefix = format!("{path}{SEPARATOR}");
        let mut keys = vec![CompactString::new(path)];
        keys.extend(
            self.entities
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|(k, _)| k.starts_with(prefix.as_str()))
                .map(|(k, _)| k.clone()),
        );
        keys.into_iter()
            .filter_map(|key| self.entities.remove(&key))
            .collect()
    }

    fn child_entities<'a>(&'a self, path: &str) -> Box<dyn Iterator<Item = &'a FileEntity> + 'a> {
        if path == ROOT_PATH {
            return Box::new(
                self.entities
                    .values()
                    .filter(|e| !e.path.contains(SEPARATOR)),
            );
        }
        let prefix = format!("{path}{SEPARATOR}");
        let depth = depth_of(path) + 1;
        let range = self
            .entities
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
        Box::new(
            range
                .take_while(move |(k, _)| k.starts_with(prefix.as_str()))
                .map(|(_, e)| e)
                .filter(move |e| e.depth() == depth),
        )
    }

    fn sorted_children(&self, entity: &FileEntity) -> Vec<&FileEntity> {
        if !entity.is_directory {
            return Vec::new();
        }
        let mut children: Vec<&FileEntity> = self.child_entities(&entity.path).collect();
        children.sort_by(|a, b| node_order(a, b));
        children
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Resumable pre-order walk. It only holds paths, so the tree may change
/// between steps; every step reads the tree as it is at that moment.
#[derive(Debug, Clone)]
pub struct Descendants {
    start: CompactString,
    pending: Vec<CompactString>,
    started: bool,
}

impl Descendants {
    pub fn new(path: &str) -> Self {
        Self {
            start: CompactString::new(path),
            pending: Vec::new(),
            started: false,
        }
    }

    pub fn next<'a>(&mut self, tree: &'a FileTree) -> Option<&'a FileEntity> {
        if !self.started {
            self.started = true;
            let start = tree.get(&self.start)?;
            self.push_children(tree, start);
        }

        while let Some(path) = self.pending.pop() {
            // Entries removed since they were queued are skipped.
            let Some(entity) = tree.get(&path) else {
                continue;
            };
            self.push_children(tree, entity);
            return Some(entity);
        }
        None
    }

    pub fn restart(&mut self) {
        self.pending.clear();
        self.started = false;
    }

    fn push_children(&mut self, tree: &FileTree, entity: &FileEntity) {
        if !entity.is_directory {
            return;
        }
        let children = tree.sorted_children(entity);
        self.pending
            .extend(children.into_iter().rev().map(|c| c.path.clone()));
    }
}

fn node_order(a: &FileEntity, b: &FileEntity) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.path.cmp(&b.path))
}

fn last_segment(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

fn depth_of(path: &str) -> usize {
    path.matches(SEPARATOR).count()
}

fn parent_path_of(path: &str) -> Option<&str> {
    if path == ROOT_PATH {
        return None;
    }
    Some(path.rfind(SEPARATOR).map_or(ROOT_PATH, |i| &path[..i]))
}

fn validate_path(path: &str) -> Result<(), StoreError> {
    if path == ROOT_PATH {
        return Ok(());
    }
    let reason = if path.starts_with(SEPARATOR) {
        "path must not start with '/'"
    } else if path.ends_with(SEPARATOR) {
        "path must not end with '/'"
    } else if path.split(SEPARATOR).any(str::is_empty) {
        "path contains an empty segment"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}

fn is_inside(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

fn sibling_position(siblings: &[&FileEntity], path: &str) -> Result<usize, StoreError> {
    siblings.iter().position(|e| e.path == path).ok_or_else(|| {
        StoreError::consistency(format!("'{path}' is missing from its parent's children"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
