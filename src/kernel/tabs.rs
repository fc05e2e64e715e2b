//! Tabs and tab groups.
//!
//! A tab stores the id of its group and a fractional `order_index`; the
//! ordered member list of a group is derived by sorting on that index.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::editor::EditorProps;
use super::error::{Result, StoreError};
use super::ids::{EditorId, GroupId, IdAllocator, TabId};
use crate::models::order;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabFlags(BTreeMap<String, bool>);

impl TabFlags {
    pub const MODIFIED: &'static str = "modified";

    pub fn get(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.0.insert(name.into(), value);
    }

    pub fn modified(&self) -> bool {
        self.get(Self::MODIFIED)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn merge(&mut self, other: TabFlags) -> bool {
        let mut changed = false;
        for (name, value) in other.0 {
            changed |= self.0.insert(name, value) != Some(value);
        }
        changed
    }

    pub fn without(mut self, name: &str) -> Self {
        self.0.remove(name);
        self
    }
}

impl<const N: usize> From<[(&str, bool); N]> for TabFlags {
    fn from(flags: [(&str, bool); N]) -> Self {
        Self(
            flags
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    id: TabId,
    title: Option<String>,
    icon: Option<String>,
    flags: TabFlags,
    group_id: GroupId,
    editor_id: EditorId,
    order_index: f64,
}

impl Tab {
    pub fn id(&self) -> &TabId {
        &self.id
    }

    /// Stored title; the displayed title prefers the bound file's name.
    pub fn title_override(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// `modified` here is stale while a file is bound.
    pub fn stored_flags(&self) -> &TabFlags {
        &self.flags
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn editor_id(&self) -> &EditorId {
        &self.editor_id
    }

    pub fn order_index(&self) -> f64 {
        self.order_index
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TabProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<TabFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorProps>,
}

impl TabProps {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::InvalidArgument(format!("tab properties: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabGroup {
    id: GroupId,
    pub title: Option<String>,
    pub pane_id: Option<String>,
    active_tab_id: Option<TabId>,
}

impl TabGroup {
    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn active_tab_id(&self) -> Option<&TabId> {
        self.active_tab_id.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pane_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMenuState {
    pub is_active: bool,
    pub pos: (i32, i32),
    pub context_node: Option<TabId>,
    pub tab_group_id: Option<GroupId>,
}

#[derive(Debug, Default)]
pub struct TabStore {
    tabs: FxHashMap<TabId, Tab>,
    groups: FxHashMap<GroupId, TabGroup>,
    /// Removed tab ids; a destroyed tab never comes back under the same id.
    retired: FxHashSet<TabId>,
    active_group: Option<GroupId>,
    context_menu: ContextMenuState,
    ids: IdAllocator,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.get(id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&TabGroup> {
        self.groups.get(id)
    }

    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &TabGroup> {
        self.groups.values()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn active_group(&self) -> Option<&GroupId> {
        self.active_group.as_ref()
    }

    pub fn context_menu(&self) -> &ContextMenuState {
        &self.context_menu
    }

    pub(crate) fn require_tab(&self, id: &TabId) -> Result<&Tab> {
        self.tabs
            .get(id)
            .ok_or_else(|| StoreError::not_found("tab", id.as_str()))
    }

    pub(crate) fn require_group(&self, id: &GroupId) -> Result<&TabGroup> {
        self.groups
            .get(id)
            .ok_or_else(|| StoreError::not_found("tab group", id.as_str()))
    }

    /// Group of a stored tab. A dangling group id is a broken invariant.
    pub fn group_of(&self, tab_id: &TabId) -> Result<&TabGroup> {
        let tab = self.require_tab(tab_id)?;
        self.groups.get(&tab.group_id).ok_or_else(|| {
            StoreError::consistency(format!(
                "tab '{tab_id}' points at missing group '{}'",
                tab.group_id
            ))
        })
    }

    pub fn ordered_tabs(&self, group_id: &GroupId) -> Result<Vec<&Tab>> {
        self.require_group(group_id)?;
        Ok(self.members(group_id, None))
    }

    pub fn ordered_tab_ids(&self, group_id: &GroupId) -> Result<Vec<TabId>> {
        Ok(self
            .ordered_tabs(group_id)?
            .into_iter()
            .map(|tab| tab.id.clone())
            .collect())
    }

    pub fn prev(&self, tab_id: &TabId) -> Result<Option<&Tab>> {
        let (ordered, pos) = self.position(tab_id)?;
        Ok(pos.checked_sub(1).map(|i| ordered[i]))
    }

    pub fn next(&self, tab_id: &TabId) -> Result<Option<&Tab>> {
        let (ordered, pos) = self.position(tab_id)?;
        Ok(ordered.get(pos + 1).copied())
    }

    pub fn is_active(&self, tab_id: &TabId) -> Result<bool> {
        let group = self.group_of(tab_id)?;
        Ok(group.active_tab_id.as_ref() == Some(tab_id))
    }

    pub fn create_group(&mut self, props: GroupProps) -> Result<GroupId> {
        let id = match props.id {
            Some(id) if self.groups.contains_key(&id) => {
                return Err(StoreError::InvalidArgument(format!(
                    "tab group '{id}' already exists"
                )));
            }
            Some(id) => id,
            None => self.allocate_group_id(),
        };
        self.groups.insert(
            id.clone(),
            TabGroup {
                id: id.clone(),
                title: props.title,
                pane_id: props.pane_id,
                active_tab_id: None,
            },
        );
        if self.active_group.is_none() {
            self.active_group = Some(id.clone());
        }
        tracing::debug!(group = %id, "tab group created");
        Ok(id)
    }

    pub fn activate_group(&mut self, id: &GroupId) -> Result<bool> {
        self.require_group(id)?;
        if self.active_group.as_ref() == Some(id) {
            return Ok(false);
        }
        self.active_group = Some(id.clone());
        Ok(true)
    }

    pub fn remove_group(&mut self, id: &GroupId) -> Result<()> {
        self.require_group(id)?;
        if self.tabs.values().any(|tab| &tab.group_id == id) {
            return Err(StoreError::InvalidArgument(format!(
                "tab group '{id}' still has tabs"
            )));
        }
        self.groups.remove(id);
        if self.active_group.as_ref() == Some(id) {
            self.active_group = None;
        }
        if self.context_menu.tab_group_id.as_ref() == Some(id) {
            self.context_menu = ContextMenuState::default();
        }
        tracing::debug!(group = %id, "tab group removed");
        Ok(())
    }

    pub fn resolve_group(&self, explicit: Option<&GroupId>) -> Result<GroupId> {
        if let Some(id) = explicit {
            return Ok(self.require_group(id)?.id.clone());
        }
        self.active_group
            .clone()
            .ok_or_else(|| StoreError::not_found("active tab group", "<none>"))
    }

    pub(crate) fn claim_tab_id(&mut self, requested: Option<TabId>) -> Result<TabId> {
        match requested {
            Some(id) if self.tabs.contains_key(&id) => Err(StoreError::InvalidArgument(format!(
                "tab '{id}' already exists"
            ))),
            Some(id) if self.retired.contains(&id) => Err(StoreError::InvalidArgument(format!(
                "tab '{id}' was removed and cannot be reused"
            ))),
            Some(id) => Ok(id),
            None => loop {
                let id = self.ids.next_tab();
                if !self.tabs.contains_key(&id) && !self.retired.contains(&id) {
                    break Ok(id);
                }
            },
        }
    }

    /// Appends a new tab at the end of `group_id` and makes it active there.
    pub(crate) fn insert_tab(
        &mut self,
        id: TabId,
        group_id: GroupId,
        editor_id: EditorId,
        props: &TabProps,
    ) -> Result<()> {
        self.require_group(&group_id)?;
        let order_index = self.append_index(&group_id, None);
        let tab = Tab {
            id: id.clone(),
            title: props.title.clone(),
            icon: props.icon.clone(),
            flags: props.flags.clone().unwrap_or_default(),
            group_id: group_id.clone(),
            editor_id,
            order_index,
        };
        self.tabs.insert(id.clone(), tab);
        self.set_active_tab(&group_id, Some(id.clone()));
        tracing::debug!(tab = %id, group = %group_id, order_index, "tab created");
        Ok(())
    }

    pub(crate) fn merge_props(&mut self, id: &TabId, props: &TabProps) -> Result<bool> {
        let tab = self
            .tabs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("tab", id.as_str()))?;
        let mut changed = false;
        if let Some(title) = &props.title {
            changed |= tab.title.as_ref() != Some(title);
            tab.title = Some(title.clone());
        }
        if let Some(icon) = &props.icon {
            changed |= tab.icon.as_ref() != Some(icon);
            tab.icon = Some(icon.clone());
        }
        if let Some(flags) = &props.flags {
            changed |= tab.flags.merge(flags.clone());
        }
        Ok(changed)
    }

    pub(crate) fn merge_flags(&mut self, id: &TabId, flags: TabFlags) -> Result<bool> {
        let tab = self
            .tabs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("tab", id.as_str()))?;
        Ok(tab.flags.merge(flags))
    }

    /// Moves the tab to the end of `group_id`, where it becomes active.
    pub fn move_to_group(&mut self, tab_id: &TabId, group_id: &GroupId) -> Result<bool> {
        self.require_group(group_id)?;
        let current = self.require_tab(tab_id)?.group_id.clone();
        let last = self.members(group_id, None).last().map(|t| t.id.clone());
        if &current == group_id && last.as_ref() == Some(tab_id) {
            return Ok(false);
        }

        self.leave_group(tab_id)?;
        let order_index = self.append_index(group_id, Some(tab_id));
        if let Some(tab) = self.tabs.get_mut(tab_id) {
            tab.group_id = group_id.clone();
            tab.order_index = order_index;
        }
        self.set_active_tab(group_id, Some(tab_id.clone()));
        tracing::debug!(tab = %tab_id, group = %group_id, order_index, "tab moved to group");
        Ok(true)
    }

    /// Always lands in the anchor's group. Renumbers only on precision loss.
    pub fn insert_before(&mut self, tab_id: &TabId, anchor_id: &TabId) -> Result<f64> {
        if tab_id == anchor_id {
            return Err(StoreError::InvalidArgument(
                "a tab cannot be inserted before itself".to_string(),
            ));
        }
        self.require_tab(tab_id)?;
        let group_id = self.require_tab(anchor_id)?.group_id.clone();
        self.require_group(&group_id).map_err(|_| {
            StoreError::consistency(format!(
                "tab '{anchor_id}' points at missing group '{group_id}'"
            ))
        })?;

        let index = match self.index_before(&group_id, tab_id, anchor_id) {
            Some(index) => index,
            None => {
                tracing::warn!(group = %group_id, "order index precision exhausted; rebalancing");
                self.rebalance(&group_id, Some(tab_id));
                self.index_before(&group_id, tab_id, anchor_id)
                    .ok_or_else(|| {
                        StoreError::consistency(format!(
                            "no order index left before '{anchor_id}' after rebalancing"
                        ))
                    })?
            }
        };

        let was_elsewhere = self.require_tab(tab_id)?.group_id != group_id;
        if was_elsewhere {
            self.leave_group(tab_id)?;
        }
        if let Some(tab) = self.tabs.get_mut(tab_id) {
            tab.group_id = group_id.clone();
            tab.order_index = index;
        }
        if was_elsewhere {
            self.set_active_tab(&group_id, Some(tab_id.clone()));
        }
        tracing::debug!(tab = %tab_id, anchor = %anchor_id, index, "tab inserted");
        Ok(index)
    }

    pub fn activate(&mut self, tab_id: &TabId) -> Result<bool> {
        let group_id = self.group_of(tab_id)?.id.clone();
        let mut changed = self.set_active_tab(&group_id, Some(tab_id.clone()));
        if self.active_group.as_ref() != Some(&group_id) {
            self.active_group = Some(group_id);
            changed = true;
        }
        Ok(changed)
    }

    /// Takes the tab out of the store. If it was active, the next tab (or the
    /// previous one at the tail) takes over.
    pub(crate) fn detach(&mut self, tab_id: &TabId) -> Result<Tab> {
        self.leave_group(tab_id)?;
        if self.context_menu.context_node.as_ref() == Some(tab_id) {
            self.context_menu = ContextMenuState::default();
        }
        let tab = self
            .tabs
            .remove(tab_id)
            .ok_or_else(|| StoreError::not_found("tab", tab_id.as_str()))?;
        self.retired.insert(tab_id.clone());
        Ok(tab)
    }

    pub fn open_context_menu(
        &mut self,
        pos: (i32, i32),
        tab_id: Option<TabId>,
        group_id: Option<GroupId>,
    ) -> Result<()> {
        if let Some(id) = &tab_id {
            self.require_tab(id)?;
        }
        if let Some(id) = &group_id {
            self.require_group(id)?;
        }
        self.context_menu = ContextMenuState {
            is_active: true,
            pos,
            context_node: tab_id,
            tab_group_id: group_id,
        };
        Ok(())
    }

    pub fn close_context_menu(&mut self) -> bool {
        let was_active = self.context_menu.is_active;
        self.context_menu = ContextMenuState::default();
        was_active
    }

    pub fn rebalance(&mut self, group_id: &GroupId, skip: Option<&TabId>) {
        let ids: Vec<TabId> = self
            .members(group_id, skip)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        for (id, index) in ids.iter().zip(order::rebalanced(ids.len())) {
            if let Some(tab) = self.tabs.get_mut(id) {
                tab.order_index = index;
            }
        }
    }

    /// Clears the group's active tab if it is `tab_id`, handing it to a
    /// neighbour. The tab itself keeps its fields.
    fn leave_group(&mut self, tab_id: &TabId) -> Result<()> {
        let group = self.group_of(tab_id)?;
        if group.active_tab_id.as_ref() != Some(tab_id) {
            return Ok(());
        }
        let group_id = group.id.clone();
        let (ordered, pos) = self.position(tab_id)?;
        let successor = ordered
            .get(pos + 1)
            .or_else(|| pos.checked_sub(1).and_then(|i| ordered.get(i)))
            .map(|t| t.id.clone());
        self.set_active_tab(&group_id, successor);
        Ok(())
    }

    fn set_active_tab(&mut self, group_id: &GroupId, tab_id: Option<TabId>) -> bool {
        match self.groups.get_mut(group_id) {
            Some(group) if group.active_tab_id != tab_id => {
                group.active_tab_id = tab_id;
                true
            }
            _ => false,
        }
    }

    fn index_before(&self, group_id: &GroupId, moving: &TabId, anchor_id: &TabId) -> Option<f64> {
        let ordered = self.members(group_id, Some(moving));
        let pos = ordered.iter().position(|t| &t.id == anchor_id)?;
        let anchor = ordered[pos].order_index;
        let prev = pos.checked_sub(1).map(|i| ordered[i].order_index);
        order::index_before(anchor, prev)
    }

    fn append_index(&self, group_id: &GroupId, skip: Option<&TabId>) -> f64 {
        order::index_after_last(
            self.members(group_id, skip)
                .into_iter()
                .map(|t| t.order_index),
        )
    }

    fn position(&self, tab_id: &TabId) -> Result<(Vec<&Tab>, usize)> {
        let group = self.group_of(tab_id)?;
        let ordered = self.members(&group.id, None);
        let pos = ordered
            .iter()
            .position(|t| &t.id == tab_id)
            .ok_or_else(|| {
                StoreError::consistency(format!("tab '{tab_id}' missing from its group ordering"))
            })?;
        Ok((ordered, pos))
    }

    fn members(&self, group_id: &GroupId, skip: Option<&TabId>) -> Vec<&Tab> {
        let mut members: Vec<&Tab> = self
            .tabs
            .values()
            .filter(|t| &t.group_id == group_id && Some(&t.id) != skip)
            .collect();
        members.sort_by(|a, b| {
            order::compare(a.order_index, b.order_index).then_with(|| a.id.cmp(&b.id))
        });
        members
    }

    fn allocate_group_id(&mut self) -> GroupId {
        loop {
            let id = self.ids.next_group();
            if !self.groups.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/tabs.rs"]
mod tests;
