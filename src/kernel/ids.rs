use compact_str::{format_compact, CompactString};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(CompactString);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(CompactString::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a tab (document handle).
    TabId
);
string_id!(EditorId);
string_id!(GroupId);

/// Hands out `prefix_N` ids. Counters only grow, so an id that was destroyed
/// is never produced again.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: FxHashMap<&'static str, u64>,
}

impl IdAllocator {
    pub fn next(&mut self, prefix: &'static str) -> CompactString {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format_compact!("{prefix}_{counter}")
    }

    pub fn next_tab(&mut self) -> TabId {
        TabId(self.next("tab"))
    }

    pub fn next_editor(&mut self) -> EditorId {
        EditorId(self.next("editor"))
    }

    pub fn next_group(&mut self) -> GroupId {
        GroupId(self.next("tab_group"))
    }
}
