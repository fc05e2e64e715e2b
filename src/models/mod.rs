//! 数据模型层

pub mod file_tree;
pub mod order;

pub use file_tree::{Descendants, FileEntity, FilePatch, FileTree, VcsStatus, ROOT_PATH};
