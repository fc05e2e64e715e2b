//! zcode-workbench - headless workbench state for the editor
//!
//! 模块结构：
//! - models: 数据模型（FileTree, fractional ordering）
//! - kernel: stores (editor, tabs), actions, effects, service ports/adapters
//! - logging: tracing subscriber setup

pub mod kernel;
pub mod logging;
pub mod models;

pub use kernel::{Action, DispatchResult, Effect, Store, StoreError};
