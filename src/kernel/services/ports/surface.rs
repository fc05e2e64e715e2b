//! Contract of the text-editing surface owned by each editor instance.
//!
//! The store only pushes state into a surface; it never reads anything back.

use serde_json::Value;
use std::collections::BTreeMap;

pub type EditorOptions = BTreeMap<String, Value>;

pub trait EditorSurface {
    fn set_option(&mut self, name: &str, value: &Value);
    fn set_content(&mut self, text: &str);
    fn dispose(&mut self);
}

pub trait SurfaceFactory {
    fn create(&self, initial_options: &EditorOptions) -> Box<dyn EditorSurface>;
}
