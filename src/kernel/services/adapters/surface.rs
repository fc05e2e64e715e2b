//! In-memory editing surface.
//!
//! Used when no real widget is attached (replay tool, tests). Every call the
//! store makes is appended to a shared [`SurfaceLog`].

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use crate::kernel::services::ports::{EditorOptions, EditorSurface, SurfaceFactory};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Created { surface: usize, options: EditorOptions },
    SetOption { surface: usize, name: String, value: Value },
    SetContent { surface: usize, text: String },
    Disposed { surface: usize },
}

impl SurfaceEvent {
    pub fn surface(&self) -> usize {
        match self {
            Self::Created { surface, .. }
            | Self::SetOption { surface, .. }
            | Self::SetContent { surface, .. }
            | Self::Disposed { surface } => *surface,
        }
    }
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    events: Vec<SurfaceEvent>,
    created: usize,
}

impl SurfaceLog {
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn disposed(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Disposed { .. }))
            .count()
    }

    pub fn disposals_of(&self, surface: usize) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Disposed { .. }) && e.surface() == surface)
            .count()
    }

    /// Last text pushed to `surface`.
    pub fn content_of(&self, surface: usize) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            SurfaceEvent::SetContent { surface: s, text } if *s == surface => Some(text.as_str()),
            _ => None,
        })
    }

    /// Current value of `name` on `surface`, initial options included.
    pub fn option_of(&self, surface: usize, name: &str) -> Option<&Value> {
        self.events.iter().rev().find_map(|e| match e {
            SurfaceEvent::SetOption {
                surface: s,
                name: n,
                value,
            } if *s == surface && n == name => Some(value),
            SurfaceEvent::Created { surface: s, options } if *s == surface => options.get(name),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub type SharedSurfaceLog = Rc<RefCell<SurfaceLog>>;

#[derive(Debug, Clone, Default)]
pub struct HeadlessSurfaceFactory {
    log: SharedSurfaceLog,
}

impl HeadlessSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SharedSurfaceLog {
        Rc::clone(&self.log)
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(&self, initial_options: &EditorOptions) -> Box<dyn EditorSurface> {
        let mut log = self.log.borrow_mut();
        let surface = log.created;
        log.created += 1;
        log.events.push(SurfaceEvent::Created {
            surface,
            options: initial_options.clone(),
        });
        Box::new(HeadlessSurface {
            surface,
            log: Rc::clone(&self.log),
        })
    }
}

struct HeadlessSurface {
    surface: usize,
    log: SharedSurfaceLog,
}

impl EditorSurface for HeadlessSurface {
    fn set_option(&mut self, name: &str, value: &Value) {
        self.log.borrow_mut().events.push(SurfaceEvent::SetOption {
            surface: self.surface,
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn set_content(&mut self, text: &str) {
        self.log.borrow_mut().events.push(SurfaceEvent::SetContent {
            surface: self.surface,
            text: text.to_string(),
        });
    }

    fn dispose(&mut self) {
        self.log
            .borrow_mut()
            .events
            .push(SurfaceEvent::Disposed {
                surface: self.surface,
            });
    }
}
