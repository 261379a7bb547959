use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Result, SyncError};
use crate::models::ElementId;
use crate::renderers::{CursorPlacement, Rect, ScoreSurface};

#[derive(Clone, Debug, Default)]
struct Element {
    rect: Rect,
    system: Option<ElementId>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    elements: BTreeMap<ElementId, Element>,
    scroll_left: f64,
    cursor: Option<CursorPlacement>,
    scrolled_into_view: Vec<ElementId>,
    mutations: usize,
}

/// Element tree kept in memory
#[derive(Clone, Debug, Default)]
pub struct HeadlessSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an element, optionally inside system `system`
    pub fn add_element(&self, element_id: &str, rect: Rect, system: Option<&str>) {
        self.state.borrow_mut().elements.insert(
            element_id.to_string(),
            Element {
                rect,
                system: system.map(str::to_string),
                attributes: BTreeMap::new(),
            },
        );
    }

    /// Drop an element, as a re-layout would
    pub fn remove_element(&self, element_id: &str) {
        self.state.borrow_mut().elements.remove(element_id);
    }

    /// Move an element without counting it as a style mutation
    pub fn set_rect(&self, element_id: &str, rect: Rect) {
        if let Some(element) = self.state.borrow_mut().elements.get_mut(element_id) {
            element.rect = rect;
        }
    }

    /// Seed an attribute as the rendering backend would have drawn it
    pub fn set_initial_attribute(&self, element_id: &str, name: &str, value: &str) {
        if let Some(element) = self.state.borrow_mut().elements.get_mut(element_id) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Number of attribute writes and removals made through the surface
    pub fn mutation_count(&self) -> usize {
        self.state.borrow().mutations
    }

    pub fn cursor(&self) -> Option<CursorPlacement> {
        self.state.borrow().cursor
    }

    pub fn scrolled_into_view(&self) -> Vec<ElementId> {
        self.state.borrow().scrolled_into_view.clone()
    }

    /// Snapshot of every element's attributes
    pub fn attributes(&self) -> BTreeMap<ElementId, BTreeMap<String, String>> {
        self.state
            .borrow()
            .elements
            .iter()
            .map(|(id, element)| (id.clone(), element.attributes.clone()))
            .collect()
    }

    fn with_element<T>(&self, element_id: &str, f: impl FnOnce(&Element) -> T) -> Result<T> {
        let state = self.state.borrow();
        let element = state
            .elements
            .get(element_id)
            .ok_or_else(|| SyncError::StaleElementReference(element_id.to_string()))?;
        Ok(f(element))
    }

    fn mutate(&self, element_id: &str, f: impl FnOnce(&mut Element)) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let element = state
            .elements
            .get_mut(element_id)
            .ok_or_else(|| SyncError::StaleElementReference(element_id.to_string()))?;
        f(element);
        state.mutations += 1;
        Ok(())
    }
}

impl ScoreSurface for HeadlessSurface {
    fn attribute(&self, element_id: &str, name: &str) -> Result<Option<String>> {
        self.with_element(element_id, |e| e.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, element_id: &str, name: &str, value: &str) -> Result<()> {
        self.mutate(element_id, |e| {
            e.attributes.insert(name.to_string(), value.to_string());
        })
    }

    fn remove_attribute(&mut self, element_id: &str, name: &str) -> Result<()> {
        self.mutate(element_id, |e| {
            e.attributes.remove(name);
        })
    }

    fn bounding_rect(&self, element_id: &str) -> Result<Rect> {
        self.with_element(element_id, |e| e.rect)
    }

    fn system_of(&self, element_id: &str) -> Result<ElementId> {
        self.with_element(element_id, |e| e.system.clone())?
            .ok_or_else(|| SyncError::Renderer(format!("element {} is not inside a system", element_id)))
    }

    fn scroll_left(&self) -> f64 {
        self.state.borrow().scroll_left
    }

    fn scroll_to(&mut self, left: f64) {
        self.state.borrow_mut().scroll_left = left;
    }

    fn scroll_into_view(&mut self, element_id: &str) {
        self.state.borrow_mut().scrolled_into_view.push(element_id.to_string());
    }

    fn place_cursor(&mut self, cursor: CursorPlacement) {
        self.state.borrow_mut().cursor = Some(cursor);
    }

    fn remove_cursor(&mut self) {
        self.state.borrow_mut().cursor = None;
    }
}
