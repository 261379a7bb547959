//! DOM-backed score surface
//!
//! Verovio renders the score as SVG with one `g` element per note, rest and
//! measure, each carrying the id used in the timemap; measures sit inside
//! `g.system` groups. The cursor is an absolutely positioned `div` appended to
//! the score container the first time it is placed.

use web_sys::{Document, Element};

use crate::error::{Result, SyncError};
use crate::models::ElementId;
use crate::renderers::{CursorPlacement, Rect, ScoreSurface};

use super::helpers::describe_js;

const SYSTEM_SELECTOR: &str = "g.system";
const CURSOR_CLASS: &str = "score-player-cursor";

pub struct DomSurface {
    document: Document,
    container: Element,
    /// Created on first placement, so a score that fails to load leaves no trace
    cursor: Option<Element>,
}

impl DomSurface {
    /// Attach to the element with id `container_id`
    pub fn attach(container_id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| SyncError::Renderer("no document available".to_string()))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| SyncError::Renderer(format!("container #{} not found", container_id)))?;

        Ok(Self {
            document,
            container,
            cursor: None,
        })
    }

    fn cursor_element(&mut self) -> Result<&Element> {
        if self.cursor.is_none() {
            let cursor = self.document.create_element("div").map_err(renderer_error)?;
            cursor.set_attribute("class", CURSOR_CLASS).map_err(renderer_error)?;
            self.container.append_child(&cursor).map_err(renderer_error)?;
            self.cursor = Some(cursor);
        }
        self.cursor
            .as_ref()
            .ok_or_else(|| SyncError::Renderer("cursor element missing".to_string()))
    }

    fn element(&self, element_id: &str) -> Result<Element> {
        self.document
            .get_element_by_id(element_id)
            .ok_or_else(|| SyncError::StaleElementReference(element_id.to_string()))
    }
}

fn renderer_error(value: wasm_bindgen::JsValue) -> SyncError {
    SyncError::Renderer(describe_js(&value))
}

impl ScoreSurface for DomSurface {
    fn attribute(&self, element_id: &str, name: &str) -> Result<Option<String>> {
        Ok(self.element(element_id)?.get_attribute(name))
    }

    fn set_attribute(&mut self, element_id: &str, name: &str, value: &str) -> Result<()> {
        self.element(element_id)?
            .set_attribute(name, value)
            .map_err(renderer_error)
    }

    fn remove_attribute(&mut self, element_id: &str, name: &str) -> Result<()> {
        self.element(element_id)?
            .remove_attribute(name)
            .map_err(renderer_error)
    }

    fn bounding_rect(&self, element_id: &str) -> Result<Rect> {
        let rect = self.element(element_id)?.get_bounding_client_rect();
        Ok(Rect::new(rect.x(), rect.y(), rect.width(), rect.height()))
    }

    fn system_of(&self, element_id: &str) -> Result<ElementId> {
        let system = self
            .element(element_id)?
            .closest(SYSTEM_SELECTOR)
            .map_err(renderer_error)?
            .ok_or_else(|| SyncError::Renderer(format!("element {} is not inside a system", element_id)))?;
        let id = system.id();
        if id.is_empty() {
            return Err(SyncError::Renderer(format!("system of {} has no id", element_id)));
        }
        Ok(id)
    }

    fn scroll_left(&self) -> f64 {
        f64::from(self.container.scroll_left())
    }

    fn scroll_to(&mut self, left: f64) {
        self.container.set_scroll_left(left as i32);
    }

    fn scroll_into_view(&mut self, element_id: &str) {
        match self.element(element_id) {
            Ok(element) => element.scroll_into_view(),
            Err(e) => log::debug!("cannot scroll to {}", e),
        }
    }

    fn place_cursor(&mut self, cursor: CursorPlacement) {
        let style = format!(
            "position: absolute; left: {}px; top: {}px; height: {}px",
            cursor.x, cursor.y, cursor.height
        );
        let placed = self
            .cursor_element()
            .and_then(|element| element.set_attribute("style", &style).map_err(renderer_error));
        if let Err(e) = placed {
            log::warn!("cursor update failed: {}", e);
        }
    }

    fn remove_cursor(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            cursor.remove();
        }
    }
}
