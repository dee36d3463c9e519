//! DOM render surface
//!
//! One absolutely positioned element per mosquito inside the game area,
//! plus the HUD and the phase-dependent buttons from `index.html`.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use super::{RenderSurface, Snapshot, Sprite};
use crate::sim::GamePhase;

struct Node {
    element: Element,
    sprite: Sprite,
}

pub struct DomSurface {
    document: Document,
    area: Element,
    nodes: HashMap<u32, Node>,
}

impl DomSurface {
    pub fn new(document: Document, area_id: &str) -> Result<Self, JsValue> {
        let area = document
            .get_element_by_id(area_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{}", area_id)))?;
        Ok(Self {
            document,
            area,
            nodes: HashMap::new(),
        })
    }

    pub fn area(&self) -> &Element {
        &self.area
    }

    /// Current play area size in CSS pixels
    pub fn size(&self) -> (f32, f32) {
        (
            self.area.client_width() as f32,
            self.area.client_height() as f32,
        )
    }

    fn create_node(&self, id: u32, sprite: Sprite) -> Result<Element, JsValue> {
        let element = self.document.create_element("div")?;
        element.set_class_name(sprite.class_name());
        element.set_attribute("data-id", &id.to_string())?;

        let img = self.document.create_element("img")?;
        img.set_attribute("src", sprite.image())?;
        img.set_attribute("alt", "mosquito")?;
        img.set_class_name("mosquito-img");
        element.append_child(&img)?;

        self.area.append_child(&element)?;
        Ok(element)
    }

    fn sync_targets(&mut self, snapshot: &Snapshot<'_>) -> Result<(), JsValue> {
        let session = snapshot.session;
        self.nodes.retain(|id, node| {
            let keep = session.target(*id).is_some();
            if !keep {
                node.element.remove();
            }
            keep
        });

        for (target, sprite) in snapshot.targets() {
            if !self.nodes.contains_key(&target.id) {
                let element = self.create_node(target.id, sprite)?;
                self.nodes.insert(target.id, Node { element, sprite });
            }
            let Some(node) = self.nodes.get_mut(&target.id) else {
                continue;
            };

            if node.sprite != sprite {
                node.element.set_class_name(sprite.class_name());
                if let Some(img) = node.element.first_element_child() {
                    img.set_attribute("src", sprite.image())?;
                }
                node.sprite = sprite;
            }

            if let Some(el) = node.element.dyn_ref::<HtmlElement>() {
                let style = el.style();
                style.set_property("left", &format!("{}px", target.pos.x))?;
                style.set_property("top", &format!("{}px", target.pos.y))?;
            }
        }
        Ok(())
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(&self, id: &str, visible: bool) -> Result<(), JsValue> {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.class_list().toggle_with_force("hidden", !visible)?;
        }
        Ok(())
    }

    fn update_hud(&self, snapshot: &Snapshot<'_>) -> Result<(), JsValue> {
        let session = snapshot.session;

        if let Some(el) = self.document.get_element_by_id("lives") {
            let hearts: String = snapshot
                .hearts()
                .map(|on| {
                    let state = if on { "active" } else { "inactive" };
                    format!("<span class=\"life {}\">❤️</span>", state)
                })
                .collect();
            el.set_inner_html(&hearts);
        }
        self.set_text("score", &format!("Score: {}", session.score));
        self.set_text("timer", &format!("Time: {}s", session.time_remaining));

        self.set_visible("start-btn", session.phase == GamePhase::Idle)?;
        self.set_visible("end-btn", session.phase == GamePhase::Playing)?;
        self.set_visible("game-over", session.phase == GamePhase::GameOver)?;
        if session.phase == GamePhase::GameOver {
            self.set_text("final-score", &session.score.to_string());
        }
        Ok(())
    }
}

impl RenderSurface for DomSurface {
    fn present(&mut self, snapshot: &Snapshot<'_>) {
        if let Err(e) = self.sync_targets(snapshot) {
            log::warn!("Target render error: {:?}", e);
        }
        if let Err(e) = self.update_hud(snapshot) {
            log::warn!("HUD render error: {:?}", e);
        }
    }
}

/// Mosquito ID under a pointer event, if the event came from one
pub fn target_id_from_event(event: &web_sys::Event) -> Option<u32> {
    let element = event.target()?.dyn_into::<Element>().ok()?;
    let mosquito = element.closest(".mosquito").ok()??;
    mosquito.get_attribute("data-id")?.parse().ok()
}
