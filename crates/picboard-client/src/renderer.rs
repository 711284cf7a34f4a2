//! Canvas 2D implementation of the sandbox render surface.

#![allow(deprecated)] // web-sys Canvas API deprecation warnings

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use picboard_core::{Color, DrawableId, Rect, RenderSurface, StrokeStyle};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Decoded images by drawable id, shared between the loader and the surface.
#[derive(Default)]
pub struct ImageRegistry {
    images: HashMap<DrawableId, HtmlImageElement>,
    next_id: u32,
}

impl ImageRegistry {
    pub fn register(&mut self, image: HtmlImageElement) -> DrawableId {
        let id = DrawableId(self.next_id);
        self.next_id += 1;
        self.images.insert(id, image);
        id
    }

    pub fn get(&self, id: DrawableId) -> Option<&HtmlImageElement> {
        self.images.get(&id)
    }

    /// Drops the decoded element. Ids are not handed out again.
    pub fn unregister(&mut self, id: DrawableId) -> Option<HtmlImageElement> {
        self.images.remove(&id)
    }
}

pub type SharedRegistry = Rc<RefCell<ImageRegistry>>;

/// Draws onto an HTML canvas through its 2D context.
pub struct Context2dSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    registry: SharedRegistry,
}

impl Context2dSurface {
    pub fn new(canvas: HtmlCanvasElement, registry: SharedRegistry) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            canvas,
            context,
            registry,
        })
    }

    /// Matches the canvas backing store to `width` x `height` pixels.
    pub fn resize(&self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }

    fn blit(
        &self,
        image: &HtmlImageElement,
        rect: Rect,
        flip: (bool, bool),
        alpha: f64,
    ) -> Result<(), JsValue> {
        self.context.save();
        self.context.set_global_alpha(alpha);
        let result = self.blit_mirrored(image, rect, flip);
        self.context.restore();
        result
    }

    /// Mirrors about the box centre so a flipped image still lands inside `rect`.
    fn blit_mirrored(
        &self,
        image: &HtmlImageElement,
        rect: Rect,
        flip: (bool, bool),
    ) -> Result<(), JsValue> {
        let ctx = &self.context;
        let sx = if flip.0 { -1.0 } else { 1.0 };
        let sy = if flip.1 { -1.0 } else { 1.0 };
        ctx.translate(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)?;
        ctx.scale(sx, sy)?;
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            -rect.width / 2.0,
            -rect.height / 2.0,
            rect.width,
            rect.height,
        )
    }
}

impl RenderSurface for Context2dSurface {
    fn size(&self) -> (f64, f64) {
        (f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn stroke_rect(&mut self, rect: Rect, style: StrokeStyle) {
        self.context.set_stroke_style(&JsValue::from_str(&style.color.to_css()));
        self.context.set_line_width(style.line_width);
        self.context.stroke_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64) {
        self.context.set_global_alpha(alpha);
        self.context.set_fill_style(&JsValue::from_str(&color.to_css()));
        self.context.fill_rect(rect.x, rect.y, rect.width, rect.height);
        self.context.set_global_alpha(1.0);
    }

    fn draw_image(&mut self, drawable: DrawableId, rect: Rect, flip: (bool, bool), alpha: f64) {
        let registry = self.registry.borrow();
        let Some(image) = registry.get(drawable) else {
            tracing::warn!("Unknown drawable {:?}", drawable);
            return;
        };
        if let Err(e) = self.blit(image, rect, flip, alpha) {
            tracing::error!("Failed to draw image: {:?}", e);
        }
    }
}
