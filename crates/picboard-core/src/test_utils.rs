//! Test helpers shared by the unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::future::{Future, ready};

use crate::color::Color;
use crate::entity::{Entity, EntityKind, ImageData, Rect};
use crate::error::LoadFailure;
use crate::images::{DrawableId, ImageLoader, LoadedImage};
use crate::render::{RenderSurface, StrokeStyle};
use crate::vector::Vector2;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Stroke {
        rect: Rect,
        style: StrokeStyle,
    },
    Fill {
        rect: Rect,
        color: Color,
        alpha: f64,
    },
    Image {
        drawable: DrawableId,
        rect: Rect,
        flip: (bool, bool),
        alpha: f64,
    },
}

/// Surface that records every primitive instead of drawing it.
pub(crate) struct RecordingSurface {
    width: f64,
    height: f64,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn stroke_rect(&mut self, rect: Rect, style: StrokeStyle) {
        self.calls.push(DrawCall::Stroke { rect, style });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64) {
        self.calls.push(DrawCall::Fill { rect, color, alpha });
    }

    fn draw_image(&mut self, drawable: DrawableId, rect: Rect, flip: (bool, bool), alpha: f64) {
        self.calls.push(DrawCall::Image {
            drawable,
            rect,
            flip,
            alpha,
        });
    }
}

/// Image entity at `(x, y)` with a centred origin.
pub(crate) fn image_entity(x: f64, y: f64, width: f64, height: f64) -> Entity {
    let kind = EntityKind::Image(ImageData {
        source: "test.png".to_string(),
        drawable: DrawableId(0),
        natural_size: (0, 0),
    });
    Entity::new(kind, Vector2::new(x, y))
        .with_size(width, height)
        .with_origin(width / 2.0, height / 2.0)
}

/// Loader resolving immediately from a fixed table; unknown URIs fail.
#[derive(Default)]
pub(crate) struct StubLoader {
    sizes: HashMap<String, (u32, u32)>,
    next_drawable: Cell<u32>,
}

impl StubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, uri: &str, width: u32, height: u32) -> Self {
        self.sizes.insert(uri.to_string(), (width, height));
        self
    }
}

impl ImageLoader for StubLoader {
    fn load(&self, uri: &str) -> impl Future<Output = Result<LoadedImage, LoadFailure>> {
        let result = match self.sizes.get(uri) {
            Some(&(pixel_width, pixel_height)) => {
                let drawable = DrawableId(self.next_drawable.get());
                self.next_drawable.set(drawable.0 + 1);
                Ok(LoadedImage {
                    pixel_width,
                    pixel_height,
                    drawable,
                })
            }
            None => Err(LoadFailure::Resource(format!("404 {uri}"))),
        };
        ready(result)
    }
}
