//! Drawing through a minimal 2D raster surface.
//!
//! The core only ever strokes rectangles, fills rectangles, and blits images.
//! The host implements [`RenderSurface`] on top of its canvas context.

use crate::color::Color;
use crate::entity::{Entity, EntityKind, Rect};
use crate::images::DrawableId;

/// Outline stroke parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub line_width: f64,
}

impl StrokeStyle {
    pub const fn new(color: Color, line_width: f64) -> Self {
        Self { color, line_width }
    }
}

/// 2D raster drawing context.
pub trait RenderSurface {
    /// Drawable area in pixels.
    fn size(&self) -> (f64, f64);

    fn stroke_rect(&mut self, rect: Rect, style: StrokeStyle);

    fn fill_rect(&mut self, rect: Rect, color: Color, alpha: f64);

    /// Blits `drawable` into `rect`. `flip` mirrors horizontally/vertically
    /// for boxes whose signed width/height is negative.
    fn draw_image(&mut self, drawable: DrawableId, rect: Rect, flip: (bool, bool), alpha: f64);
}

/// Where an entity's outline goes relative to its fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    /// Stroke first, fill over it.
    Outside,
    /// Fill first, stroke over it.
    Inside,
}

/// Fills the whole surface.
pub fn draw_background<S: RenderSurface + ?Sized>(surface: &mut S, color: Color) {
    let (width, height) = surface.size();
    surface.fill_rect(
        Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
        },
        color,
        1.0,
    );
}

/// Draws an entity's bounding box using its fill/stroke properties.
pub fn draw_rect<S: RenderSurface + ?Sized>(
    surface: &mut S,
    entity: &Entity,
    outline: Outline,
    fill: bool,
) {
    let props = &entity.properties;
    if !props.visible {
        return;
    }

    let rect = entity.bounds();
    let stroke = StrokeStyle::new(props.stroke_color(), props.line_width);
    let has_stroke = props.line_width > 0.0;

    if has_stroke && outline == Outline::Outside {
        surface.stroke_rect(rect, stroke);
    }
    if fill {
        surface.fill_rect(rect, props.fill_color, props.alpha);
    }
    if has_stroke && outline == Outline::Inside {
        surface.stroke_rect(rect, stroke);
    }
}

/// Blits an image entity at its normalized bounds. Non-image entities are
/// ignored.
pub fn draw_image<S: RenderSurface + ?Sized>(surface: &mut S, entity: &Entity) {
    let EntityKind::Image(data) = &entity.kind else {
        return;
    };
    if !entity.properties.visible {
        return;
    }
    let flip = (entity.properties.width < 0.0, entity.properties.height < 0.0);
    surface.draw_image(data.drawable, entity.bounds(), flip, entity.properties.alpha);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DrawCall, RecordingSurface, image_entity};

    #[test]
    fn test_outline_order() {
        let mut e = Entity::generic(10.0, 10.0).with_size(5.0, 5.0);
        e.properties.line_width = 2.0;
        e.properties.stroke_color = Some(Color::WHITE);
        e.properties.fill_color = Color::SLATE;

        let mut outside = RecordingSurface::new(100.0, 100.0);
        draw_rect(&mut outside, &e, Outline::Outside, true);
        assert!(matches!(outside.calls[0], DrawCall::Stroke { .. }));
        assert!(matches!(outside.calls[1], DrawCall::Fill { .. }));

        let mut inside = RecordingSurface::new(100.0, 100.0);
        draw_rect(&mut inside, &e, Outline::Inside, true);
        assert!(matches!(inside.calls[0], DrawCall::Fill { .. }));
        assert!(matches!(inside.calls[1], DrawCall::Stroke { .. }));
    }

    #[test]
    fn test_no_stroke_without_line_width() {
        let e = Entity::generic(0.0, 0.0).with_size(5.0, 5.0);
        let mut surface = RecordingSurface::new(100.0, 100.0);
        draw_rect(&mut surface, &e, Outline::Outside, true);
        assert_eq!(surface.calls.len(), 1);
    }

    #[test]
    fn test_hidden_entity_not_drawn() {
        let mut e = Entity::generic(0.0, 0.0).with_size(5.0, 5.0);
        e.properties.visible = false;
        let mut surface = RecordingSurface::new(100.0, 100.0);
        draw_rect(&mut surface, &e, Outline::Outside, true);
        draw_image(&mut surface, &e);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn test_flipped_image_is_normalized() {
        let mut image = image_entity(100.0, 100.0, 40.0, 20.0);
        image.properties.origin = crate::vector::Vector2::ZERO;
        image.properties.width = -40.0;

        let mut surface = RecordingSurface::new(300.0, 300.0);
        draw_image(&mut surface, &image);

        let DrawCall::Image { rect, flip, .. } = &surface.calls[0] else {
            panic!("expected image blit, got {:?}", surface.calls[0]);
        };
        assert_eq!(
            *rect,
            Rect {
                x: 60.0,
                y: 100.0,
                width: 40.0,
                height: 20.0
            }
        );
        assert_eq!(*flip, (true, false));
    }

    #[test]
    fn test_background_covers_surface() {
        let mut surface = RecordingSurface::new(640.0, 480.0);
        draw_background(&mut surface, Color::CHARCOAL);
        let DrawCall::Fill { rect, color, .. } = &surface.calls[0] else {
            panic!("expected fill");
        };
        assert_eq!(rect.width, 640.0);
        assert_eq!(rect.height, 480.0);
        assert_eq!(*color, Color::CHARCOAL);
    }
}
