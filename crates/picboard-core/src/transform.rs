//! Transform handles for the selected image.
//!
//! The controller owns one handle entity per [`HandleSlot`]. While an image
//! is targeted the handles sit at fixed offsets from the image box (see
//! [`handle_offset`]); dragging a handle derives the image's new geometry
//! from the drag-start snapshot via [`resize_rule`] and then lays every
//! handle out again from that geometry.

use serde::{Deserialize, Serialize};

use crate::config::OverlayStyle;
use crate::entity::{Entity, EntityId, EntityKind, Rect};
use crate::error::SandboxError;
use crate::images::ImageRef;
use crate::render::{self, Outline, RenderSurface, StrokeStyle};
use crate::vector::Vector2;

/// Named position of a handle around the image box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleSlot {
    Pivot,
    TopLeft,
    TopMid,
    TopRight,
    MidLeft,
    Middle,
    MidRight,
    BotLeft,
    BotMid,
    BotRight,
}

impl HandleSlot {
    /// Every slot, in layout (and draw) order.
    pub const ALL: [HandleSlot; 10] = [
        HandleSlot::Pivot,
        HandleSlot::TopLeft,
        HandleSlot::TopMid,
        HandleSlot::TopRight,
        HandleSlot::MidLeft,
        HandleSlot::Middle,
        HandleSlot::MidRight,
        HandleSlot::BotLeft,
        HandleSlot::BotMid,
        HandleSlot::BotRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            HandleSlot::Pivot => "pivot",
            HandleSlot::TopLeft => "top-left",
            HandleSlot::TopMid => "top-mid",
            HandleSlot::TopRight => "top-right",
            HandleSlot::MidLeft => "mid-left",
            HandleSlot::Middle => "middle",
            HandleSlot::MidRight => "mid-right",
            HandleSlot::BotLeft => "bot-left",
            HandleSlot::BotMid => "bot-mid",
            HandleSlot::BotRight => "bot-right",
        }
    }

    /// Corner and edge handles change the image size.
    pub fn is_resize(self) -> bool {
        !matches!(self, HandleSlot::Pivot | HandleSlot::Middle)
    }

    /// The pivot only marks the image anchor.
    pub fn is_draggable(self) -> bool {
        self != HandleSlot::Pivot
    }
}

/// Position, origin and signed size of an image box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub position: Vector2,
    pub origin: Vector2,
    pub width: f64,
    pub height: f64,
}

impl ImageGeometry {
    pub fn of(entity: &Entity) -> Self {
        Self {
            position: entity.position,
            origin: entity.properties.origin,
            width: entity.properties.width,
            height: entity.properties.height,
        }
    }

    /// Writes size and origin, then repositions through `set_pos` so the
    /// entity's move hook runs.
    pub fn apply_to(&self, entity: &mut Entity) {
        entity.properties.width = self.width;
        entity.properties.height = self.height;
        entity.properties.origin = self.origin;
        entity.set_pos(Some(self.position.x), Some(self.position.y));
    }

    fn corner(&self) -> Vector2 {
        self.position - self.origin
    }
}

/// State captured when a handle drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSnapshot {
    pub slot: HandleSlot,
    pub handle_start: Vector2,
    pub image_start_pos: Vector2,
    /// Captured for completeness; the resize rules do not read it.
    pub image_start_origin: Vector2,
    pub image_start_width: f64,
    pub image_start_height: f64,
}

impl DragSnapshot {
    fn start_geometry(&self) -> ImageGeometry {
        ImageGeometry {
            position: self.image_start_pos,
            origin: self.image_start_origin,
            width: self.image_start_width,
            height: self.image_start_height,
        }
    }
}

/// Offset of a handle from the image's `position - origin` corner.
pub fn handle_offset(slot: HandleSlot, width: f64, height: f64) -> Vector2 {
    let (hw, hh) = (width / 2.0, height / 2.0);
    match slot {
        // The pivot sits on the anchor itself; callers add the origin back.
        HandleSlot::Pivot => Vector2::ZERO,
        HandleSlot::TopLeft => Vector2::new(0.0, 0.0),
        HandleSlot::TopMid => Vector2::new(hw, 0.0),
        HandleSlot::TopRight => Vector2::new(width, 0.0),
        HandleSlot::MidLeft => Vector2::new(0.0, hh),
        HandleSlot::Middle => Vector2::new(hw, hh),
        HandleSlot::MidRight => Vector2::new(width, hh),
        HandleSlot::BotLeft => Vector2::new(0.0, height),
        HandleSlot::BotMid => Vector2::new(hw, height),
        HandleSlot::BotRight => Vector2::new(width, height),
    }
}

/// Where `slot` belongs for the given image geometry.
pub fn handle_position(slot: HandleSlot, geometry: &ImageGeometry) -> Vector2 {
    match slot {
        HandleSlot::Pivot => geometry.position,
        _ => geometry.corner() + handle_offset(slot, geometry.width, geometry.height),
    }
}

/// New image geometry after dragging `slot` by `scale` (net delta since the
/// drag started). Each rule keeps the opposite corner or edge fixed.
///
/// Extents may go negative; nothing is clamped. Returns `None` for the pivot.
pub fn resize_rule(
    slot: HandleSlot,
    start: &DragSnapshot,
    scale: Vector2,
) -> Option<ImageGeometry> {
    let w0 = start.image_start_width;
    let h0 = start.image_start_height;
    let p0 = start.image_start_pos;
    let (sx, sy) = (scale.x, scale.y);

    let (width, height, position) = match slot {
        HandleSlot::Pivot => return None,
        HandleSlot::TopLeft => (w0 - sx, h0 - sy, p0 + scale),
        HandleSlot::TopMid => (w0, h0 - sy, p0 + Vector2::new(0.0, sy)),
        HandleSlot::TopRight => (w0 + sx, h0 - sy, p0 + Vector2::new(0.0, sy)),
        HandleSlot::MidLeft => (w0 - sx, h0, p0 + Vector2::new(sx, 0.0)),
        HandleSlot::Middle => (w0, h0, p0 + scale),
        HandleSlot::MidRight => (w0 + sx, h0, p0),
        HandleSlot::BotLeft => (w0 - sx, h0 + sy, p0 + Vector2::new(sx, 0.0)),
        HandleSlot::BotMid => (w0, h0 + sy, p0),
        HandleSlot::BotRight => (w0 + sx, h0 + sy, p0),
    };

    Some(ImageGeometry {
        width,
        height,
        position,
        ..start.start_geometry()
    })
}

/// Handle overlay bound to at most one image.
#[derive(Debug, Clone)]
pub struct TransformController {
    target: Option<EntityId>,
    handles: [Entity; 10],
    drag: Option<DragSnapshot>,
    style: OverlayStyle,
}

impl Default for TransformController {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}

impl TransformController {
    /// Creates the handles once; they start hidden.
    pub fn new(style: OverlayStyle) -> Self {
        let handles = HandleSlot::ALL.map(|slot| {
            let size = style.handle_size;
            let mut handle = Entity::new(EntityKind::ManipulationHandle(slot), Vector2::ZERO)
                .with_size(size, size)
                .with_origin(size / 2.0, size / 2.0)
                .with_name(slot.name());
            handle.properties.fill_color = style.handle_fill;
            handle.properties.stroke_color = Some(style.handle_stroke);
            handle.properties.line_width = style.handle_line_width;
            handle.properties.visible = false;
            handle.interactive = false;
            handle.draggable = false;
            handle
        });

        Self {
            target: None,
            handles,
            drag: None,
            style,
        }
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn handle(&self, slot: HandleSlot) -> &Entity {
        &self.handles[slot.index()]
    }

    pub fn handle_mut(&mut self, slot: HandleSlot) -> &mut Entity {
        &mut self.handles[slot.index()]
    }

    pub fn handles(&self) -> impl Iterator<Item = &Entity> {
        self.handles.iter()
    }

    pub fn drag(&self) -> Option<&DragSnapshot> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Targets `image`, replacing any previous target. Returns `false` if
    /// `image` was already the target (handles are still re-laid-out).
    pub fn select(&mut self, image: &Entity) -> bool {
        let changed = self.target != Some(image.id);
        if changed {
            if let Some(previous) = self.target {
                tracing::debug!(
                    previous = %previous,
                    next = %image.id,
                    "transform target replaced"
                );
            }
            self.drag = None;
            self.target = Some(image.id);
            for handle in &mut self.handles {
                let slot = handle.kind.handle_slot();
                let draggable = slot.is_some_and(HandleSlot::is_draggable);
                handle.properties.visible = true;
                handle.interactive = draggable;
                handle.draggable = draggable;
            }
        }
        self.layout(image);
        changed
    }

    /// Releases the target and hides the handles. Returns the released id.
    pub fn deselect(&mut self) -> Option<EntityId> {
        let released = self.target.take()?;
        self.drag = None;
        for handle in &mut self.handles {
            handle.properties.visible = false;
            handle.interactive = false;
            handle.draggable = false;
        }
        tracing::debug!(image = %released, "transform target released");
        Some(released)
    }

    /// Places every handle from `image`'s geometry.
    pub fn layout(&mut self, image: &Entity) {
        let geometry = ImageGeometry::of(image);
        for handle in &mut self.handles {
            if let Some(slot) = handle.kind.handle_slot() {
                handle.position = handle_position(slot, &geometry);
            }
        }
    }

    /// Call after the target moved by any path other than a handle drag.
    pub fn image_moved(&mut self, image: &Entity) {
        if self.target == Some(image.id) && self.drag.is_none() {
            self.layout(image);
        }
    }

    /// Snapshots handle and image state for a drag of `slot`.
    pub fn begin_drag(&mut self, slot: HandleSlot, image: &Entity) -> Result<(), SandboxError> {
        if self.target != Some(image.id) {
            return Err(SandboxError::NotFound(ImageRef::Id(image.id)));
        }
        if !slot.is_draggable() {
            return Ok(());
        }

        let geometry = ImageGeometry::of(image);
        self.drag = Some(DragSnapshot {
            slot,
            handle_start: self.handle(slot).position,
            image_start_pos: geometry.position,
            image_start_origin: geometry.origin,
            image_start_width: geometry.width,
            image_start_height: geometry.height,
        });
        tracing::debug!(handle = slot.name(), image = %image.id, "handle drag started");
        Ok(())
    }

    /// Moves `slot` by the pointer delta and resizes `image` from the
    /// snapshot. Fails without touching anything if no drag of `slot` was
    /// started.
    pub fn drag_handle(
        &mut self,
        slot: HandleSlot,
        dx: f64,
        dy: f64,
        image: &mut Entity,
    ) -> Result<ImageGeometry, SandboxError> {
        let snapshot = match self.drag {
            Some(snapshot) if snapshot.slot == slot && self.target == Some(image.id) => snapshot,
            _ => return Err(SandboxError::InvalidDragState(slot)),
        };

        let handle = self.handle_mut(slot);
        handle.move_by(dx, dy);
        let scale = handle.position - snapshot.handle_start;

        let geometry =
            resize_rule(slot, &snapshot, scale).ok_or(SandboxError::InvalidDragState(slot))?;
        geometry.apply_to(image);
        self.layout(image);
        Ok(geometry)
    }

    pub fn end_drag(&mut self) -> Option<DragSnapshot> {
        self.drag.take()
    }

    /// Top-most interactive handle under `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HandleSlot> {
        self.handles
            .iter()
            .rev()
            .filter(|h| h.properties.visible && h.interactive)
            .find(|h| h.check_point_collision(x, y))
            .and_then(|h| h.kind.handle_slot())
    }

    /// Double outline around `image`, then every visible handle.
    pub fn draw<S: RenderSurface + ?Sized>(&self, surface: &mut S, image: &Entity) {
        if self.target != Some(image.id) {
            return;
        }

        let bounds: Rect = image.bounds();
        surface.stroke_rect(
            bounds,
            StrokeStyle::new(self.style.outline_light, self.style.outline_light_width),
        );
        surface.stroke_rect(
            bounds,
            StrokeStyle::new(self.style.outline_dark, self.style.outline_dark_width),
        );

        for handle in &self.handles {
            render::draw_rect(surface, handle, Outline::Outside, true);
        }
    }
}
