//! Positioned, typed canvas objects and the arenas that own them.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::images::DrawableId;
use crate::pointer::{PointerEvent, PointerEventType};
use crate::transform::HandleSlot;
use crate::vector::Vector2;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity.
///
/// Assigned from a process-wide counter, so ids increase in creation order
/// and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Image-specific entity data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// URI the pixels were loaded from.
    pub source: String,
    /// Host-side handle of the decoded image.
    pub drawable: DrawableId,
    /// Pixel dimensions reported by the loader.
    pub natural_size: (u32, u32),
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Image(ImageData),
    ManipulationHandle(HandleSlot),
    Generic,
}

impl EntityKind {
    pub fn is_image(&self) -> bool {
        matches!(self, EntityKind::Image(_))
    }

    pub fn handle_slot(&self) -> Option<HandleSlot> {
        match self {
            EntityKind::ManipulationHandle(slot) => Some(*slot),
            _ => None,
        }
    }
}

/// Geometry and appearance of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    /// Offset inside the box that `position` refers to.
    pub origin: Vector2,
    /// May be negative (horizontally flipped).
    pub width: f64,
    /// May be negative (vertically flipped).
    pub height: f64,
    pub visible: bool,
    pub alpha: f64,
    pub fill_color: Color,
    /// Falls back to `fill_color` when unset.
    pub stroke_color: Option<Color>,
    pub line_width: f64,
    /// Reserved; rotation is not supported.
    pub angle: f64,
}

impl Default for EntityProperties {
    fn default() -> Self {
        Self {
            origin: Vector2::ZERO,
            width: 0.0,
            height: 0.0,
            visible: true,
            alpha: 1.0,
            fill_color: Color::RED,
            stroke_color: None,
            line_width: 0.0,
            angle: 0.0,
        }
    }
}

impl EntityProperties {
    pub fn stroke_color(&self) -> Color {
        self.stroke_color.unwrap_or(self.fill_color)
    }
}

/// Axis-aligned rectangle with non-negative extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Builds a rectangle from a corner and signed extents, normalizing
    /// negative extents so the result always has its minimum corner at `(x, y)`.
    pub fn from_signed(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x_offset = if width < 0.0 { width.abs() } else { 0.0 };
        let y_offset = if height < 0.0 { height.abs() } else { 0.0 };
        Self {
            x: x - x_offset,
            y: y - y_offset,
            width: width.abs(),
            height: height.abs(),
        }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Side-effecting callback attached to an entity.
pub type Hook<T> = Rc<dyn Fn(EntityId, &T)>;

/// Optional per-entity callbacks, invoked synchronously.
#[derive(Clone, Default)]
pub struct EntityHooks {
    pub on_pointer_down: Option<Hook<PointerEvent>>,
    pub on_pointer_move: Option<Hook<PointerEvent>>,
    pub on_pointer_up: Option<Hook<PointerEvent>>,
    pub on_click: Option<Hook<PointerEvent>>,
    /// Receives the new position after `move_by`/`set_pos`.
    pub on_move: Option<Hook<Vector2>>,
}

impl EntityHooks {
    /// Invokes the pointer hook matching `kind`, if any.
    pub fn fire_pointer(&self, id: EntityId, kind: PointerEventType, event: &PointerEvent) {
        let hook = match kind {
            PointerEventType::Down => &self.on_pointer_down,
            PointerEventType::Move => &self.on_pointer_move,
            PointerEventType::Up => &self.on_pointer_up,
            PointerEventType::Click => &self.on_click,
            PointerEventType::ContextMenu => return,
        };
        if let Some(hook) = hook {
            hook(id, event);
        }
    }
}

impl fmt::Debug for EntityHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHooks")
            .field("on_pointer_down", &self.on_pointer_down.is_some())
            .field("on_pointer_move", &self.on_pointer_move.is_some())
            .field("on_pointer_up", &self.on_pointer_up.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("on_move", &self.on_move.is_some())
            .finish()
    }
}

/// A positioned object participating in hit-testing, rendering and
/// pointer interaction.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Vector2,
    pub properties: EntityProperties,
    pub kind: EntityKind,
    pub interactive: bool,
    pub draggable: bool,
    pub hooks: EntityHooks,
}

impl Entity {
    /// Creates an entity with a fresh id and default properties.
    pub fn new(kind: EntityKind, position: Vector2) -> Self {
        Self {
            id: EntityId::next(),
            name: "none".to_string(),
            position,
            properties: EntityProperties::default(),
            kind,
            interactive: true,
            draggable: true,
            hooks: EntityHooks::default(),
        }
    }

    pub fn generic(x: f64, y: f64) -> Self {
        Self::new(EntityKind::Generic, Vector2::new(x, y))
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.properties.width = width;
        self.properties.height = height;
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.properties.origin = Vector2::new(x, y);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Top-left corner of the box before flip normalization (`position - origin`).
    pub fn corner(&self) -> Vector2 {
        self.position - self.properties.origin
    }

    /// Normalized bounding box used for hit-testing and drawing.
    pub fn bounds(&self) -> Rect {
        let corner = self.corner();
        Rect::from_signed(
            corner.x,
            corner.y,
            self.properties.width,
            self.properties.height,
        )
    }

    pub fn check_point_collision(&self, x: f64, y: f64) -> bool {
        self.bounds().contains(x, y)
    }

    /// Translates by `(dx, dy)` and runs `on_move` before returning.
    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position + Vector2::new(dx, dy);
        self.notify_moved();
    }

    /// Absolute reposition; a `None` component keeps its current value.
    pub fn set_pos(&mut self, x: Option<f64>, y: Option<f64>) {
        self.position = Vector2::new(x.unwrap_or(self.position.x), y.unwrap_or(self.position.y));
        self.notify_moved();
    }

    fn notify_moved(&self) {
        if let Some(hook) = &self.hooks.on_move {
            hook(self.id, &self.position);
        }
    }

    pub fn distance_between(a: &Entity, b: &Entity) -> f64 {
        a.position.distance(b.position)
    }
}

/// Ordered list of entities owned by one component.
///
/// Later entities are drawn on top and win hit-tests.
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// Deletes an entity. Returns `None` if it was already removed.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Entity> {
        (index < self.entities.len()).then(|| self.entities.remove(index))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Top-most visible, interactive entity under `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<EntityId> {
        self.entities
            .iter()
            .rev()
            .filter(|e| e.properties.visible && e.interactive)
            .find(|e| e.check_point_collision(x, y))
            .map(|e| e.id)
    }
}
