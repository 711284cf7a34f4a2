//! Interaction glue between pointer input, the image collection and the
//! transform controller.
//!
//! The host forwards every raw pointer event to the matching `pointer_*`
//! method and calls [`Sandbox::draw_frame`] once per animation frame. Work
//! that needs the host (loading a new image) comes back as a
//! [`SandboxCommand`].

use crate::config::SandboxConfig;
use crate::entity::{Entity, EntityHooks, EntityId};
use crate::error::{LoadFailure, SandboxError};
use crate::images::{
    Deselect, ImageCollection, ImageRef, ImageSpec, LoadedImage, ManipulatorMode, PendingImage,
};
use crate::pointer::{
    Cursor, EntityRef, PointerButton, PointerEvent, PointerEventType, PointerInput,
    RawPointerEvent,
};
use crate::render::{self, RenderSurface};
use crate::transform::{HandleSlot, TransformController};
use crate::vector::Vector2;

/// Pointer travel between down and up beyond which the release no longer
/// counts as a click.
const CLICK_SLOP: f64 = 2.0;

/// Host-side work requested by an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxCommand {
    /// Load this image and hand the result to [`Sandbox::complete_image`].
    CreateImage(ImageSpec),
}

#[derive(Debug)]
pub struct Sandbox {
    config: SandboxConfig,
    images: ImageCollection,
    controller: TransformController,
    pointer: PointerInput,
    /// Pointer position at the previous down/move, for drag deltas.
    last_position: Option<Vector2>,
    /// Where the current press started.
    down_position: Option<Vector2>,
    /// Set on a release that ended a drag; the click that follows is not a
    /// selection gesture.
    suppress_click: bool,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            images: ImageCollection::new(config.mode),
            controller: TransformController::new(config.overlay.clone()),
            pointer: PointerInput::with_history_limit(config.max_pointer_history),
            last_position: None,
            down_position: None,
            suppress_click: false,
            config,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    pub fn controller(&self) -> &TransformController {
        &self.controller
    }

    pub fn pointer(&self) -> &PointerInput {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut PointerInput {
        &mut self.pointer
    }

    pub fn cursor(&self) -> Cursor {
        self.pointer.cursor()
    }

    /// Inserts an image whose load has resolved.
    pub fn complete_image(
        &mut self,
        pending: PendingImage,
        loaded: Result<LoadedImage, LoadFailure>,
    ) -> Result<EntityId, SandboxError> {
        self.images.complete(pending, loaded)
    }

    /// Adds an already-built image entity on top.
    pub fn insert_image(&mut self, image: Entity) -> EntityId {
        self.images.insert(image)
    }

    /// Replaces an image's callbacks. Geometry is untouched.
    pub fn set_image_hooks(
        &mut self,
        id: EntityId,
        hooks: EntityHooks,
    ) -> Result<(), SandboxError> {
        let image = self.images.get_mut(id).ok_or(SandboxError::NotFound(ImageRef::Id(id)))?;
        image.hooks = hooks;
        Ok(())
    }

    pub fn delete_image(&mut self, image: ImageRef) -> Result<Entity, SandboxError> {
        let removed = self.images.delete(image, &mut self.controller)?;
        self.forget(removed.id);
        Ok(removed)
    }

    /// Deletes every selected image and hands back the removed entities.
    pub fn delete_selected(&mut self) -> Vec<Entity> {
        let ids: Vec<EntityId> = self.images.selected().iter().copied().collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.delete_image(ImageRef::Id(id)) {
                Ok(image) => removed.push(image),
                Err(err) => tracing::warn!(%err, "selected image not deleted"),
            }
        }
        removed
    }

    pub fn select_image(&mut self, id: EntityId) -> Result<(), SandboxError> {
        self.images.select(id, &mut self.controller)
    }

    pub fn deselect_images(&mut self, which: Deselect) -> Result<Vec<EntityId>, SandboxError> {
        self.images.deselect(which, &mut self.controller)
    }

    pub fn set_mode(&mut self, mode: ManipulatorMode) {
        self.images.set_mode(mode, &mut self.controller);
    }

    /// Moves an image and keeps the handles on it.
    pub fn move_image(&mut self, id: EntityId, dx: f64, dy: f64) -> Result<(), SandboxError> {
        let image = self.images.get_mut(id).ok_or(SandboxError::NotFound(ImageRef::Id(id)))?;
        image.move_by(dx, dy);
        self.controller.image_moved(image);
        Ok(())
    }

    /// Top-most target under `(x, y)`; handles sit above images.
    pub fn pick(&self, x: f64, y: f64) -> Option<EntityRef> {
        self.controller
            .hit_test(x, y)
            .map(EntityRef::Handle)
            .or_else(|| self.images.hit_test(x, y).map(EntityRef::Image))
    }

    pub fn pointer_down(&mut self, raw: RawPointerEvent) -> Option<SandboxCommand> {
        let event = self.pointer.handle_down(raw);
        let target = self.pick(raw.x, raw.y);
        self.pointer.hover = target;
        self.pointer.active = target;
        self.last_position = Some(event.position);
        self.down_position = Some(event.position);
        self.suppress_click = false;

        let command = match raw.button {
            PointerButton::Middle => {
                self.release_selection();
                let spec = ImageSpec::at(self.config.default_image.as_str(), raw.x, raw.y);
                tracing::debug!(
                    uri = %spec.source,
                    x = raw.x,
                    y = raw.y,
                    "image creation requested"
                );
                Some(SandboxCommand::CreateImage(spec))
            }
            PointerButton::Left => {
                if let Some(EntityRef::Handle(slot)) = target {
                    self.begin_handle_drag(slot);
                }
                None
            }
            _ => None,
        };

        self.fire_active(PointerEventType::Down, &event);
        command
    }

    pub fn pointer_move(&mut self, raw: RawPointerEvent) {
        let event = self.pointer.handle_move(raw);
        let delta = self.last_position.map_or(Vector2::ZERO, |last| event.position - last);
        self.last_position = Some(event.position);
        self.pointer.hover = self.pick(raw.x, raw.y);

        if self.pointer.is_down(PointerButton::Left) {
            match self.pointer.active {
                Some(EntityRef::Handle(slot)) => self.drag_handle(slot, delta),
                Some(EntityRef::Image(id)) => {
                    let draggable = self.images.get(id).is_some_and(|image| image.draggable);
                    if draggable && self.move_image(id, delta.x, delta.y).is_err() {
                        self.pointer.active = None;
                    }
                }
                None => {}
            }
        }

        self.fire_active(PointerEventType::Move, &event);
    }

    pub fn pointer_up(&mut self, raw: RawPointerEvent) {
        let event = self.pointer.handle_up(raw);
        let mut ended_drag = false;
        if raw.button == PointerButton::Left
            && let Some(snapshot) = self.controller.end_drag()
        {
            tracing::debug!(handle = snapshot.slot.name(), "handle drag finished");
            ended_drag = true;
        }
        let travelled = self
            .down_position
            .take()
            .is_some_and(|start| start.distance(event.position) > CLICK_SLOP);
        self.suppress_click = ended_drag || travelled;
        self.fire_active(PointerEventType::Up, &event);
    }

    /// Left click selects the image under the pointer, replacing the
    /// current selection, or clears the selection over empty canvas.
    /// A click that ends a drag changes nothing.
    pub fn pointer_click(&mut self, raw: RawPointerEvent) {
        let event = self.pointer.handle_click(raw);
        let after_drag = std::mem::take(&mut self.suppress_click);

        if raw.button == PointerButton::Left && !after_drag {
            match self.pick(raw.x, raw.y) {
                Some(EntityRef::Image(id))
                    if !self.images.is_selected(id) || self.images.selected().len() > 1 =>
                {
                    self.release_selection();
                    if let Err(err) = self.images.select(id, &mut self.controller) {
                        tracing::warn!(%err, "click selection failed");
                    }
                }
                Some(_) => {}
                None => self.release_selection(),
            }
        }

        self.fire_active(PointerEventType::Click, &event);
    }

    pub fn pointer_context_menu(&mut self, raw: RawPointerEvent) {
        let event = self.pointer.handle_context_menu(raw);
        self.fire_active(PointerEventType::ContextMenu, &event);
    }

    /// Background, images in creation order, then the handle overlay.
    pub fn draw_frame<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        render::draw_background(surface, self.config.background);
        self.images.draw(surface);
        if let Some(image) = self.controller.target().and_then(|id| self.images.get(id)) {
            self.controller.draw(surface, image);
        }
    }

    fn begin_handle_drag(&mut self, slot: HandleSlot) {
        let Some(image) = self.controller.target().and_then(|id| self.images.get(id)) else {
            return;
        };
        if let Err(err) = self.controller.begin_drag(slot, image) {
            tracing::warn!(%err, "handle drag not started");
        }
    }

    fn drag_handle(&mut self, slot: HandleSlot, delta: Vector2) {
        let Some(image) = self.controller.target().and_then(|id| self.images.get_mut(id)) else {
            return;
        };
        if let Err(err) = self.controller.drag_handle(slot, delta.x, delta.y, image) {
            tracing::warn!(%err, "ignoring handle drag");
        }
    }

    fn release_selection(&mut self) {
        if let Err(err) = self.images.deselect(Deselect::All, &mut self.controller) {
            tracing::warn!(%err, "deselect failed");
        }
    }

    fn forget(&mut self, id: EntityId) {
        let image = Some(EntityRef::Image(id));
        if self.pointer.hover == image {
            self.pointer.hover = None;
        }
        if self.pointer.active == image {
            self.pointer.active = None;
        }
    }

    /// Runs the per-entity hook of the entity that received the last down.
    fn fire_active(&self, kind: PointerEventType, event: &PointerEvent) {
        let entity = match self.pointer.active {
            Some(EntityRef::Image(id)) => self.images.get(id),
            Some(EntityRef::Handle(slot)) => Some(self.controller.handle(slot)),
            None => None,
        };
        if let Some(entity) = entity.filter(|e| e.interactive) {
            entity.hooks.fire_pointer(entity.id, kind, event);
        }
    }
}
