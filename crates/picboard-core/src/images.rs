//! Image entities, their creation, and the selection set.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityArena, EntityId, EntityKind, ImageData};
use crate::error::{LoadFailure, SandboxError};
use crate::render::{self, RenderSurface};
use crate::transform::TransformController;
use crate::vector::Vector2;

/// Host-side handle of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(pub u32);

/// Where and how big a new image should be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub source: String,
    pub x: f64,
    pub y: f64,
    /// Defaults to the natural pixel width.
    pub width: Option<f64>,
    /// Defaults to the natural pixel height.
    pub height: Option<f64>,
    /// Defaults to the centre of the box.
    pub origin: Option<Vector2>,
}

impl ImageSpec {
    pub fn at(source: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            source: source.into(),
            x,
            y,
            width: None,
            height: None,
            origin: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = Some(Vector2::new(x, y));
        self
    }
}

/// What a loader hands back once the pixels are ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub drawable: DrawableId,
}

/// Asynchronous image resource loader.
pub trait ImageLoader {
    fn load(&self, uri: &str) -> impl Future<Output = Result<LoadedImage, LoadFailure>>;
}

/// An image waiting for its pixels. Dropping it abandons the image.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    spec: ImageSpec,
}

impl PendingImage {
    pub fn uri(&self) -> &str {
        &self.spec.source
    }

    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }
}

/// Image addressed by id or by position in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRef {
    Id(EntityId),
    Index(usize),
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Id(id) => write!(f, "id {id}"),
            ImageRef::Index(index) => write!(f, "index {index}"),
        }
    }
}

impl From<EntityId> for ImageRef {
    fn from(id: EntityId) -> Self {
        ImageRef::Id(id)
    }
}

/// Which selected images to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deselect {
    One(EntityId),
    Many(Vec<EntityId>),
    All,
}

/// How selected images are manipulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ManipulatorMode {
    /// Selected images are dragged directly; no handles.
    Move,
    /// Selected images are resized through the transform handles.
    #[default]
    Transform,
}

/// Owns every image entity in creation order plus the selection set.
#[derive(Debug, Default)]
pub struct ImageCollection {
    images: EntityArena,
    selected: BTreeSet<EntityId>,
    last_selected: Option<EntityId>,
    mode: ManipulatorMode,
}

impl ImageCollection {
    pub fn new(mode: ManipulatorMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// First half of image creation: nothing is inserted until
    /// [`complete`](Self::complete) runs with the load result.
    pub fn prepare(spec: ImageSpec) -> PendingImage {
        tracing::debug!(uri = %spec.source, "image load requested");
        PendingImage { spec }
    }

    /// Inserts the image for `pending` once its load has resolved.
    pub fn complete(
        &mut self,
        pending: PendingImage,
        loaded: Result<LoadedImage, LoadFailure>,
    ) -> Result<EntityId, SandboxError> {
        let PendingImage { spec } = pending;
        let loaded = match loaded {
            Ok(loaded) if loaded.pixel_width == 0 || loaded.pixel_height == 0 => {
                Err(LoadFailure::Empty {
                    width: loaded.pixel_width,
                    height: loaded.pixel_height,
                })
            }
            other => other,
        };
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(cause) => {
                tracing::warn!(uri = %spec.source, %cause, "image load failed");
                return Err(SandboxError::Load { uri: spec.source, cause });
            }
        };

        let width = spec.width.unwrap_or(f64::from(loaded.pixel_width));
        let height = spec.height.unwrap_or(f64::from(loaded.pixel_height));
        let origin = spec.origin.unwrap_or(Vector2::new(width / 2.0, height / 2.0));

        let kind = EntityKind::Image(ImageData {
            source: spec.source.clone(),
            drawable: loaded.drawable,
            natural_size: (loaded.pixel_width, loaded.pixel_height),
        });
        let image = Entity::new(kind, Vector2::new(spec.x, spec.y))
            .with_size(width, height)
            .with_origin(origin.x, origin.y)
            .with_name(spec.source.as_str());

        let id = self.images.insert(image);
        tracing::info!(image = %id, uri = %spec.source, width, height, "image created");
        Ok(id)
    }

    /// Loads and inserts in one step. Holds `&mut self` across the load, so
    /// hosts that share the collection use `prepare`/`complete` instead.
    pub async fn create<L: ImageLoader>(
        &mut self,
        spec: ImageSpec,
        loader: &L,
    ) -> Result<EntityId, SandboxError> {
        let pending = Self::prepare(spec);
        let loaded = loader.load(pending.uri()).await;
        self.complete(pending, loaded)
    }

    /// Adds an already-built entity on top.
    pub fn insert(&mut self, image: Entity) -> EntityId {
        self.images.insert(image)
    }

    fn resolve(&self, image: ImageRef) -> Result<EntityId, SandboxError> {
        let id = match image {
            ImageRef::Id(id) => self.images.contains(id).then_some(id),
            ImageRef::Index(index) => self.images.get_at(index).map(|e| e.id),
        };
        id.ok_or(SandboxError::NotFound(image))
    }

    /// Removes an image from the selection, the controller, and the list.
    pub fn delete(
        &mut self,
        image: ImageRef,
        controller: &mut TransformController,
    ) -> Result<Entity, SandboxError> {
        let id = self.resolve(image)?;

        self.selected.remove(&id);
        if self.last_selected == Some(id) {
            self.last_selected = None;
        }
        if controller.target() == Some(id) {
            controller.deselect();
        }

        let removed = self.images.remove(id).ok_or(SandboxError::NotFound(image))?;
        tracing::debug!(image = %id, "image deleted");
        Ok(removed)
    }

    /// Adds `id` to the selection. Outside move mode the image stops being
    /// directly draggable and the controller attaches to it.
    pub fn select(
        &mut self,
        id: EntityId,
        controller: &mut TransformController,
    ) -> Result<(), SandboxError> {
        let mode = self.mode;
        let image = self.images.get_mut(id).ok_or(SandboxError::NotFound(ImageRef::Id(id)))?;

        self.selected.insert(id);
        self.last_selected = Some(id);
        if mode != ManipulatorMode::Move {
            image.draggable = false;
            controller.select(image);
        }
        tracing::debug!(image = %id, ?mode, "image selected");
        Ok(())
    }

    /// Releases images from the selection and returns the ids that were
    /// actually selected.
    pub fn deselect(
        &mut self,
        which: Deselect,
        controller: &mut TransformController,
    ) -> Result<Vec<EntityId>, SandboxError> {
        let ids: Vec<EntityId> = match which {
            Deselect::One(id) => {
                if !self.images.contains(id) {
                    return Err(SandboxError::NotFound(ImageRef::Id(id)));
                }
                vec![id]
            }
            Deselect::Many(ids) => ids,
            Deselect::All => self.selected.iter().copied().collect(),
        };

        let mut released = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.selected.remove(&id) {
                continue;
            }
            if self.mode != ManipulatorMode::Move
                && let Some(image) = self.images.get_mut(id)
            {
                image.draggable = true;
            }
            if controller.target() == Some(id) {
                controller.deselect();
            }
            if self.last_selected == Some(id) {
                self.last_selected = None;
            }
            released.push(id);
        }

        if !released.is_empty() {
            tracing::debug!(count = released.len(), "images deselected");
        }
        Ok(released)
    }

    pub fn mode(&self) -> ManipulatorMode {
        self.mode
    }

    /// Switching to move mode hands the selection back to direct dragging;
    /// switching away attaches the controller to the latest selection.
    pub fn set_mode(&mut self, mode: ManipulatorMode, controller: &mut TransformController) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;

        let draggable = mode == ManipulatorMode::Move;
        for id in &self.selected {
            if let Some(image) = self.images.get_mut(*id) {
                image.draggable = draggable;
            }
        }

        match mode {
            ManipulatorMode::Move => {
                controller.deselect();
            }
            ManipulatorMode::Transform => {
                let latest = self.last_selected.or_else(|| self.selected.last().copied());
                if let Some(image) = latest.and_then(|id| self.images.get(id)) {
                    controller.select(image);
                }
            }
        }
        tracing::debug!(?mode, "manipulator mode changed");
    }

    pub fn selected(&self) -> &BTreeSet<EntityId> {
        &self.selected
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.images.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.images.get_mut(id)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entity> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<EntityId> {
        self.images.hit_test(x, y)
    }

    /// Blits every visible image, oldest first.
    pub fn draw<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        for image in self.images.iter() {
            render::draw_image(surface, image);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::test_utils::{DrawCall, RecordingSurface, StubLoader};

    fn collection_with(count: usize) -> (ImageCollection, Vec<EntityId>) {
        let loader = StubLoader::new().with_image("a.png", 100, 50);
        let mut images = ImageCollection::default();
        let ids = (0..count)
            .map(|i| {
                let x = 100.0 * f64::from(u32::try_from(i).unwrap());
                block_on(images.create(ImageSpec::at("a.png", x, 0.0), &loader)).unwrap()
            })
            .collect();
        (images, ids)
    }

    #[test]
    fn test_create_defaults_from_natural_size() {
        let (images, ids) = collection_with(1);
        let image = images.get(ids[0]).unwrap();

        assert_eq!(image.properties.width, 100.0);
        assert_eq!(image.properties.height, 50.0);
        assert_eq!(image.properties.origin, Vector2::new(50.0, 25.0));
        match &image.kind {
            EntityKind::Image(data) => {
                assert_eq!(data.source, "a.png");
                assert_eq!(data.natural_size, (100, 50));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_create_respects_explicit_geometry() {
        let loader = StubLoader::new().with_image("b.png", 640, 480);
        let mut images = ImageCollection::default();
        let spec = ImageSpec::at("b.png", 10.0, 20.0).with_size(64.0, 48.0).with_origin(0.0, 0.0);
        let id = block_on(images.create(spec, &loader)).unwrap();

        let image = images.get(id).unwrap();
        assert_eq!(image.properties.width, 64.0);
        assert_eq!(image.properties.origin, Vector2::ZERO);
        assert_eq!(image.position, Vector2::new(10.0, 20.0));
    }

    #[test]
    fn test_create_load_failure_carries_uri() {
        let loader = StubLoader::new();
        let mut images = ImageCollection::default();
        let spec = ImageSpec::at("missing.png", 0.0, 0.0);
        let err = block_on(images.create(spec, &loader)).unwrap_err();

        let SandboxError::Load { uri, cause } = err else {
            panic!("expected load error");
        };
        assert_eq!(uri, "missing.png");
        assert!(matches!(cause, LoadFailure::Resource(_)));
        assert!(images.is_empty());
    }

    #[test]
    fn test_complete_rejects_empty_image() {
        let mut images = ImageCollection::default();
        let pending = ImageCollection::prepare(ImageSpec::at("empty.png", 0.0, 0.0));
        let loaded = LoadedImage {
            pixel_width: 0,
            pixel_height: 10,
            drawable: DrawableId(1),
        };
        let err = images.complete(pending, Ok(loaded)).unwrap_err();
        assert!(matches!(
            err,
            SandboxError::Load {
                cause: LoadFailure::Empty { width: 0, height: 10 },
                ..
            }
        ));
    }

    #[test]
    fn test_dropped_pending_image_is_never_inserted() {
        let images = ImageCollection::default();
        let pending = ImageCollection::prepare(ImageSpec::at("a.png", 0.0, 0.0));
        assert_eq!(pending.uri(), "a.png");
        drop(pending);
        assert!(images.is_empty());
    }

    #[test]
    fn test_delete_selected_removes_from_list_and_selection() {
        let (mut images, ids) = collection_with(3);
        let mut controller = TransformController::default();
        images.select(ids[1], &mut controller).unwrap();
        assert_eq!(controller.target(), Some(ids[1]));

        let removed = images.delete(ImageRef::Id(ids[1]), &mut controller).unwrap();

        assert_eq!(removed.id, ids[1]);
        assert!(!images.is_selected(ids[1]));
        assert!(images.get(ids[1]).is_none());
        assert_eq!(images.len(), 2);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_delete_by_index_and_not_found() {
        let (mut images, ids) = collection_with(2);
        let mut controller = TransformController::default();

        let removed = images.delete(ImageRef::Index(0), &mut controller).unwrap();
        assert_eq!(removed.id, ids[0]);

        assert_eq!(
            images.delete(ImageRef::Index(5), &mut controller).unwrap_err(),
            SandboxError::NotFound(ImageRef::Index(5))
        );
        assert_eq!(
            images.delete(ImageRef::Id(ids[0]), &mut controller).unwrap_err(),
            SandboxError::NotFound(ImageRef::Id(ids[0]))
        );
    }

    #[test]
    fn test_select_toggles_draggable_in_transform_mode() {
        let (mut images, ids) = collection_with(2);
        let mut controller = TransformController::default();

        images.select(ids[0], &mut controller).unwrap();
        images.select(ids[0], &mut controller).unwrap();
        assert_eq!(images.selected().len(), 1);
        assert!(!images.get(ids[0]).unwrap().draggable);

        images.select(ids[1], &mut controller).unwrap();
        assert_eq!(controller.target(), Some(ids[1]));

        let released = images.deselect(Deselect::One(ids[1]), &mut controller).unwrap();
        assert_eq!(released, vec![ids[1]]);
        assert!(images.get(ids[1]).unwrap().draggable);
        assert!(!controller.is_active());

        let released = images.deselect(Deselect::All, &mut controller).unwrap();
        assert_eq!(released, vec![ids[0]]);
        assert!(images.selected().is_empty());
    }

    #[test]
    fn test_select_in_move_mode_leaves_controller_idle() {
        let (mut images, ids) = collection_with(1);
        let mut controller = TransformController::default();
        images.set_mode(ManipulatorMode::Move, &mut controller);

        images.select(ids[0], &mut controller).unwrap();
        assert!(images.is_selected(ids[0]));
        assert!(images.get(ids[0]).unwrap().draggable);
        assert!(!controller.is_active());

        images.set_mode(ManipulatorMode::Transform, &mut controller);
        assert_eq!(controller.target(), Some(ids[0]));
        assert!(!images.get(ids[0]).unwrap().draggable);

        images.set_mode(ManipulatorMode::Move, &mut controller);
        assert!(!controller.is_active());
        assert!(images.get(ids[0]).unwrap().draggable);
    }

    #[test]
    fn test_select_and_deselect_unknown_image() {
        let (mut images, ids) = collection_with(1);
        let mut controller = TransformController::default();
        let removed = images.delete(ImageRef::Id(ids[0]), &mut controller).unwrap();

        assert!(images.select(removed.id, &mut controller).is_err());
        assert!(images.deselect(Deselect::One(removed.id), &mut controller).is_err());
        // Many skips ids that are not selected
        let released = images.deselect(Deselect::Many(vec![removed.id]), &mut controller);
        assert!(released.unwrap().is_empty());
    }

    #[test]
    fn test_draw_in_creation_order() {
        let (images, _) = collection_with(3);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        images.draw(&mut surface);

        let xs: Vec<f64> = surface
            .calls
            .iter()
            .map(|call| match call {
                DrawCall::Image { rect, .. } => rect.x,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(xs, vec![-50.0, 50.0, 150.0]);
    }
}
