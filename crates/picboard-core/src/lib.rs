//! Picboard Core Library
//!
//! Image placement and transform-handle logic for a 2D canvas sandbox.
//!
//! Everything here is platform independent: drawing goes through
//! [`render::RenderSurface`], image bytes through [`images::ImageLoader`],
//! and pointer input arrives as [`pointer::RawPointerEvent`]s. The wasm
//! host lives in `picboard-client`.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod config;
pub mod entity;
pub mod error;
pub mod images;
pub mod pointer;
pub mod render;
pub mod sandbox;
pub mod transform;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_utils;

pub use color::Color;
pub use config::SandboxConfig;
pub use entity::{Entity, EntityArena, EntityHooks, EntityId, EntityKind, EntityProperties, Rect};
pub use error::{LoadFailure, SandboxError};
pub use images::{
    Deselect, DrawableId, ImageCollection, ImageLoader, ImageRef, ImageSpec, LoadedImage,
    ManipulatorMode, PendingImage,
};
pub use pointer::{
    ClickRecord, Cursor, EntityRef, PointerButton, PointerEvent, PointerEventType, PointerInput,
    RawPointerEvent,
};
pub use render::{Outline, RenderSurface, StrokeStyle};
pub use sandbox::{Sandbox, SandboxCommand};
pub use transform::{DragSnapshot, HandleSlot, ImageGeometry, TransformController};
pub use vector::Vector2;
