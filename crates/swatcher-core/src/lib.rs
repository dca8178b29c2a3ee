//! Product Swatcher Core Library
//!
//! Platform-agnostic scene model and interaction logic for composing product
//! images from a background photo, overlay images and styled text.

pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod loader;
pub mod resize;
pub mod scene;
pub mod selection;
pub mod session;
pub mod shapes;

pub use camera::Viewport;
pub use config::SwatcherConfig;
pub use error::{LoadError, SceneError, SceneResult};
pub use input::{CursorHint, Gesture, GestureAction, GestureRouter, Key, KeyFocus, PointerEvent, PointerId};
pub use loader::{ImageSource, LoadCompletion, LoadSlot, LoadTicket, PendingLoad};
pub use scene::Scene;
pub use selection::{StyleAttr, StyleController};
pub use session::{Session, SessionEvent};
pub use shapes::{Drawable, DrawableId, DrawableKind, Tag};
