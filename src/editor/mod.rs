//! # Editor Module
//!
//! Everything the user manipulates sits behind [`EditorSession`]: the scene,
//! the registry of interactive nodes, the current selection and its property
//! panel, pending asset loads and the scene-wide controls.
//!
//! The UI never mutates the scene directly. It returns [`EditorAction`]s that
//! the session applies after the frame's widgets have been built.

pub mod light_rig;
pub mod panel;
pub mod registry;
pub mod selection;
pub mod session;

pub use panel::{Control, Field, FieldId, FieldSpec, FieldValue, Folder, PanelKind, PropertyPanel};
pub use registry::{EntryKind, Registry, RegistryEntry, RegistryError};
pub use selection::Selection;
pub use session::{EditorAction, EditorSession, LoadingStatus, SceneControls};
