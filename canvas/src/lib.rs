//! Document engine for the mindboard diagram editor.
//!
//! The crate owns everything between raw pointer input and the document a
//! renderer draws: the node/annotation/shape model, snapshot undo/redo, the
//! screen/world camera, geometric hit-testing and the drag state machine.
//! Rendering and DOM wiring live in the host; they read state through
//! [`engine::EngineCore`] and react to the [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Pointer/wheel handling on top of the editor |
//! | [`editor`] | Mutations, selection and undo/redo over a [`doc::Document`] |
//! | [`doc`] | Nodes, annotations, shapes and their sparse patches |
//! | [`selection`] | Tagged selection across entity kinds |
//! | [`history`] | Generic snapshot undo/redo stacks |
//! | [`persist`] | Import/export and the persisted-state storage backends |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`geometry`] | Rotation, polygons, text wrapping and node radii |
//! | [`hit`] | Hit-testing against document entities |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`config`] | Environment-driven engine configuration |
//! | [`consts`] | Shared numeric constants (zoom limits, clamp ranges, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod editor;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod persist;
pub mod selection;
