//! Host tree adapter.
//!
//! The reconciler consumes a narrow surface: create an element or text node,
//! set and clear properties, insert a node after a reference sibling, remove
//! a node, read the owner document. Everything else about the host is
//! opaque.
//!
//! On `wasm32` the adapter wraps the browser DOM through `web-sys`. On
//! native targets it is an in-memory host document with the same surface
//! plus serialization and event dispatch, so the full reconciler behavior is
//! observable in ordinary tests.
//!
//! The one behavioral guarantee callers rely on: [`Element::insert_after`]
//! is a no-op when the node is already in exactly that position. Moving a
//! node that does not need to move loses focus and fires mutation observers.

pub(crate) mod apply;

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(not(target_arch = "wasm32"))]
pub use native::{Document, Element, Event, Node, Text};

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::{Document, Element, Event, Node, Text};
#[cfg(target_arch = "wasm32")]
pub(crate) use web::{schedule_after_paint, schedule_microtask};
