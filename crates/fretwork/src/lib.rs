//! Fretwork - A Small Declarative UI Library
//!
//! Fretwork renders immutable vnode trees into a host DOM by diffing each
//! new tree against the previously rendered one and issuing the minimum
//! host mutations. Components are plain functions over props; per-component
//! state lives in index-ordered hook cells; a per-container root batches
//! state changes and runs effects in two phases around host presentation.
//!
//! ## Architecture
//!
//! - [`view`]: immutable vnode model and the element factory
//! - [`props`]: prop bags with identity-comparison semantics
//! - [`dom`]: the narrow host adapter (browser DOM on `wasm32`, an
//!   in-memory host document elsewhere)
//! - [`hooks`]: ordered hook cells (state, reducer, ref, memo, callback,
//!   effect, context)
//! - [`context`]: provider/consumer value passing without prop threading
//! - [`runtime`]: per-container roots, batched updates, effect phases
//! - [`testing`]: the `act` flush helper and test-library access points
//!
//! ## Example
//!
//! ```ignore
//! use fretwork::prelude::*;
//!
//! fn counter(_props: &Props) -> Render {
//! 	let (count, set_count) = use_state(|| 0);
//! 	Ok(el(
//! 		"button",
//! 		Props::new().on("onClick", move |_| set_count.update(|c| c + 1)),
//! 		View::from(count),
//! 	))
//! }
//!
//! let container = Document::new().create_element("div", false);
//! render(el(Component::new("Counter", counter), None, View::Empty), &container)?;
//! ```

#![warn(missing_docs)]

// Core model
pub mod children;
pub mod props;
pub mod view;

// Host adapter
pub mod dom;

// Hook machinery and context
pub mod context;
pub mod hooks;

// Reconciler and scheduler
mod component;
mod reconcile;
pub mod runtime;

// Test-mode flushing
pub mod testing;

// Ambient concerns
pub mod error;
pub mod logging;

pub mod prelude;

pub use children::to_child_array;
pub use context::{create_context, use_context, Context};
pub use error::RenderError;
pub use hooks::effect::{cleanup, try_cleanup, use_effect, use_layout_effect};
pub use hooks::memo::{use_callback, use_memo};
pub use hooks::refs::{create_ref, use_ref, NodeRef, Ref};
pub use hooks::{
	deps_eq, use_reducer, use_reducer_with_init, use_state, CleanupFn, Dispatch, EffectResult,
	IntoEffectResult, StateSetter,
};
pub use props::{ErrorHandler, EventHandler, PropValue, Props};
pub use runtime::{render, unmount_component_at_node};
pub use testing::{act, act_async};
pub use view::{
	create_element, el, fragment, is_valid_element, jsx, jsx_dev, memo, memo_with, Component, Key,
	NodeKind, Render, VNode, View,
};
