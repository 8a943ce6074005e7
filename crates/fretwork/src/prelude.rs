//! Commonly used types and functions, re-exported for glob import.
//!
//! ```ignore
//! use fretwork::prelude::*;
//! ```

pub use crate::children::to_child_array;
pub use crate::context::{create_context, use_context, Context};
pub use crate::deps;
pub use crate::dom::{Document, Element, Event, Node};
pub use crate::error::RenderError;
pub use crate::hooks::effect::{cleanup, use_effect, use_layout_effect};
pub use crate::hooks::memo::{use_callback, use_memo};
pub use crate::hooks::refs::{create_ref, use_ref, NodeRef, Ref};
pub use crate::hooks::{use_reducer, use_state, Dispatch, StateSetter};
pub use crate::props::{EventHandler, PropValue, Props};
pub use crate::runtime::{render, unmount_component_at_node};
pub use crate::testing::act;
pub use crate::view::{
	create_element, el, fragment, is_valid_element, memo, Component, Key, NodeKind, Render, VNode,
	View,
};
