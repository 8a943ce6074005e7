//! Browser host bindings for the `wasm32` target.
//!
//! Thin wrappers over `web-sys` with the same surface as the in-memory host,
//! plus the two deferred-execution primitives the scheduler needs: a
//! microtask (for batched updates) and an after-paint callback (for
//! post-commit effects; animation frame with a short timeout fallback).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::RenderError;
use crate::props::EventHandler;

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Property name under which an element's listener-registry id is stashed.
const LISTENER_ID_PROP: &str = "__fretworkListeners";

/// A host event delivered to listeners.
#[derive(Clone, Debug)]
pub struct Event {
	inner: web_sys::Event,
}

impl Event {
	/// The event type.
	pub fn event_type(&self) -> String {
		self.inner.type_()
	}

	/// The underlying browser event.
	pub fn raw(&self) -> &web_sys::Event {
		&self.inner
	}
}

impl From<web_sys::Event> for Event {
	fn from(inner: web_sys::Event) -> Self {
		Self { inner }
	}
}

struct WebListener {
	event: String,
	capture: bool,
	closure: Closure<dyn FnMut(web_sys::Event)>,
}

thread_local! {
	static LISTENERS: RefCell<HashMap<u32, Vec<WebListener>>> = RefCell::new(HashMap::new());
	static NEXT_LISTENER_ID: Cell<u32> = const { Cell::new(1) };
}

/// The owner document; creates nodes.
#[derive(Clone)]
pub struct Document {
	inner: web_sys::Document,
}

impl Document {
	/// The window's document.
	pub fn global() -> Option<Document> {
		web_sys::window()
			.and_then(|w| w.document())
			.map(|inner| Document { inner })
	}

	/// Creates a detached element. `svg` selects the SVG namespace.
	pub fn create_element(&self, tag: &str, svg: bool) -> Element {
		let inner = if svg {
			self.inner
				.create_element_ns(Some(SVG_NAMESPACE), tag)
				.unwrap_or_else(|_| {
					wasm_bindgen::throw_str(&format!("failed to create <{}> in SVG namespace", tag))
				})
		} else {
			self.inner.create_element(tag).unwrap_or_else(|_| {
				wasm_bindgen::throw_str(&format!("failed to create <{}>", tag))
			})
		};
		Element { inner }
	}

	/// Creates a detached text node.
	pub fn create_text(&self, data: &str) -> Text {
		Text {
			inner: self.inner.create_text_node(data),
		}
	}

	/// True when both handles reference the same document.
	pub fn same_document(&self, other: &Document) -> bool {
		self.inner
			.is_same_node(Some(other.inner.unchecked_ref::<web_sys::Node>()))
	}
}

impl From<web_sys::Document> for Document {
	fn from(inner: web_sys::Document) -> Self {
		Self { inner }
	}
}

/// A handle to any host node.
#[derive(Clone, Debug)]
pub struct Node {
	inner: web_sys::Node,
}

impl Node {
	/// Host-node identity.
	pub fn same_node(&self, other: &Node) -> bool {
		self.inner.is_same_node(Some(&other.inner))
	}

	/// The parent element, when attached.
	pub fn parent_element(&self) -> Option<Element> {
		self.inner.parent_element().map(|inner| Element { inner })
	}

	/// Detaches this node from its parent, if any.
	pub fn remove_from_parent(&self) {
		if let Some(parent) = self.inner.parent_node() {
			let _ = parent.remove_child(&self.inner);
		}
	}

	/// This node as an element, when it is one.
	pub fn as_element(&self) -> Option<Element> {
		self.inner
			.dyn_ref::<web_sys::Element>()
			.map(|el| Element { inner: el.clone() })
	}

	/// This node as a text node, when it is one.
	pub fn as_text(&self) -> Option<Text> {
		self.inner
			.dyn_ref::<web_sys::Text>()
			.map(|t| Text { inner: t.clone() })
	}

	/// The owner document.
	pub fn owner_document(&self) -> Document {
		Document {
			inner: self
				.inner
				.owner_document()
				.unwrap_or_else(|| wasm_bindgen::throw_str("node has no owner document")),
		}
	}

	/// The concatenated text content of this subtree.
	pub fn text_content(&self) -> String {
		self.inner.text_content().unwrap_or_default()
	}
}

/// A host element.
#[derive(Clone, Debug)]
pub struct Element {
	inner: web_sys::Element,
}

impl Element {
	/// The underlying node handle.
	pub fn node(&self) -> Node {
		Node {
			inner: self.inner.clone().unchecked_into::<web_sys::Node>(),
		}
	}

	/// The element tag, lowercased.
	pub fn tag(&self) -> String {
		self.inner.tag_name().to_ascii_lowercase()
	}

	/// Whether the element lives in the SVG namespace.
	pub fn is_svg(&self) -> bool {
		self.inner.namespace_uri().as_deref() == Some(SVG_NAMESPACE)
	}

	/// The owner document.
	pub fn owner_document(&self) -> Document {
		self.node().owner_document()
	}

	/// Inserts `child` directly after `reference` (or first when `reference`
	/// is `None`). No-op when the child already sits in that exact position.
	pub fn insert_after(&self, child: &Node, reference: Option<&Node>) {
		let before = match reference {
			Some(r) => r.inner.next_sibling(),
			None => self.inner.first_child(),
		};
		if let Some(before) = &before {
			if before.is_same_node(Some(&child.inner)) {
				return;
			}
		} else if child
			.inner
			.parent_node()
			.is_some_and(|p| p.is_same_node(Some(self.inner.unchecked_ref())))
			&& child.inner.next_sibling().is_none()
		{
			return;
		}
		let _ = self
			.inner
			.insert_before(&child.inner, before.as_ref());
	}

	/// The element's child nodes, in order.
	pub fn child_nodes(&self) -> Vec<Node> {
		let list = self.inner.child_nodes();
		(0..list.length())
			.filter_map(|i| list.item(i))
			.map(|inner| Node { inner })
			.collect()
	}

	/// Sets an attribute.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), RenderError> {
		self.inner.set_attribute(name, value).map_err(|_| {
			RenderError::new(format!("failed to set attribute '{}' on <{}>", name, self.tag()))
		})
	}

	/// Removes an attribute, if present.
	pub fn remove_attribute(&self, name: &str) {
		let _ = self.inner.remove_attribute(name);
	}

	/// Reads an attribute value.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.inner.get_attribute(name)
	}

	fn listener_id(&self) -> u32 {
		let current = js_sys::Reflect::get(&self.inner, &JsValue::from_str(LISTENER_ID_PROP))
			.ok()
			.and_then(|v| v.as_f64());
		match current {
			Some(id) => id as u32,
			None => {
				let id = NEXT_LISTENER_ID.with(|n| {
					let id = n.get();
					n.set(id + 1);
					id
				});
				let _ = js_sys::Reflect::set(
					&self.inner,
					&JsValue::from_str(LISTENER_ID_PROP),
					&JsValue::from_f64(id as f64),
				);
				id
			}
		}
	}

	/// Registers an event listener.
	pub fn add_listener(&self, event: &str, capture: bool, handler: EventHandler) {
		let closure = Closure::wrap(Box::new(move |raw: web_sys::Event| {
			handler.call(&Event::from(raw));
		}) as Box<dyn FnMut(web_sys::Event)>);
		let _ = self
			.inner
			.add_event_listener_with_callback_and_bool(
				event,
				closure.as_ref().unchecked_ref(),
				capture,
			);
		let id = self.listener_id();
		LISTENERS.with(|listeners| {
			listeners.borrow_mut().entry(id).or_default().push(WebListener {
				event: event.to_string(),
				capture,
				closure,
			});
		});
	}

	/// Removes the listener registered for `(event, capture)`, if any.
	pub fn remove_listener(&self, event: &str, capture: bool) {
		let id = self.listener_id();
		LISTENERS.with(|listeners| {
			let mut listeners = listeners.borrow_mut();
			let Some(entries) = listeners.get_mut(&id) else {
				return;
			};
			if let Some(pos) = entries
				.iter()
				.position(|l| l.event == event && l.capture == capture)
			{
				let listener = entries.remove(pos);
				let _ = self.inner.remove_event_listener_with_callback_and_bool(
					event,
					listener.closure.as_ref().unchecked_ref(),
					capture,
				);
			}
		});
	}

	/// Drops every listener on this element.
	pub fn clear_listeners(&self) {
		let id = self.listener_id();
		LISTENERS.with(|listeners| {
			if let Some(entries) = listeners.borrow_mut().remove(&id) {
				for listener in entries {
					let _ = self.inner.remove_event_listener_with_callback_and_bool(
						&listener.event,
						listener.closure.as_ref().unchecked_ref(),
						listener.capture,
					);
				}
			}
		});
	}

	/// The serialized markup of this element including itself.
	pub fn outer_html(&self) -> String {
		self.inner.outer_html()
	}

	/// The serialized markup of this element's children.
	pub fn inner_html(&self) -> String {
		self.inner.inner_html()
	}

	/// The concatenated text content of this subtree.
	pub fn text_content(&self) -> String {
		self.node().text_content()
	}
}

impl From<web_sys::Element> for Element {
	fn from(inner: web_sys::Element) -> Self {
		Self { inner }
	}
}

/// A host text node.
#[derive(Clone, Debug)]
pub struct Text {
	inner: web_sys::Text,
}

impl Text {
	/// The underlying node handle.
	pub fn node(&self) -> Node {
		Node {
			inner: self.inner.clone().unchecked_into::<web_sys::Node>(),
		}
	}

	/// The text data.
	pub fn data(&self) -> String {
		self.inner.data()
	}

	/// Replaces the text data.
	pub fn set_data(&self, data: &str) {
		self.inner.set_data(data);
	}
}

/// Runs `f` after the current call stack unwinds.
pub(crate) fn schedule_microtask(f: impl FnOnce() + 'static) {
	wasm_bindgen_futures::spawn_local(async move { f() });
}

/// Runs `f` once after the host has had a chance to paint: an animation
/// frame callback with a short timeout fallback, whichever fires first.
pub(crate) fn schedule_after_paint(f: impl FnOnce() + 'static) {
	let fired = Rc::new(Cell::new(false));
	let boxed: Box<dyn FnOnce()> = Box::new(f);
	let callback = Rc::new(RefCell::new(Some(boxed)));

	let make_arm = |fired: Rc<Cell<bool>>, callback: Rc<RefCell<Option<Box<dyn FnOnce()>>>>| {
		Closure::once_into_js(move || {
			if fired.replace(true) {
				return;
			}
			if let Some(f) = callback.borrow_mut().take() {
				f();
			}
		})
	};

	let Some(window) = web_sys::window() else {
		// No window (worker context): fall back to a plain microtask.
		return schedule_microtask(move || {
			if let Some(f) = callback.borrow_mut().take() {
				f();
			}
		});
	};

	let raf_arm = make_arm(Rc::clone(&fired), Rc::clone(&callback));
	let timeout_arm = make_arm(fired, callback);

	let _ = window.request_animation_frame(raf_arm.unchecked_ref());
	let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
		timeout_arm.unchecked_ref(),
		35,
	);
}
