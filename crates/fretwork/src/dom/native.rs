//! In-memory host document for non-WASM targets.
//!
//! A miniature DOM: elements with attributes, listeners, and ordered
//! children; text nodes; event dispatch; HTML serialization. The test suite
//! asserts against [`Element::outer_html`] and drives handlers through
//! [`Element::dispatch`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::RenderError;
use crate::props::EventHandler;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
	"track", "wbr",
];

/// A host event delivered to listeners.
#[derive(Clone, Debug, Default)]
pub struct Event {
	event_type: String,
}

impl Event {
	/// Creates an event of the given type (e.g. `click`).
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
		}
	}

	/// The event type.
	pub fn event_type(&self) -> &str {
		&self.event_type
	}
}

struct Listener {
	event: String,
	capture: bool,
	handler: EventHandler,
}

struct ElementData {
	tag: String,
	svg: bool,
	attrs: RefCell<Vec<(String, String)>>,
	listeners: RefCell<Vec<Listener>>,
	children: RefCell<Vec<Node>>,
}

struct TextData {
	data: RefCell<String>,
}

enum NodeBody {
	Element(ElementData),
	Text(TextData),
}

struct NodeData {
	document: Rc<DocumentData>,
	parent: RefCell<Weak<NodeData>>,
	body: NodeBody,
}

struct DocumentData;

/// The owner document; creates nodes.
#[derive(Clone)]
pub struct Document {
	inner: Rc<DocumentData>,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates a fresh document.
	pub fn new() -> Self {
		Self {
			inner: Rc::new(DocumentData),
		}
	}

	/// Creates a detached element. `svg` selects the SVG namespace.
	pub fn create_element(&self, tag: &str, svg: bool) -> Element {
		Element {
			node: Node {
				inner: Rc::new(NodeData {
					document: Rc::clone(&self.inner),
					parent: RefCell::new(Weak::new()),
					body: NodeBody::Element(ElementData {
						tag: tag.to_string(),
						svg,
						attrs: RefCell::new(Vec::new()),
						listeners: RefCell::new(Vec::new()),
						children: RefCell::new(Vec::new()),
					}),
				}),
			},
		}
	}

	/// Creates a detached text node.
	pub fn create_text(&self, data: &str) -> Text {
		Text {
			node: Node {
				inner: Rc::new(NodeData {
					document: Rc::clone(&self.inner),
					parent: RefCell::new(Weak::new()),
					body: NodeBody::Text(TextData {
						data: RefCell::new(data.to_string()),
					}),
				}),
			},
		}
	}

	/// True when both handles reference the same document.
	pub fn same_document(&self, other: &Document) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

/// A handle to any host node.
#[derive(Clone)]
pub struct Node {
	inner: Rc<NodeData>,
}

impl Node {
	/// Host-node identity.
	pub fn same_node(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// The parent element, when attached.
	pub fn parent_element(&self) -> Option<Element> {
		self.inner.parent.borrow().upgrade().map(|inner| Element {
			node: Node { inner },
		})
	}

	/// Detaches this node from its parent, if any.
	pub fn remove_from_parent(&self) {
		if let Some(parent) = self.parent_element() {
			parent
				.element_data()
				.children
				.borrow_mut()
				.retain(|child| !child.same_node(self));
			*self.inner.parent.borrow_mut() = Weak::new();
		}
	}

	/// This node as an element, when it is one.
	pub fn as_element(&self) -> Option<Element> {
		match &self.inner.body {
			NodeBody::Element(_) => Some(Element { node: self.clone() }),
			NodeBody::Text(_) => None,
		}
	}

	/// This node as a text node, when it is one.
	pub fn as_text(&self) -> Option<Text> {
		match &self.inner.body {
			NodeBody::Text(_) => Some(Text { node: self.clone() }),
			NodeBody::Element(_) => None,
		}
	}

	/// The owner document.
	pub fn owner_document(&self) -> Document {
		Document {
			inner: Rc::clone(&self.inner.document),
		}
	}

	/// The concatenated text content of this subtree.
	pub fn text_content(&self) -> String {
		match &self.inner.body {
			NodeBody::Text(text) => text.data.borrow().clone(),
			NodeBody::Element(el) => el
				.children
				.borrow()
				.iter()
				.map(Node::text_content)
				.collect(),
		}
	}

	fn serialize(&self, out: &mut String) {
		match &self.inner.body {
			NodeBody::Text(text) => out.push_str(&escape_text(&text.data.borrow())),
			NodeBody::Element(el) => {
				out.push('<');
				out.push_str(&el.tag);
				let mut attrs: Vec<(String, String)> = el.attrs.borrow().clone();
				attrs.sort_by(|a, b| a.0.cmp(&b.0));
				for (name, value) in &attrs {
					out.push(' ');
					out.push_str(name);
					if !value.is_empty() {
						out.push_str("=\"");
						out.push_str(&escape_attr(value));
						out.push('"');
					}
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&el.tag.as_str()) {
					return;
				}
				for child in el.children.borrow().iter() {
					child.serialize(out);
				}
				out.push_str("</");
				out.push_str(&el.tag);
				out.push('>');
			}
		}
	}
}

impl std::fmt::Debug for Node {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.inner.body {
			NodeBody::Element(el) => f.debug_struct("Element").field("tag", &el.tag).finish(),
			NodeBody::Text(text) => f
				.debug_struct("Text")
				.field("data", &*text.data.borrow())
				.finish(),
		}
	}
}

/// A host element.
#[derive(Clone, Debug)]
pub struct Element {
	node: Node,
}

impl Element {
	fn element_data(&self) -> &ElementData {
		match &self.node.inner.body {
			NodeBody::Element(el) => el,
			NodeBody::Text(_) => unreachable!("Element handle over a text node"),
		}
	}

	/// The underlying node handle.
	pub fn node(&self) -> Node {
		self.node.clone()
	}

	/// The element tag.
	pub fn tag(&self) -> String {
		self.element_data().tag.clone()
	}

	/// Whether the element was created in the SVG namespace.
	pub fn is_svg(&self) -> bool {
		self.element_data().svg
	}

	/// The owner document.
	pub fn owner_document(&self) -> Document {
		self.node.owner_document()
	}

	/// Inserts `child` directly after `reference` (or first when `reference`
	/// is `None`). No-op when the child already sits in that exact position.
	pub fn insert_after(&self, child: &Node, reference: Option<&Node>) {
		let data = self.element_data();
		{
			let mut children = data.children.borrow_mut();
			let target = match reference {
				None => 0,
				Some(r) => children
					.iter()
					.position(|k| k.same_node(r))
					.map_or(children.len(), |i| i + 1),
			};
			if let Some(current) = children.iter().position(|k| k.same_node(child)) {
				if current == target || current + 1 == target {
					return;
				}
				children.remove(current);
				let adjusted = if current < target { target - 1 } else { target };
				children.insert(adjusted, child.clone());
				return;
			}
		}
		child.remove_from_parent();
		let mut children = data.children.borrow_mut();
		let target = match reference {
			None => 0,
			Some(r) => children
				.iter()
				.position(|k| k.same_node(r))
				.map_or(children.len(), |i| i + 1),
		};
		children.insert(target, child.clone());
		*child.inner.parent.borrow_mut() = Rc::downgrade(&self.node.inner);
	}

	/// The element's child nodes, in order.
	pub fn child_nodes(&self) -> Vec<Node> {
		self.element_data().children.borrow().clone()
	}

	/// Sets an attribute. The empty string serializes as a bare attribute.
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), RenderError> {
		let data = self.element_data();
		let mut attrs = data.attrs.borrow_mut();
		match attrs.iter_mut().find(|(n, _)| n == name) {
			Some(entry) => entry.1 = value.to_string(),
			None => attrs.push((name.to_string(), value.to_string())),
		}
		Ok(())
	}

	/// Removes an attribute, if present.
	pub fn remove_attribute(&self, name: &str) {
		self.element_data()
			.attrs
			.borrow_mut()
			.retain(|(n, _)| n != name);
	}

	/// Reads an attribute value.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.element_data()
			.attrs
			.borrow()
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, v)| v.clone())
	}

	/// Registers an event listener.
	pub fn add_listener(&self, event: &str, capture: bool, handler: EventHandler) {
		self.element_data().listeners.borrow_mut().push(Listener {
			event: event.to_string(),
			capture,
			handler,
		});
	}

	/// Removes the listener registered for `(event, capture)`, if any.
	pub fn remove_listener(&self, event: &str, capture: bool) {
		self.element_data()
			.listeners
			.borrow_mut()
			.retain(|l| !(l.event == event && l.capture == capture));
	}

	/// Drops every listener on this element.
	pub fn clear_listeners(&self) {
		self.element_data().listeners.borrow_mut().clear();
	}

	/// Delivers an event to this element's listeners (capture listeners
	/// first). The in-memory host does not propagate along the tree.
	pub fn dispatch(&self, event: &Event) {
		let matching: Vec<EventHandler> = {
			let listeners = self.element_data().listeners.borrow();
			let capture = listeners
				.iter()
				.filter(|l| l.event == event.event_type && l.capture)
				.map(|l| l.handler.clone());
			let bubble = listeners
				.iter()
				.filter(|l| l.event == event.event_type && !l.capture)
				.map(|l| l.handler.clone());
			capture.chain(bubble).collect()
		};
		for handler in matching {
			handler.call(event);
		}
	}

	/// Dispatches a `click` event.
	pub fn click(&self) {
		self.dispatch(&Event::new("click"));
	}

	/// The serialized markup of this element including itself.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		self.node.serialize(&mut out);
		out
	}

	/// The serialized markup of this element's children.
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		for child in self.element_data().children.borrow().iter() {
			child.serialize(&mut out);
		}
		out
	}

	/// The concatenated text content of this subtree.
	pub fn text_content(&self) -> String {
		self.node.text_content()
	}
}

/// A host text node.
#[derive(Clone, Debug)]
pub struct Text {
	node: Node,
}

impl Text {
	fn text_data(&self) -> &TextData {
		match &self.node.inner.body {
			NodeBody::Text(text) => text,
			NodeBody::Element(_) => unreachable!("Text handle over an element"),
		}
	}

	/// The underlying node handle.
	pub fn node(&self) -> Node {
		self.node.clone()
	}

	/// The text data.
	pub fn data(&self) -> String {
		self.text_data().data.borrow().clone()
	}

	/// Replaces the text data.
	pub fn set_data(&self, data: &str) {
		*self.text_data().data.borrow_mut() = data.to_string();
	}
}

fn escape_text(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			other => out.push(other),
		}
	}
	out
}

fn escape_attr(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			other => out.push(other),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;
	use std::rc::Rc;

	#[test]
	fn test_create_and_serialize() {
		let doc = Document::new();
		let div = doc.create_element("div", false);
		div.set_attribute("class", "box").unwrap();
		let text = doc.create_text("hi");
		div.insert_after(&text.node(), None);

		assert_eq!(div.outer_html(), "<div class=\"box\">hi</div>");
		assert_eq!(div.inner_html(), "hi");
	}

	#[test]
	fn test_text_escaping() {
		let doc = Document::new();
		let div = doc.create_element("div", false);
		let text = doc.create_text("a < b & c");
		div.insert_after(&text.node(), None);

		assert_eq!(div.inner_html(), "a &lt; b &amp; c");
	}

	#[test]
	fn test_void_element_serialization() {
		let doc = Document::new();
		let br = doc.create_element("br", false);
		assert_eq!(br.outer_html(), "<br>");
	}

	#[test]
	fn test_insert_after_ordering() {
		let doc = Document::new();
		let ul = doc.create_element("ul", false);
		let a = doc.create_element("li", false);
		let b = doc.create_element("li", false);
		let c = doc.create_element("li", false);

		ul.insert_after(&a.node(), None);
		ul.insert_after(&b.node(), Some(&a.node()));
		ul.insert_after(&c.node(), Some(&b.node()));
		assert_eq!(ul.inner_html(), "<li></li><li></li><li></li>");

		// Move c to the front.
		ul.insert_after(&c.node(), None);
		let kids = ul.child_nodes();
		assert!(kids[0].same_node(&c.node()));
		assert!(kids[1].same_node(&a.node()));
		assert!(kids[2].same_node(&b.node()));
	}

	#[test]
	fn test_insert_after_in_place_is_noop() {
		let doc = Document::new();
		let ul = doc.create_element("ul", false);
		let a = doc.create_element("li", false);
		let b = doc.create_element("li", false);
		ul.insert_after(&a.node(), None);
		ul.insert_after(&b.node(), Some(&a.node()));

		// Both already sit exactly where requested.
		ul.insert_after(&a.node(), None);
		ul.insert_after(&b.node(), Some(&a.node()));

		let kids = ul.child_nodes();
		assert_eq!(kids.len(), 2);
		assert!(kids[0].same_node(&a.node()));
		assert!(kids[1].same_node(&b.node()));
	}

	#[test]
	fn test_insert_moves_between_parents() {
		let doc = Document::new();
		let left = doc.create_element("div", false);
		let right = doc.create_element("div", false);
		let child = doc.create_element("span", false);

		left.insert_after(&child.node(), None);
		assert!(child.node().parent_element().unwrap().node().same_node(&left.node()));

		right.insert_after(&child.node(), None);
		assert!(left.child_nodes().is_empty());
		assert!(child.node().parent_element().unwrap().node().same_node(&right.node()));
	}

	#[test]
	fn test_remove_from_parent() {
		let doc = Document::new();
		let div = doc.create_element("div", false);
		let span = doc.create_element("span", false);
		div.insert_after(&span.node(), None);

		span.node().remove_from_parent();
		assert!(div.child_nodes().is_empty());
		assert!(span.node().parent_element().is_none());
	}

	#[test]
	fn test_dispatch_runs_capture_listeners_first() {
		let doc = Document::new();
		let button = doc.create_element("button", false);
		let order = Rc::new(RefCell::new(Vec::new()));

		button.add_listener("click", false, EventHandler::new({
			let order = Rc::clone(&order);
			move |_| order.borrow_mut().push("bubble")
		}));
		button.add_listener("click", true, EventHandler::new({
			let order = Rc::clone(&order);
			move |_| order.borrow_mut().push("capture")
		}));

		button.click();
		assert_eq!(*order.borrow(), vec!["capture", "bubble"]);
	}

	#[test]
	fn test_remove_listener() {
		let doc = Document::new();
		let button = doc.create_element("button", false);
		let count = Rc::new(Cell::new(0));

		button.add_listener("click", false, EventHandler::new({
			let count = Rc::clone(&count);
			move |_| count.set(count.get() + 1)
		}));
		button.click();
		button.remove_listener("click", false);
		button.click();

		assert_eq!(count.get(), 1);
	}

	#[test]
	fn test_attributes_serialize_sorted() {
		let doc = Document::new();
		let div = doc.create_element("div", false);
		div.set_attribute("id", "x").unwrap();
		div.set_attribute("class", "y").unwrap();

		assert_eq!(div.outer_html(), "<div class=\"y\" id=\"x\"></div>");
	}

	#[test]
	fn test_set_data() {
		let doc = Document::new();
		let text = doc.create_text("one");
		text.set_data("two");
		assert_eq!(text.data(), "two");
	}

	#[test]
	fn test_text_content() {
		let doc = Document::new();
		let div = doc.create_element("div", false);
		let span = doc.create_element("span", false);
		div.insert_after(&span.node(), None);
		span.insert_after(&doc.create_text("a").node(), None);
		div.insert_after(&doc.create_text("b").node(), Some(&span.node()));

		assert_eq!(div.text_content(), "ab");
	}
}
