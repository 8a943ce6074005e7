//! The vnode model: immutable descriptions of what to render.
//!
//! A [`View`] is any renderable content: a vnode, text, a number, a boolean,
//! nothing, or a nestable list of these. Booleans and [`View::Empty`] render
//! nothing and occupy no child slot. A [`VNode`] is an immutable record of a
//! node to render: a [`NodeKind`] (host tag, component function, fragment, or
//! error boundary), a props bag, and an optional key for sibling matching.
//!
//! Vnodes are reference-counted; the reconciler treats pointer-identical
//! vnodes as unchanged, which is what makes caller-side memoization of
//! subtrees (a `use_memo`-returned vnode) skip whole diffs.

use std::rc::Rc;

use crate::error::RenderError;
use crate::props::{PropValue, Props};

/// The result of a component function: renderable output or an error that
/// propagates to the nearest error boundary.
pub type Render = Result<View, RenderError>;

/// How a memoized component decides to skip a re-render.
#[derive(Clone, Copy, Debug, PartialEq)]
enum MemoMode {
	Off,
	Shallow,
	Custom(fn(&Props, &Props) -> bool),
}

/// A component: a plain function from props to renderable output.
///
/// Identity is the function pointer; two vnodes have the same component type
/// exactly when they reference the same function (and the same memo
/// wrapping). A type change at a tree position unmounts and remounts.
#[derive(Clone, Copy)]
pub struct Component {
	name: &'static str,
	render: fn(&Props) -> Render,
	memo: MemoMode,
	/// Discriminator for generated component families (context providers);
	/// zero for ordinary components.
	tag: usize,
}

impl Component {
	/// Wraps a function as a component.
	pub fn new(name: &'static str, render: fn(&Props) -> Render) -> Self {
		Self {
			name,
			render,
			memo: MemoMode::Off,
			tag: 0,
		}
	}

	pub(crate) fn with_tag(name: &'static str, render: fn(&Props) -> Render, tag: usize) -> Self {
		Self {
			name,
			render,
			memo: MemoMode::Off,
			tag,
		}
	}

	/// The component's display name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn invoke(&self, props: &Props) -> Render {
		(self.render)(props)
	}

	/// Whether a re-render with `next` props may be skipped given `prev`.
	pub(crate) fn memo_skips(&self, prev: &Props, next: &Props) -> bool {
		match self.memo {
			MemoMode::Off => false,
			MemoMode::Shallow => prev.shallow_eq(next),
			MemoMode::Custom(eq) => eq(prev, next),
		}
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		self.render as usize == other.render as usize
			&& self.memo == other.memo
			&& self.tag == other.tag
	}
}

impl std::fmt::Debug for Component {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Component").field("name", &self.name).finish()
	}
}

/// Wraps a component so a re-render is skipped when the new props are
/// shallow-equal to the previous render's props.
pub fn memo(component: Component) -> Component {
	Component {
		memo: MemoMode::Shallow,
		..component
	}
}

/// Like [`memo`], with a custom props comparison. The comparison returns
/// true when the re-render may be skipped.
pub fn memo_with(component: Component, eq: fn(&Props, &Props) -> bool) -> Component {
	Component {
		memo: MemoMode::Custom(eq),
		..component
	}
}

/// What a vnode renders as.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	/// Renders its children transparently.
	Fragment,
	/// Renders its children transparently and intercepts descendant errors
	/// through its `handler` prop.
	ErrorBoundary,
	/// A host element of the given tag.
	Host(String),
	/// A component function.
	Component(Component),
}

impl From<&str> for NodeKind {
	fn from(tag: &str) -> Self {
		NodeKind::Host(tag.to_string())
	}
}

impl From<String> for NodeKind {
	fn from(tag: String) -> Self {
		NodeKind::Host(tag)
	}
}

impl From<Component> for NodeKind {
	fn from(component: Component) -> Self {
		NodeKind::Component(component)
	}
}

/// A sibling-matching discriminator.
#[derive(Clone, Debug)]
pub enum Key {
	/// String key.
	Str(String),
	/// Numeric key (compared bitwise).
	Num(f64),
}

impl PartialEq for Key {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Key::Str(a), Key::Str(b)) => a == b,
			(Key::Num(a), Key::Num(b)) => a.to_bits() == b.to_bits(),
			_ => false,
		}
	}
}

impl From<&str> for Key {
	fn from(s: &str) -> Self {
		Key::Str(s.to_string())
	}
}

impl From<String> for Key {
	fn from(s: String) -> Self {
		Key::Str(s)
	}
}

impl From<i32> for Key {
	fn from(n: i32) -> Self {
		Key::Num(n as f64)
	}
}

impl From<f64> for Key {
	fn from(n: f64) -> Self {
		Key::Num(n)
	}
}

struct VNodeData {
	kind: NodeKind,
	props: Props,
	key: Option<Key>,
}

/// An immutable vnode record. Cheap to clone; identity-comparable.
#[derive(Clone)]
pub struct VNode {
	data: Rc<VNodeData>,
}

impl VNode {
	fn new(kind: NodeKind, props: Props, key: Option<Key>) -> Self {
		Self {
			data: Rc::new(VNodeData { kind, props, key }),
		}
	}

	/// The node kind.
	pub fn kind(&self) -> &NodeKind {
		&self.data.kind
	}

	/// The props bag.
	pub fn props(&self) -> &Props {
		&self.data.props
	}

	/// The sibling-matching key, if any.
	pub fn key(&self) -> Option<&Key> {
		self.data.key.as_ref()
	}

	/// True when both handles reference the same vnode record.
	pub fn ptr_eq(&self, other: &VNode) -> bool {
		Rc::ptr_eq(&self.data, &other.data)
	}
}

impl std::fmt::Debug for VNode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VNode")
			.field("kind", &self.data.kind)
			.field("key", &self.data.key)
			.finish()
	}
}

/// Renderable content.
#[derive(Clone, Debug)]
pub enum View {
	/// A vnode.
	Node(VNode),
	/// A text node.
	Text(String),
	/// A numeric text node (interchangeable with text of the same display
	/// form).
	Number(f64),
	/// Renders nothing and occupies no child slot.
	Bool(bool),
	/// Renders nothing and occupies no child slot.
	Empty,
	/// An ordered sequence of renderable content, flattened at use.
	List(Vec<View>),
}

impl View {
	/// True when this content renders nothing (no host position).
	pub fn is_empty_content(&self) -> bool {
		matches!(self, View::Empty | View::Bool(_))
	}

	/// The vnode behind this view, if it is one.
	pub fn as_node(&self) -> Option<&VNode> {
		match self {
			View::Node(vnode) => Some(vnode),
			_ => None,
		}
	}
}

impl From<VNode> for View {
	fn from(vnode: VNode) -> Self {
		View::Node(vnode)
	}
}

impl From<&str> for View {
	fn from(text: &str) -> Self {
		View::Text(text.to_string())
	}
}

impl From<String> for View {
	fn from(text: String) -> Self {
		View::Text(text)
	}
}

impl From<f64> for View {
	fn from(n: f64) -> Self {
		View::Number(n)
	}
}

impl From<i32> for View {
	fn from(n: i32) -> Self {
		View::Number(n as f64)
	}
}

impl From<bool> for View {
	fn from(b: bool) -> Self {
		View::Bool(b)
	}
}

impl From<Vec<View>> for View {
	fn from(children: Vec<View>) -> Self {
		View::List(children)
	}
}

impl<T: Into<View>> From<Option<T>> for View {
	fn from(v: Option<T>) -> Self {
		match v {
			Some(v) => v.into(),
			None => View::Empty,
		}
	}
}

/// Builds a vnode.
///
/// `children` becomes the `children` prop: a single renderable is stored
/// verbatim, a list is the ordered child sequence. A `key` prop is lifted
/// onto the vnode and removed from the bag; `ref` stays in props where the
/// reconciler reads it.
pub fn create_element(
	kind: impl Into<NodeKind>,
	props: impl Into<Option<Props>>,
	children: impl Into<View>,
) -> View {
	let mut props = props.into().unwrap_or_default();
	let children = children.into();
	match children {
		View::Empty => {}
		View::List(list) => props.insert("children", PropValue::Nodes(Rc::new(list))),
		single => props.insert("children", PropValue::Nodes(Rc::new(vec![single]))),
	}
	let key = lift_key(&mut props);
	View::Node(VNode::new(kind.into(), props, key))
}

/// Shorthand for [`create_element`].
pub fn el(kind: impl Into<NodeKind>, props: impl Into<Option<Props>>, children: impl Into<View>) -> View {
	create_element(kind, props, children)
}

/// Builds a fragment vnode rendering its children transparently.
pub fn fragment(children: Vec<View>) -> View {
	create_element(NodeKind::Fragment, None, View::List(children))
}

/// Factory variant taking the key separately; `children` travels inside
/// `props` under the `children` key.
pub fn jsx(kind: impl Into<NodeKind>, mut props: Props, key: Option<Key>) -> View {
	let lifted = lift_key(&mut props);
	View::Node(VNode::new(kind.into(), props, key.or(lifted)))
}

/// Debug-factory variant: accepts and ignores source-location arguments.
pub fn jsx_dev(
	kind: impl Into<NodeKind>,
	props: Props,
	key: Option<Key>,
	_source: Option<&'static str>,
	_self_ref: Option<&'static str>,
) -> View {
	jsx(kind, props, key)
}

/// True iff the content is a vnode (as opposed to text, numbers, or
/// nothing).
pub fn is_valid_element(view: &View) -> bool {
	matches!(view, View::Node(_))
}

fn lift_key(props: &mut Props) -> Option<Key> {
	match props.remove("key") {
		Some(PropValue::Str(s)) => Some(Key::Str(s)),
		Some(PropValue::Num(n)) => Some(Key::Num(n)),
		Some(_) | None => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn noop(_props: &Props) -> Render {
		Ok(View::Empty)
	}

	fn noop2(_props: &Props) -> Render {
		Ok(View::Empty)
	}

	#[test]
	fn test_create_element_lifts_key() {
		let view = create_element("li", Props::new().attr("key", "a"), View::Empty);
		let node = view.as_node().unwrap();
		assert_eq!(node.key(), Some(&Key::Str("a".to_string())));
		assert!(!node.props().contains("key"));
	}

	#[test]
	fn test_create_element_keeps_ref_in_props() {
		let r = crate::hooks::refs::create_ref();
		let view = create_element("div", Props::new().node_ref(r.clone()), View::Empty);
		let node = view.as_node().unwrap();
		assert!(node.props().node_ref_prop().is_some_and(|p| p.ptr_eq(&r)));
	}

	#[test]
	fn test_create_element_single_child_verbatim() {
		let view = create_element("div", None, View::from("hello"));
		let node = view.as_node().unwrap();
		assert_eq!(node.props().children().len(), 1);
	}

	#[test]
	fn test_create_element_child_list() {
		let view = create_element(
			"ul",
			None,
			vec![View::from("a"), View::from("b"), View::from("c")],
		);
		let node = view.as_node().unwrap();
		assert_eq!(node.props().children().len(), 3);
	}

	#[test]
	fn test_create_element_null_props() {
		let view = create_element("div", None, View::Empty);
		let node = view.as_node().unwrap();
		assert!(node.props().is_empty());
	}

	#[test]
	fn test_is_valid_element() {
		assert!(is_valid_element(&create_element("div", None, View::Empty)));
		assert!(!is_valid_element(&View::Text("div".to_string())));
		assert!(!is_valid_element(&View::Empty));
		assert!(!is_valid_element(&View::Bool(true)));
	}

	#[test]
	fn test_component_identity() {
		let a = Component::new("Noop", noop);
		let b = Component::new("Noop", noop);
		let c = Component::new("Noop2", noop2);

		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_ne!(a, memo(a));
		assert_eq!(memo(a), memo(b));
	}

	#[test]
	fn test_memo_skips_shallow_equal_props() {
		let plain = Component::new("Noop", noop);
		let wrapped = memo(plain);

		let prev = Props::new().attr("x", 1);
		let next = Props::new().attr("x", 1);
		let changed = Props::new().attr("x", 2);

		assert!(!plain.memo_skips(&prev, &next));
		assert!(wrapped.memo_skips(&prev, &next));
		assert!(!wrapped.memo_skips(&prev, &changed));
	}

	#[test]
	fn test_key_equality() {
		assert_eq!(Key::from("a"), Key::from("a"));
		assert_ne!(Key::from("a"), Key::from("b"));
		assert_eq!(Key::from(1), Key::from(1));
		assert_ne!(Key::from(1), Key::from("1"));
	}

	#[test]
	fn test_vnode_ptr_eq() {
		let view = create_element("div", None, View::Empty);
		let node = view.as_node().unwrap();
		let clone = node.clone();
		let other = create_element("div", None, View::Empty);

		assert!(node.ptr_eq(&clone));
		assert!(!node.ptr_eq(other.as_node().unwrap()));
	}

	#[test]
	fn test_view_from_option() {
		assert!(matches!(View::from(None::<VNode>), View::Empty));
		assert!(is_valid_element(&View::from(Some(
			create_element("p", None, View::Empty).as_node().unwrap().clone()
		))));
	}
}
