//! Props bags and the values they carry.
//!
//! A [`Props`] is a string-keyed bag of [`PropValue`]s. Two reserved names
//! exist: `children` (the renderable content of the vnode) and `ref` (a
//! [`NodeRef`] the reconciler fills with the mounted host node). Everything
//! else is host-level (attributes, properties, `on*` event listeners) or
//! user-level (read by a component function).
//!
//! Prop comparison uses identity semantics: strings and numbers by value,
//! handlers, refs, and child lists by reference. This is what makes
//! [`Props::shallow_eq`] a meaningful bail-out check for memoized components.

use std::collections::HashMap;
use std::rc::Rc;

use crate::context::Context;
use crate::dom::Event;
use crate::error::RenderError;
use crate::hooks::refs::NodeRef;
use crate::view::View;

/// A cloneable event handler with stable identity.
///
/// Wraps the callback in an `Rc`, making it cheaply cloneable while keeping a
/// reference that compares equal across renders when the caller reuses it.
#[derive(Clone)]
pub struct EventHandler {
	inner: Rc<dyn Fn(&Event)>,
}

impl EventHandler {
	/// Creates a new handler from a function or closure.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Invokes the handler.
	pub fn call(&self, event: &Event) {
		(self.inner)(event)
	}

	/// Returns true when both handlers wrap the same callback.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl std::fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventHandler")
			.field("inner", &"<function>")
			.finish()
	}
}

/// A boundary error handler with stable identity.
///
/// Carried by the `handler` prop of an error boundary vnode. The handler may
/// itself fail; in that case the replacement error continues the ancestor
/// walk at the boundary's parent.
#[derive(Clone)]
pub struct ErrorHandler {
	inner: Rc<dyn Fn(&RenderError) -> Result<(), RenderError>>,
}

impl ErrorHandler {
	/// Creates a handler that cannot fail.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&RenderError) + 'static,
	{
		Self {
			inner: Rc::new(move |err| {
				f(err);
				Ok(())
			}),
		}
	}

	/// Creates a handler that may replace the error with one of its own.
	pub fn fallible<F>(f: F) -> Self
	where
		F: Fn(&RenderError) -> Result<(), RenderError> + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	/// Invokes the handler.
	pub fn call(&self, error: &RenderError) -> Result<(), RenderError> {
		(self.inner)(error)
	}

	/// Returns true when both handlers wrap the same callback.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl std::fmt::Debug for ErrorHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ErrorHandler")
			.field("inner", &"<function>")
			.finish()
	}
}

/// A single prop value.
#[derive(Clone, Debug)]
pub enum PropValue {
	/// Absent / cleared value. Clears the attribute it targets.
	Null,
	/// Boolean attribute or flag.
	Bool(bool),
	/// Numeric value (attributes are set with its display form).
	Num(f64),
	/// String value.
	Str(String),
	/// Event listener (`on*` props).
	Handler(EventHandler),
	/// Boundary error handler (`handler` prop of an error boundary).
	ErrorHandler(ErrorHandler),
	/// Host-node ref (`ref` prop).
	NodeRef(NodeRef),
	/// Renderable content (`children` and node-valued props).
	Nodes(Rc<Vec<View>>),
	/// A context handle (used by provider components).
	Ctx(Context),
}

impl PropValue {
	/// Identity comparison: numbers by bits, strings by value, reference
	/// values by pointer.
	pub fn same(&self, other: &PropValue) -> bool {
		match (self, other) {
			(PropValue::Null, PropValue::Null) => true,
			(PropValue::Bool(a), PropValue::Bool(b)) => a == b,
			(PropValue::Num(a), PropValue::Num(b)) => a.to_bits() == b.to_bits(),
			(PropValue::Str(a), PropValue::Str(b)) => a == b,
			(PropValue::Handler(a), PropValue::Handler(b)) => a.ptr_eq(b),
			(PropValue::ErrorHandler(a), PropValue::ErrorHandler(b)) => a.ptr_eq(b),
			(PropValue::NodeRef(a), PropValue::NodeRef(b)) => a.ptr_eq(b),
			(PropValue::Nodes(a), PropValue::Nodes(b)) => Rc::ptr_eq(a, b),
			(PropValue::Ctx(a), PropValue::Ctx(b)) => a.id() == b.id(),
			_ => false,
		}
	}

	/// The value rendered into an attribute, if it has one.
	///
	/// `Null` and `false` mean "remove the attribute"; `true` is the empty
	/// attribute; handlers, refs, and node lists have no attribute form.
	pub(crate) fn attribute_text(&self) -> Option<String> {
		match self {
			PropValue::Bool(true) => Some(String::new()),
			PropValue::Num(n) => Some(format!("{}", n)),
			PropValue::Str(s) => Some(s.clone()),
			_ => None,
		}
	}
}

impl From<bool> for PropValue {
	fn from(v: bool) -> Self {
		PropValue::Bool(v)
	}
}

impl From<f64> for PropValue {
	fn from(v: f64) -> Self {
		PropValue::Num(v)
	}
}

impl From<i32> for PropValue {
	fn from(v: i32) -> Self {
		PropValue::Num(v as f64)
	}
}

impl From<&str> for PropValue {
	fn from(v: &str) -> Self {
		PropValue::Str(v.to_string())
	}
}

impl From<String> for PropValue {
	fn from(v: String) -> Self {
		PropValue::Str(v)
	}
}

impl From<EventHandler> for PropValue {
	fn from(v: EventHandler) -> Self {
		PropValue::Handler(v)
	}
}

impl From<NodeRef> for PropValue {
	fn from(v: NodeRef) -> Self {
		PropValue::NodeRef(v)
	}
}

impl From<Vec<View>> for PropValue {
	fn from(v: Vec<View>) -> Self {
		PropValue::Nodes(Rc::new(v))
	}
}

/// A string-keyed bag of prop values.
#[derive(Clone, Debug, Default)]
pub struct Props {
	map: HashMap<String, PropValue>,
}

impl Props {
	/// Creates an empty props bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a prop value (builder form).
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.map.insert(name.into(), value.into());
		self
	}

	/// Sets an event listener prop (builder form).
	///
	/// The name is the full prop name, e.g. `onClick` or `onFocusCapture`.
	pub fn on<F>(self, name: impl Into<String>, f: F) -> Self
	where
		F: Fn(&Event) + 'static,
	{
		self.attr(name, PropValue::Handler(EventHandler::new(f)))
	}

	/// Sets the boundary error handler prop (builder form).
	pub fn catch<F>(mut self, f: F) -> Self
	where
		F: Fn(&RenderError) + 'static,
	{
		self.map.insert(
			"handler".to_string(),
			PropValue::ErrorHandler(ErrorHandler::new(f)),
		);
		self
	}

	/// Sets the `ref` prop (builder form).
	pub fn node_ref(mut self, r: NodeRef) -> Self {
		self.map.insert("ref".to_string(), PropValue::NodeRef(r));
		self
	}

	/// Sets a prop value in place.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
		self.map.insert(name.into(), value.into());
	}

	/// Removes a prop value, returning it.
	pub fn remove(&mut self, name: &str) -> Option<PropValue> {
		self.map.remove(name)
	}

	/// Reads a prop value.
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.map.get(name)
	}

	/// Returns true when the key is present, even with a `Null` value.
	pub fn contains(&self, name: &str) -> bool {
		self.map.contains_key(name)
	}

	/// The `children` prop as a slice, empty when absent.
	pub fn children(&self) -> &[View] {
		match self.map.get("children") {
			Some(PropValue::Nodes(nodes)) => nodes,
			_ => &[],
		}
	}

	/// The `ref` prop, when present.
	pub fn node_ref_prop(&self) -> Option<&NodeRef> {
		match self.map.get("ref") {
			Some(PropValue::NodeRef(r)) => Some(r),
			_ => None,
		}
	}

	/// The boundary `handler` prop, when present.
	pub(crate) fn error_handler(&self) -> Option<&ErrorHandler> {
		match self.map.get("handler") {
			Some(PropValue::ErrorHandler(h)) => Some(h),
			_ => None,
		}
	}

	/// Iterates prop names and values in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.map.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Number of props.
	pub fn len(&self) -> usize {
		self.map.len()
	}

	/// True when no props are present.
	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}

	/// Shallow equality: same keys, pairwise-identical values.
	pub fn shallow_eq(&self, other: &Props) -> bool {
		if self.map.len() != other.map.len() {
			return false;
		}
		self.map
			.iter()
			.all(|(k, v)| other.map.get(k).is_some_and(|o| v.same(o)))
	}
}
