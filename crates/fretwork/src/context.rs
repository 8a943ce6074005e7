//! Context: passing values down the tree without threading them through
//! props.
//!
//! [`create_context`] returns a [`Context`] handle with a process-unique id
//! and a default value. Its provider is an ordinary component that owns a
//! [`ContextProvider`] value holder (created once, through a ref) and
//! registers it on its backing component, where descendant consumers find it
//! by walking their ancestor chain. Setting a provider's value to a
//! non-identical one notifies each subscribed consumer, which schedules a
//! re-render of just that consumer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::component::ComponentRef;
use crate::hooks::refs::use_ref;
use crate::hooks::{current_component, with_cell, CellKind, HookCell};
use crate::props::{PropValue, Props};
use crate::view::{create_element, Component, NodeKind, Render, View};

/// Global counter for generating unique context ids.
static CONTEXT_ID_COUNTER: AtomicUsize = AtomicUsize::new(1);

struct ContextData {
	id: usize,
	default: PropValue,
}

/// A context handle: identity plus the default value consumers fall back to
/// when no provider sits above them.
#[derive(Clone)]
pub struct Context {
	inner: Rc<ContextData>,
}

impl Context {
	/// The context's process-unique id.
	pub fn id(&self) -> usize {
		self.inner.id
	}

	/// The value consumers read when no provider is found.
	pub fn default_value(&self) -> &PropValue {
		&self.inner.default
	}

	/// Builds a provider vnode carrying `value` for this context.
	///
	/// The `value` prop wins even when it is [`PropValue::Null`]; use
	/// [`Context::provider_default`] to fall back to the default value.
	pub fn provider(&self, value: impl Into<PropValue>, children: Vec<View>) -> View {
		create_element(
			self.provider_kind(),
			self.provider_props().attr("value", value),
			View::List(children),
		)
	}

	/// Builds a provider vnode without a `value` prop; consumers read the
	/// context's default value.
	pub fn provider_default(&self, children: Vec<View>) -> View {
		create_element(self.provider_kind(), self.provider_props(), View::List(children))
	}

	fn provider_kind(&self) -> NodeKind {
		// The context id tags the component so providers of different
		// contexts are distinct vnode types.
		NodeKind::Component(Component::with_tag("Provider", provider_render, self.id()))
	}

	fn provider_props(&self) -> Props {
		Props::new().attr("__ctx", PropValue::Ctx(self.clone()))
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context").field("id", &self.inner.id).finish()
	}
}

/// Creates a context with the given default value.
pub fn create_context(default: impl Into<PropValue>) -> Context {
	Context {
		inner: Rc::new(ContextData {
			id: CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
			default: default.into(),
		}),
	}
}

type Subscriber = Rc<dyn Fn()>;

struct ProviderInner {
	context_id: usize,
	value: RefCell<PropValue>,
	subscribers: RefCell<Vec<(u64, Subscriber)>>,
	next_subscriber: Cell<u64>,
}

/// A provider's value holder plus its consumer subscription list.
#[derive(Clone)]
pub(crate) struct ContextProvider {
	inner: Rc<ProviderInner>,
}

impl ContextProvider {
	pub(crate) fn new(context_id: usize, value: PropValue) -> Self {
		Self {
			inner: Rc::new(ProviderInner {
				context_id,
				value: RefCell::new(value),
				subscribers: RefCell::new(Vec::new()),
				next_subscriber: Cell::new(1),
			}),
		}
	}

	pub(crate) fn context_id(&self) -> usize {
		self.inner.context_id
	}

	pub(crate) fn value(&self) -> PropValue {
		self.inner.value.borrow().clone()
	}

	/// Stores a new value; on identity change, notifies a snapshot of the
	/// subscriber list (subscribers may unsubscribe while being notified).
	pub(crate) fn set_value(&self, value: PropValue) {
		if self.inner.value.borrow().same(&value) {
			return;
		}
		*self.inner.value.borrow_mut() = value;
		let snapshot: Vec<Subscriber> = self
			.inner
			.subscribers
			.borrow()
			.iter()
			.map(|(_, subscriber)| Rc::clone(subscriber))
			.collect();
		for subscriber in snapshot {
			subscriber();
		}
	}

	pub(crate) fn subscribe(&self, subscriber: Subscriber) -> u64 {
		let id = self.inner.next_subscriber.get();
		self.inner.next_subscriber.set(id + 1);
		self.inner.subscribers.borrow_mut().push((id, subscriber));
		id
	}

	pub(crate) fn unsubscribe(&self, id: u64) {
		self.inner
			.subscribers
			.borrow_mut()
			.retain(|(sub_id, _)| *sub_id != id);
	}

	#[cfg(test)]
	pub(crate) fn subscriber_count(&self) -> usize {
		self.inner.subscribers.borrow().len()
	}
}

/// The provider component body: owns the [`ContextProvider`] through a ref
/// created on first render, registers it on its backing component, and
/// renders its children transparently.
fn provider_render(props: &Props) -> Render {
	let Some(PropValue::Ctx(context)) = props.get("__ctx") else {
		return Err("context provider rendered without its context".into());
	};
	let value = if props.contains("value") {
		props.get("value").cloned().unwrap_or(PropValue::Null)
	} else {
		context.default_value().clone()
	};

	let holder = use_ref(|| None::<ContextProvider>);
	let existing = holder.get();
	match existing {
		Some(provider) => provider.set_value(value),
		None => {
			let provider = ContextProvider::new(context.id(), value);
			let component = current_component();
			*component.provider.borrow_mut() = Some(provider.clone());
			holder.set(Some(provider));
		}
	}

	Ok(View::List(props.children().to_vec()))
}

/// Finds the nearest ancestor provider for `context_id`, starting above
/// `component` (a provider's own body reads the outer value).
fn find_provider(component: &ComponentRef, context_id: usize) -> Option<ContextProvider> {
	let mut cursor = component.parent();
	while let Some(current) = cursor {
		if let Some(provider) = current.provider.borrow().as_ref() {
			if provider.context_id() == context_id {
				return Some(provider.clone());
			}
		}
		cursor = current.parent();
	}
	None
}

/// Reads the nearest provider's current value for `context`, subscribing
/// the calling component to value changes; falls back to the context's
/// default when no provider is found.
///
/// The first call walks the ancestor chain and subscribes; later renders
/// reuse the found provider without re-walking. The subscription is dropped
/// when the component unmounts.
pub fn use_context(context: &Context) -> PropValue {
	let context_id = context.id();
	let default = context.default_value().clone();
	let value = with_cell(CellKind::Context, move |cell, component| match cell {
		HookCell::Context { provider, .. } => provider.as_ref().map(|p| p.value()),
		vacant => {
			let provider = find_provider(component, context_id);
			let subscription = provider.as_ref().map(|p| {
				let weak = Rc::downgrade(component);
				p.subscribe(Rc::new(move || {
					let Some(component) = weak.upgrade() else {
						return;
					};
					if component.unmounted.get() {
						return;
					}
					if let Some(root) = component.root() {
						crate::runtime::schedule_update(&root, &component);
					}
				}))
			});
			let value = provider.as_ref().map(|p| p.value());
			*vacant = HookCell::Context {
				provider,
				subscription,
			};
			value
		}
	});
	value.unwrap_or(default)
}
