//! The backing component tree.
//!
//! One component record exists per rendered vnode position: the in-memory
//! shadow of the host tree the reconciler walks when diffing. Host positions
//! own their host node; component-function positions own their output child
//! list and a cached list of the top-level host nodes reachable through it
//! (the *dom roots*; a function component may contribute zero or many host
//! nodes).
//!
//! A single process-wide empty component stands in for every position that
//! renders nothing, so absent positions never allocate.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::context::ContextProvider;
use crate::dom;
use crate::hooks::HookState;
use crate::runtime::RootInner;
use crate::view::{Key, VNode};

pub(crate) type ComponentRef = Rc<ComponentInner>;

/// What occupies this tree position.
pub(crate) enum Rendered {
	/// Nothing (null / boolean content).
	Empty,
	/// A text node with the given data.
	Text(String),
	/// A vnode.
	Node(VNode),
}

pub(crate) struct ComponentInner {
	pub(crate) parent: RefCell<Weak<ComponentInner>>,
	pub(crate) root: RefCell<Weak<RootInner>>,
	/// Distance from the root component; flush order is ascending depth.
	pub(crate) depth: Cell<u32>,
	pub(crate) rendered: RefCell<Rendered>,
	/// The owned host node (host and text positions only).
	pub(crate) host: RefCell<Option<dom::Node>>,
	/// Child components: a host position's children, or a function
	/// position's rendered output list.
	pub(crate) children: RefCell<Vec<ComponentRef>>,
	/// Cached top-level host nodes this position contributes, in order.
	pub(crate) dom_roots: RefCell<SmallVec<[dom::Node; 1]>>,
	/// Lazily created on the first hook call; lives as long as the
	/// component.
	pub(crate) hooks: RefCell<Option<HookState>>,
	/// Set once by a provider component's body; visible to descendants.
	pub(crate) provider: RefCell<Option<ContextProvider>>,
	/// Inherited SVG-namespace flag.
	pub(crate) svg: Cell<bool>,
	pub(crate) unmounted: Cell<bool>,
	/// True while an update for this component sits in its root's queue.
	pub(crate) queued: Cell<bool>,
	is_empty_singleton: bool,
}

impl ComponentInner {
	pub(crate) fn new(rendered: Rendered) -> ComponentRef {
		Rc::new(ComponentInner {
			parent: RefCell::new(Weak::new()),
			root: RefCell::new(Weak::new()),
			depth: Cell::new(0),
			rendered: RefCell::new(rendered),
			host: RefCell::new(None),
			children: RefCell::new(Vec::new()),
			dom_roots: RefCell::new(SmallVec::new()),
			hooks: RefCell::new(None),
			provider: RefCell::new(None),
			svg: Cell::new(false),
			unmounted: Cell::new(false),
			queued: Cell::new(false),
			is_empty_singleton: false,
		})
	}

	/// The shared stand-in for positions that render nothing.
	pub(crate) fn is_empty_component(&self) -> bool {
		self.is_empty_singleton
	}

	/// The last vnode rendered here, when this position holds one.
	pub(crate) fn vnode(&self) -> Option<VNode> {
		match &*self.rendered.borrow() {
			Rendered::Node(vnode) => Some(vnode.clone()),
			_ => None,
		}
	}

	/// The sibling-matching key of the vnode rendered here.
	pub(crate) fn key(&self) -> Option<Key> {
		match &*self.rendered.borrow() {
			Rendered::Node(vnode) => vnode.key().cloned(),
			_ => None,
		}
	}

	pub(crate) fn parent(&self) -> Option<ComponentRef> {
		self.parent.borrow().upgrade()
	}

	pub(crate) fn root(&self) -> Option<Rc<RootInner>> {
		self.root.borrow().upgrade()
	}

	/// Attaches this component under `parent` in the backing tree. The
	/// empty singleton is shared and keeps no tree position.
	pub(crate) fn attach(self: &Rc<Self>, parent: Option<&ComponentRef>, root: &Rc<RootInner>) {
		if self.is_empty_singleton {
			return;
		}
		match parent {
			Some(parent) => {
				*self.parent.borrow_mut() = Rc::downgrade(parent);
				self.depth.set(parent.depth.get() + 1);
				self.svg.set(parent.svg.get());
			}
			None => {
				*self.parent.borrow_mut() = Weak::new();
				self.depth.set(0);
			}
		}
		*self.root.borrow_mut() = Rc::downgrade(root);
	}

	/// This position's dom roots, cloned.
	pub(crate) fn dom_roots(&self) -> SmallVec<[dom::Node; 1]> {
		self.dom_roots.borrow().clone()
	}

	/// Recomputes the dom-roots cache from the child list (positions with no
	/// host node of their own). Returns true when the list changed.
	pub(crate) fn refresh_dom_roots(&self) -> bool {
		let next: SmallVec<[dom::Node; 1]> = self
			.children
			.borrow()
			.iter()
			.flat_map(|child| child.dom_roots())
			.collect();
		let changed = {
			let current = self.dom_roots.borrow();
			current.len() != next.len()
				|| current
					.iter()
					.zip(next.iter())
					.any(|(a, b)| !a.same_node(b))
		};
		if changed {
			*self.dom_roots.borrow_mut() = next;
		}
		changed
	}
}

thread_local! {
	static EMPTY: ComponentRef = Rc::new(ComponentInner {
		parent: RefCell::new(Weak::new()),
		root: RefCell::new(Weak::new()),
		depth: Cell::new(0),
		rendered: RefCell::new(Rendered::Empty),
		host: RefCell::new(None),
		children: RefCell::new(Vec::new()),
		dom_roots: RefCell::new(SmallVec::new()),
		hooks: RefCell::new(None),
		provider: RefCell::new(None),
		svg: Cell::new(false),
		unmounted: Cell::new(false),
		queued: Cell::new(false),
		is_empty_singleton: true,
	});
}

/// The process-wide empty component.
pub(crate) fn empty_component() -> ComponentRef {
	EMPTY.with(Rc::clone)
}
