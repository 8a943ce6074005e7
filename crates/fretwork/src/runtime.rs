//! Per-container roots and the update/effect scheduler.
//!
//! Each host container owns at most one root: the last rendered base
//! component plus three queues: pending updates, pending layout effects,
//! pending post-commit effects. A hook setter, reducer dispatch, or context
//! notification schedules its component; the first entry into an empty
//! update queue arranges a deferred flush (a microtask on the browser;
//! nothing on native targets, where queues drain through `act` or an
//! explicit flush (the manual-flush model).
//!
//! Flush ordering: updates drain in a loop, closest-to-root first, with
//! updates scheduled mid-flush absorbed into the same drain; layout effects
//! flush synchronously after each drain iteration; post-commit effects run
//! after the host has painted. Any error left unhandled by the boundary walk
//! tears the root down at the end of the flush that produced it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::component::ComponentRef;
use crate::dom;
use crate::error::RenderError;
use crate::hooks::HookCell;
use crate::reconcile;
use crate::view::View;
use crate::{debug_log, info_log, warn_log};
#[cfg(target_arch = "wasm32")]
use crate::error_log;

pub(crate) struct RootInner {
	pub(crate) container: dom::Element,
	pub(crate) base: RefCell<Option<ComponentRef>>,
	pub(crate) pending_update: RefCell<Vec<ComponentRef>>,
	pub(crate) pending_layout: RefCell<Vec<ComponentRef>>,
	pub(crate) pending_effect: RefCell<Vec<ComponentRef>>,
	// Allow dead_code: the deferred-flush flags are only read on wasm32.
	#[allow(dead_code)]
	update_flush_scheduled: Cell<bool>,
	#[allow(dead_code)]
	effect_flush_scheduled: Cell<bool>,
	caught: RefCell<Option<RenderError>>,
}

impl RootInner {
	fn new(container: dom::Element) -> Rc<Self> {
		Rc::new(Self {
			container,
			base: RefCell::new(None),
			pending_update: RefCell::new(Vec::new()),
			pending_layout: RefCell::new(Vec::new()),
			pending_effect: RefCell::new(Vec::new()),
			update_flush_scheduled: Cell::new(false),
			effect_flush_scheduled: Cell::new(false),
			caught: RefCell::new(None),
		})
	}

	/// Records an unhandled error; only the first error per flush survives,
	/// to avoid cascades.
	pub(crate) fn record_error(&self, error: RenderError) {
		let mut caught = self.caught.borrow_mut();
		if caught.is_none() {
			*caught = Some(error);
		} else {
			warn_log!("suppressing subsequent render error: {}", error);
		}
	}

	pub(crate) fn has_pending_work(&self) -> bool {
		!self.pending_update.borrow().is_empty()
			|| !self.pending_layout.borrow().is_empty()
			|| !self.pending_effect.borrow().is_empty()
	}
}

thread_local! {
	static ROOTS: RefCell<Vec<Rc<RootInner>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn find_root(container: &dom::Element) -> Option<Rc<RootInner>> {
	ROOTS.with(|roots| {
		roots
			.borrow()
			.iter()
			.find(|root| root.container.node().same_node(&container.node()))
			.cloned()
	})
}

fn root_for(container: &dom::Element) -> Rc<RootInner> {
	if let Some(root) = find_root(container) {
		return root;
	}
	let root = RootInner::new(container.clone());
	ROOTS.with(|roots| roots.borrow_mut().push(Rc::clone(&root)));
	root
}

pub(crate) fn all_roots() -> Vec<Rc<RootInner>> {
	ROOTS.with(|roots| roots.borrow().clone())
}

fn deregister(root: &Rc<RootInner>) {
	ROOTS.with(|roots| {
		roots
			.borrow_mut()
			.retain(|registered| !Rc::ptr_eq(registered, root))
	});
}

/// Queues an update for `component`; arranges a deferred flush when the
/// queue transitions from empty.
pub(crate) fn schedule_update(root: &Rc<RootInner>, component: &ComponentRef) {
	if component.queued.replace(true) {
		return;
	}
	let was_empty = {
		let mut queue = root.pending_update.borrow_mut();
		let was_empty = queue.is_empty();
		queue.push(Rc::clone(component));
		was_empty
	};
	if was_empty {
		defer_update_flush(root);
	}
}

/// Queues a component's pending effect callbacks for the given phase.
/// Layout effects never install a deferred flush; they drain synchronously
/// at the end of each render or update flush.
pub(crate) fn schedule_effect(root: &Rc<RootInner>, component: &ComponentRef, layout: bool) {
	let queue = if layout {
		&root.pending_layout
	} else {
		&root.pending_effect
	};
	let was_empty = {
		let mut queue = queue.borrow_mut();
		let was_empty = queue.is_empty();
		if !queue.iter().any(|queued| Rc::ptr_eq(queued, component)) {
			queue.push(Rc::clone(component));
		}
		was_empty
	};
	if !layout && was_empty {
		defer_effect_flush(root);
	}
}

/// Cancels every queued entry for an unmounting component.
pub(crate) fn drop_from_queues(root: &Rc<RootInner>, component: &ComponentRef) {
	root.pending_update
		.borrow_mut()
		.retain(|queued| !Rc::ptr_eq(queued, component));
	root.pending_layout
		.borrow_mut()
		.retain(|queued| !Rc::ptr_eq(queued, component));
	root.pending_effect
		.borrow_mut()
		.retain(|queued| !Rc::ptr_eq(queued, component));
}

#[cfg(target_arch = "wasm32")]
fn defer_update_flush(root: &Rc<RootInner>) {
	if crate::testing::act_active() || root.update_flush_scheduled.replace(true) {
		return;
	}
	let root = Rc::clone(root);
	dom::schedule_microtask(move || {
		root.update_flush_scheduled.set(false);
		flush_updates(&root);
		if let Err(error) = handle_root_error(&root) {
			error_log!("uncaught render error: {}", error);
		}
	});
}

#[cfg(not(target_arch = "wasm32"))]
fn defer_update_flush(_root: &Rc<RootInner>) {
	// No deferred callbacks on native targets; queues drain through `act`
	// or an explicit flush.
}

#[cfg(target_arch = "wasm32")]
fn defer_effect_flush(root: &Rc<RootInner>) {
	if crate::testing::act_active() || root.effect_flush_scheduled.replace(true) {
		return;
	}
	let root = Rc::clone(root);
	dom::schedule_after_paint(move || {
		root.effect_flush_scheduled.set(false);
		flush_post_effects(&root);
		if let Err(error) = handle_root_error(&root) {
			error_log!("uncaught render error: {}", error);
		}
	});
}

#[cfg(not(target_arch = "wasm32"))]
fn defer_effect_flush(_root: &Rc<RootInner>) {}

/// Drains the update queue: closest-to-root first, re-diffing each still
/// pending component against its last vnode; updates scheduled mid-drain
/// extend the same drain. Layout effects flush after every iteration.
pub(crate) fn flush_updates(root: &Rc<RootInner>) {
	loop {
		let mut batch: Vec<ComponentRef> = root.pending_update.borrow_mut().split_off(0);
		if batch.is_empty() {
			break;
		}
		batch.sort_by_key(|component| component.depth.get());
		for component in batch {
			// An ancestor's re-render may have processed this component
			// already, or unmounted it.
			if !component.queued.get() || component.unmounted.get() {
				continue;
			}
			rerender_component(root, &component);
		}
		flush_layout_effects(root);
	}
}

fn rerender_component(root: &Rc<RootInner>, component: &ComponentRef) {
	let Some(vnode) = component.vnode() else {
		component.queued.set(false);
		return;
	};
	debug_log!("re-rendering component at depth {}", component.depth.get());
	let (host_parent, mut insert_after) = insertion_context(root, component);
	let parent = component.parent();
	let result = reconcile::diff_child(
		root,
		parent.as_ref(),
		Some(Rc::clone(component)),
		&View::Node(vnode),
		&host_parent,
		&mut insert_after,
	);
	if let Err(error) = result {
		reconcile::capture_error(component, error);
	}
}

/// Locates the host insertion point for a component re-rendered out of
/// band: the nearest previous sibling with a host contribution (walking up
/// through hostless ancestors), under the nearest ancestor host element or
/// the container.
fn insertion_context(
	root: &Rc<RootInner>,
	component: &ComponentRef,
) -> (dom::Element, Option<dom::Node>) {
	let mut after: Option<dom::Node> = None;
	let mut cursor = Rc::clone(component);
	loop {
		let Some(parent) = cursor.parent() else {
			return (root.container.clone(), after);
		};
		if after.is_none() {
			let siblings = parent.children.borrow();
			if let Some(index) = siblings.iter().position(|c| Rc::ptr_eq(c, &cursor)) {
				for sibling in siblings[..index].iter().rev() {
					if let Some(last) = sibling.dom_roots().last().cloned() {
						after = Some(last);
						break;
					}
				}
			}
		}
		if let Some(element) = parent.host.borrow().as_ref().and_then(dom::Node::as_element) {
			return (element, after);
		}
		cursor = parent;
	}
}

/// Runs every queued layout-effect callback, in insertion order per
/// component; layout effects scheduled by those callbacks drain in the same
/// call.
pub(crate) fn flush_layout_effects(root: &Rc<RootInner>) {
	loop {
		let batch: Vec<ComponentRef> = root.pending_layout.borrow_mut().split_off(0);
		if batch.is_empty() {
			break;
		}
		for component in batch {
			run_pending_effects(&component, true);
		}
	}
}

/// Runs every queued post-commit effect callback.
pub(crate) fn flush_post_effects(root: &Rc<RootInner>) {
	loop {
		let batch: Vec<ComponentRef> = root.pending_effect.borrow_mut().split_off(0);
		if batch.is_empty() {
			break;
		}
		for component in batch {
			run_pending_effects(&component, false);
		}
	}
}

/// Runs a component's pending effect bodies for one phase, in cell order,
/// storing returned cleanups. A failing body is routed through the boundary
/// walk and the remaining bodies still run.
fn run_pending_effects(component: &ComponentRef, layout: bool) {
	if component.unmounted.get() {
		return;
	}
	let mut index = 0;
	loop {
		let next_body = {
			let mut hooks = component.hooks.borrow_mut();
			let Some(state) = hooks.as_mut() else {
				return;
			};
			let mut found = None;
			while index < state.cells.len() {
				if let HookCell::Effect {
					layout: cell_layout,
					pending,
					..
				} = &mut state.cells[index]
				{
					if *cell_layout == layout && pending.is_some() {
						found = pending.take().map(|body| (index, body));
						index += 1;
						break;
					}
				}
				index += 1;
			}
			found
		};
		let Some((cell_index, body)) = next_body else {
			return;
		};
		match body() {
			Ok(returned) => {
				let mut hooks = component.hooks.borrow_mut();
				if let Some(state) = hooks.as_mut() {
					if let Some(HookCell::Effect { cleanup, .. }) = state.cells.get_mut(cell_index)
					{
						*cleanup = returned;
					}
				}
			}
			Err(error) => reconcile::capture_error(component, error),
		}
	}
}

/// Takes the root's unhandled error, if any: the root unmounts itself and
/// the error surfaces to the caller.
pub(crate) fn handle_root_error(root: &Rc<RootInner>) -> Result<(), RenderError> {
	let caught = root.caught.borrow_mut().take();
	match caught {
		Some(error) => {
			teardown_root(root);
			Err(error)
		}
		None => Ok(()),
	}
}

pub(crate) fn teardown_root(root: &Rc<RootInner>) {
	if let Some(base) = root.base.borrow_mut().take() {
		reconcile::unmount(&base, false);
	}
	root.pending_update.borrow_mut().clear();
	root.pending_layout.borrow_mut().clear();
	root.pending_effect.borrow_mut().clear();
	deregister(root);
}

/// Mounts or updates `view` in `container`. Idempotent by container:
/// repeated renders diff against the previous tree and mutate the host
/// minimally. Flushes layout effects synchronously before returning; does
/// not wait for post-commit effects.
///
/// An error left unhandled by every boundary unmounts the container's tree
/// and surfaces here.
pub fn render(view: impl Into<View>, container: &dom::Element) -> Result<(), RenderError> {
	let view = view.into();
	let root = root_for(container);
	if let Err(error) = reconcile::render_into_root(&root, &view) {
		teardown_root(&root);
		return Err(error);
	}
	flush_layout_effects(&root);
	handle_root_error(&root)
}

/// Unmounts the tree rendered into `container`, running every pending
/// cleanup. Returns true iff a root existed.
pub fn unmount_component_at_node(container: &dom::Element) -> bool {
	let Some(root) = find_root(container) else {
		return false;
	};
	info_log!("unmounting container root");
	teardown_root(&root);
	true
}
