//! The diff/reconcile algorithm.
//!
//! A diff request carries the parent component, the existing component at
//! this position (if any), the new renderable content, the host parent
//! element, and the running `insert_after` cursor. Three arms:
//!
//! 1. **Bail-out**: the existing vnode is pointer-identical to the new one
//!    and no update is queued for the component.
//! 2. **Type match**: empty/text/host/fragment/boundary/component positions
//!    update in place; host positions apply a property diff and recurse with
//!    themselves as host parent; component positions re-invoke under their
//!    hook state and diff the output list.
//! 3. **Type mismatch**: the existing component unmounts and a fresh
//!    subtree renders in its place.
//!
//! Child matching is by key: the first unmatched previous sibling with an
//! equal key (where "no key" only matches "no key") is taken and diffed;
//! leftovers unmount. Every arm leaves `insert_after` pointing at the last
//! host node this position contributed, and the host adapter's
//! no-op-when-in-place insert keeps unmoved nodes untouched.
//!
//! Render-time errors travel as `Err` up the recursion; an error boundary
//! arm intercepts them and feeds its `handler` prop. Errors with no frame
//! below them (effect bodies, cleanups) walk the ancestor chain explicitly
//! through [`capture_error`].

use std::rc::Rc;

use crate::children::flatten_children;
use crate::component::{empty_component, ComponentInner, ComponentRef, Rendered};
use crate::dom;
use crate::dom::apply::apply_props;
use crate::error::RenderError;
use crate::error_log;
use crate::hooks::{CurrentGuard, HookCell};
use crate::props::Props;
use crate::runtime::RootInner;
use crate::view::{Component, Key, NodeKind, VNode, View};

/// Diffs one child position. Returns the (reused or fresh) component and
/// advances `insert_after` past its host contribution.
pub(crate) fn diff_child(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	existing: Option<ComponentRef>,
	new: &View,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> Result<ComponentRef, RenderError> {
	// A bare list at a child position renders as an implicit fragment.
	if let View::List(children) = new {
		let fragment = crate::view::fragment(children.clone());
		return diff_child(root, parent, existing, &fragment, host_parent, insert_after);
	}

	match existing {
		None => mount_view(root, parent, new, host_parent, insert_after),
		Some(component) => {
			if component.is_empty_component() {
				if new.is_empty_content() {
					return Ok(component);
				}
				return mount_view(root, parent, new, host_parent, insert_after);
			}
			match (component.vnode(), new) {
				// Empty target over a live component: remount below.
				(_, View::Empty | View::Bool(_)) => {
					unmount(&component, false);
					Ok(empty_component())
				}
				(None, View::Text(text)) => {
					update_text(&component, text);
					place_roots(host_parent, &component, insert_after);
					Ok(component)
				}
				(None, View::Number(n)) => {
					update_text(&component, &format!("{}", n));
					place_roots(host_parent, &component, insert_after);
					Ok(component)
				}
				(Some(old), View::Node(new_vnode)) => {
					// Identity fast path: shared subtrees skip the diff.
					if old.ptr_eq(new_vnode) && !component.queued.get() {
						place_roots(host_parent, &component, insert_after);
						return Ok(component);
					}
					match (old.kind(), new_vnode.kind()) {
						(NodeKind::Host(prev_tag), NodeKind::Host(tag)) if prev_tag == tag => {
							let result =
								diff_host(root, &component, &old, new_vnode, insert_after, host_parent);
							result.map(|()| component)
						}
						(NodeKind::Fragment, NodeKind::Fragment) => {
							diff_transparent(root, &component, new_vnode, host_parent, insert_after, false)
								.map(|()| component)
						}
						(NodeKind::ErrorBoundary, NodeKind::ErrorBoundary) => {
							diff_transparent(root, &component, new_vnode, host_parent, insert_after, true)
								.map(|()| component)
						}
						(NodeKind::Component(prev_fn), NodeKind::Component(next_fn))
							if prev_fn == next_fn =>
						{
							diff_component(
								root,
								&component,
								&old,
								new_vnode,
								*next_fn,
								host_parent,
								insert_after,
							)
							.map(|()| component)
						}
						_ => {
							unmount(&component, false);
							mount_view(root, parent, new, host_parent, insert_after)
						}
					}
				}
				// Text position replaced by a vnode, or vice versa.
				_ => {
					unmount(&component, false);
					mount_view(root, parent, new, host_parent, insert_after)
				}
			}
		}
	}
}

/// Matches and diffs an ordered child list against the previous sibling
/// components. Returns the accumulated next list plus the first error; on
/// error, unmatched previous siblings are retained (still mounted) so a
/// later render can pick them up.
pub(crate) fn diff_children(
	root: &Rc<RootInner>,
	parent: &ComponentRef,
	prev: Vec<ComponentRef>,
	new_children: Vec<View>,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> (Vec<ComponentRef>, Result<(), RenderError>) {
	let mut old: Vec<Option<ComponentRef>> = prev.into_iter().map(Some).collect();
	let mut next = Vec::with_capacity(new_children.len());
	let mut outcome = Ok(());

	for child in &new_children {
		let key = child.as_node().and_then(|vnode| vnode.key().cloned());
		let matched = old
			.iter()
			.position(|slot| {
				slot.as_ref()
					.is_some_and(|component| keys_match(&component.key(), &key))
			})
			.and_then(|index| old[index].take());

		match diff_child(root, Some(parent), matched, child, host_parent, insert_after) {
			Ok(component) => next.push(component),
			Err(error) => {
				outcome = Err(error);
				break;
			}
		}
	}

	if outcome.is_ok() {
		for leftover in old.into_iter().flatten() {
			unmount(&leftover, false);
		}
	} else {
		next.extend(old.into_iter().flatten());
	}
	(next, outcome)
}

fn keys_match(a: &Option<Key>, b: &Option<Key>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => a == b,
		_ => false,
	}
}

/// Renders a fresh subtree for `view` and positions its host roots.
fn mount_view(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	view: &View,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> Result<ComponentRef, RenderError> {
	match view {
		View::Empty | View::Bool(_) => Ok(empty_component()),
		View::Text(text) => Ok(mount_text(root, parent, text, host_parent, insert_after)),
		View::Number(n) => Ok(mount_text(
			root,
			parent,
			&format!("{}", n),
			host_parent,
			insert_after,
		)),
		View::List(children) => {
			let fragment = crate::view::fragment(children.clone());
			mount_view(root, parent, &fragment, host_parent, insert_after)
		}
		View::Node(vnode) => match vnode.kind().clone() {
			NodeKind::Host(tag) => mount_host(root, parent, vnode, &tag, host_parent, insert_after),
			NodeKind::Fragment => {
				mount_transparent(root, parent, vnode, host_parent, insert_after, false)
			}
			NodeKind::ErrorBoundary => {
				mount_transparent(root, parent, vnode, host_parent, insert_after, true)
			}
			NodeKind::Component(component_fn) => mount_component(
				root,
				parent,
				vnode,
				component_fn,
				host_parent,
				insert_after,
			),
		},
	}
}

fn mount_text(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	text: &str,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> ComponentRef {
	let component = ComponentInner::new(Rendered::Text(text.to_string()));
	component.attach(parent, root);
	let node = host_parent.owner_document().create_text(text).node();
	*component.host.borrow_mut() = Some(node.clone());
	component.dom_roots.borrow_mut().push(node);
	place_roots(host_parent, &component, insert_after);
	component
}

fn mount_host(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	vnode: &VNode,
	tag: &str,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> Result<ComponentRef, RenderError> {
	let component = ComponentInner::new(Rendered::Node(vnode.clone()));
	component.attach(parent, root);
	if tag == "svg" {
		component.svg.set(true);
	}

	let element = host_parent
		.owner_document()
		.create_element(tag, component.svg.get());
	if let Err(error) = apply_props(&element, &Props::new(), vnode.props()) {
		unmount(&component, true);
		return Err(error);
	}
	if let Some(node_ref) = vnode.props().node_ref_prop() {
		node_ref.set(Some(element.node()));
	}
	*component.host.borrow_mut() = Some(element.node());
	component.dom_roots.borrow_mut().push(element.node());

	// Children mount into the still-detached element.
	let mut local_after = None;
	let children_view = View::List(vnode.props().children().to_vec());
	let (children, outcome) = diff_children(
		root,
		&component,
		Vec::new(),
		flatten_children(children_view),
		&element,
		&mut local_after,
	);
	*component.children.borrow_mut() = children;
	if let Err(error) = outcome {
		unmount(&component, true);
		return Err(error);
	}

	place_roots(host_parent, &component, insert_after);
	Ok(component)
}

fn mount_transparent(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	vnode: &VNode,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
	boundary: bool,
) -> Result<ComponentRef, RenderError> {
	let component = ComponentInner::new(Rendered::Node(vnode.clone()));
	component.attach(parent, root);

	let children_view = View::List(vnode.props().children().to_vec());
	let (children, outcome) = diff_children(
		root,
		&component,
		Vec::new(),
		flatten_children(children_view),
		host_parent,
		insert_after,
	);
	*component.children.borrow_mut() = children;
	component.refresh_dom_roots();

	let outcome = if boundary {
		catch_at_boundary(vnode, outcome)
	} else {
		outcome
	};
	if let Err(error) = outcome {
		unmount(&component, false);
		return Err(error);
	}
	Ok(component)
}

fn mount_component(
	root: &Rc<RootInner>,
	parent: Option<&ComponentRef>,
	vnode: &VNode,
	component_fn: Component,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> Result<ComponentRef, RenderError> {
	let component = ComponentInner::new(Rendered::Node(vnode.clone()));
	component.attach(parent, root);

	let output = invoke_component(&component, component_fn, vnode.props());
	let view = match output {
		Ok(view) => view,
		Err(error) => {
			unmount(&component, true);
			return Err(error);
		}
	};

	let (children, outcome) = diff_children(
		root,
		&component,
		Vec::new(),
		flatten_children(view),
		host_parent,
		insert_after,
	);
	*component.children.borrow_mut() = children;
	component.refresh_dom_roots();
	if let Err(error) = outcome {
		unmount(&component, false);
		return Err(error);
	}
	Ok(component)
}

fn update_text(component: &ComponentRef, text: &str) {
	let changed = match &*component.rendered.borrow() {
		Rendered::Text(prev) => prev != text,
		_ => true,
	};
	if !changed {
		return;
	}
	if let Some(node) = component.host.borrow().as_ref() {
		if let Some(text_node) = node.as_text() {
			text_node.set_data(text);
		}
	}
	*component.rendered.borrow_mut() = Rendered::Text(text.to_string());
}

fn diff_host(
	root: &Rc<RootInner>,
	component: &ComponentRef,
	old_vnode: &VNode,
	new_vnode: &VNode,
	insert_after: &mut Option<dom::Node>,
	host_parent: &dom::Element,
) -> Result<(), RenderError> {
	let element = component
		.host
		.borrow()
		.as_ref()
		.and_then(dom::Node::as_element)
		.expect("host component owns a host element");

	apply_props(&element, old_vnode.props(), new_vnode.props())?;
	update_ref(
		old_vnode.props().node_ref_prop(),
		new_vnode.props().node_ref_prop(),
		&element.node(),
	);
	*component.rendered.borrow_mut() = Rendered::Node(new_vnode.clone());

	let prev = component.children.take();
	let mut local_after = None;
	let children_view = View::List(new_vnode.props().children().to_vec());
	let (children, outcome) = diff_children(
		root,
		component,
		prev,
		flatten_children(children_view),
		&element,
		&mut local_after,
	);
	*component.children.borrow_mut() = children;
	place_roots(host_parent, component, insert_after);
	outcome
}

fn diff_transparent(
	root: &Rc<RootInner>,
	component: &ComponentRef,
	new_vnode: &VNode,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
	boundary: bool,
) -> Result<(), RenderError> {
	*component.rendered.borrow_mut() = Rendered::Node(new_vnode.clone());
	let prev = component.children.take();
	let children_view = View::List(new_vnode.props().children().to_vec());
	let (children, outcome) = diff_children(
		root,
		component,
		prev,
		flatten_children(children_view),
		host_parent,
		insert_after,
	);
	*component.children.borrow_mut() = children;
	if component.refresh_dom_roots() {
		propagate_dom_roots(component);
	}
	if boundary {
		catch_at_boundary(new_vnode, outcome)
	} else {
		outcome
	}
}

#[allow(clippy::too_many_arguments)]
fn diff_component(
	root: &Rc<RootInner>,
	component: &ComponentRef,
	old_vnode: &VNode,
	new_vnode: &VNode,
	component_fn: Component,
	host_parent: &dom::Element,
	insert_after: &mut Option<dom::Node>,
) -> Result<(), RenderError> {
	let was_queued = component.queued.replace(false);
	if was_queued {
		root.pending_update
			.borrow_mut()
			.retain(|queued| !Rc::ptr_eq(queued, component));
	}

	// Memoized components skip the invocation on shallow-equal props unless
	// an update is pending for them.
	if !was_queued && component_fn.memo_skips(old_vnode.props(), new_vnode.props()) {
		*component.rendered.borrow_mut() = Rendered::Node(new_vnode.clone());
		place_roots(host_parent, component, insert_after);
		return Ok(());
	}

	*component.rendered.borrow_mut() = Rendered::Node(new_vnode.clone());
	let view = invoke_component(component, component_fn, new_vnode.props())?;

	let prev = component.children.take();
	let (children, outcome) = diff_children(
		root,
		component,
		prev,
		flatten_children(view),
		host_parent,
		insert_after,
	);
	*component.children.borrow_mut() = children;
	if component.refresh_dom_roots() {
		propagate_dom_roots(component);
	}
	outcome
}

/// Invokes the user function with the component installed as the current
/// hook state; the guard restores the previous state on every exit path.
fn invoke_component(
	component: &ComponentRef,
	component_fn: Component,
	props: &Props,
) -> Result<View, RenderError> {
	let _guard = CurrentGuard::install(component);
	component_fn.invoke(props)
}

/// Feeds a child-list error to a boundary's `handler` prop. The handler may
/// swallow it or replace it with an error of its own, which continues the
/// walk at the boundary's parent.
fn catch_at_boundary(vnode: &VNode, outcome: Result<(), RenderError>) -> Result<(), RenderError> {
	let Err(error) = outcome else {
		return Ok(());
	};
	match vnode.props().error_handler() {
		Some(handler) => handler.call(&error),
		None => Err(error),
	}
}

/// Positions the component's host roots after `insert_after`, advancing the
/// cursor. In-place nodes are untouched by the adapter's no-op guarantee.
fn place_roots(
	host_parent: &dom::Element,
	component: &ComponentRef,
	insert_after: &mut Option<dom::Node>,
) {
	for node in component.dom_roots() {
		host_parent.insert_after(&node, insert_after.as_ref());
		*insert_after = Some(node);
	}
}

/// Recomputes dom-roots caches upward through ancestors that have no host
/// node of their own, stopping at the first unchanged cache.
fn propagate_dom_roots(component: &ComponentRef) {
	let mut cursor = component.parent();
	while let Some(current) = cursor {
		if current.host.borrow().is_some() {
			break;
		}
		if !current.refresh_dom_roots() {
			break;
		}
		cursor = current.parent();
	}
}

fn update_ref(
	old: Option<&crate::hooks::refs::NodeRef>,
	new: Option<&crate::hooks::refs::NodeRef>,
	node: &dom::Node,
) {
	if let (Some(old), Some(new)) = (old, new) {
		if old.ptr_eq(new) {
			return;
		}
	}
	if let Some(old) = old {
		if old.get().is_some_and(|current| current.same_node(node)) {
			old.set(None);
		}
	}
	if let Some(new) = new {
		new.set(Some(node.clone()));
	}
}

/// Unmounts a component and its descendants: effect cleanups in reverse
/// insertion order, then context unsubscribes, then ref clearing, host-node
/// removal (only at the top of the removed region), and queue cancellation.
pub(crate) fn unmount(component: &ComponentRef, ancestor_removed: bool) {
	if component.is_empty_component() {
		return;
	}
	if component.unmounted.replace(true) {
		return;
	}

	let mut cleanups: Vec<crate::hooks::CleanupFn> = Vec::new();
	let mut unsubscribes: Vec<(crate::context::ContextProvider, u64)> = Vec::new();
	if let Some(state) = component.hooks.borrow_mut().as_mut() {
		for cell in state.cells.iter_mut().rev() {
			match cell {
				HookCell::Effect {
					pending, cleanup, ..
				} => {
					// An effect cancelled before its first run never executes.
					pending.take();
					if let Some(cleanup) = cleanup.take() {
						cleanups.push(cleanup);
					}
				}
				HookCell::Context {
					provider,
					subscription,
				} => {
					if let (Some(provider), Some(id)) = (provider.take(), subscription.take()) {
						unsubscribes.push((provider, id));
					}
				}
				_ => {}
			}
		}
	}
	// Every effect cleanup runs before any provider subscription is dropped.
	for cleanup in cleanups {
		if let Err(error) = cleanup() {
			capture_error(component, error);
		}
	}
	for (provider, id) in unsubscribes {
		provider.unsubscribe(id);
	}

	// Clear the ref only when it still points at the node this component
	// placed; a reassigned ref belongs to its new element.
	if let Some(vnode) = component.vnode() {
		if let Some(node_ref) = vnode.props().node_ref_prop() {
			let host = component.host.borrow().clone();
			if let (Some(host), Some(current)) = (host, node_ref.get()) {
				if current.same_node(&host) {
					node_ref.set(None);
				}
			}
		}
	}

	if let Some(element) = component
		.host
		.borrow()
		.as_ref()
		.and_then(dom::Node::as_element)
	{
		element.clear_listeners();
	}

	if !ancestor_removed {
		for node in component.dom_roots() {
			node.remove_from_parent();
		}
	}

	let children = component.children.take();
	for child in children {
		unmount(&child, true);
	}

	if let Some(root) = component.root() {
		crate::runtime::drop_from_queues(&root, component);
	}
	component.queued.set(false);
}

/// Routes an error with no render frame below it (effect bodies, cleanups,
/// context notifications) to the nearest ancestor boundary; unhandled errors
/// are recorded on the root for the end of the current flush.
pub(crate) fn capture_error(component: &ComponentRef, error: RenderError) {
	let mut error = error;
	let mut cursor = component.parent();
	while let Some(current) = cursor {
		if !current.unmounted.get() {
			if let Some(vnode) = current.vnode() {
				if matches!(vnode.kind(), NodeKind::ErrorBoundary) {
					if let Some(handler) = vnode.props().error_handler() {
						match handler.call(&error) {
							Ok(()) => return,
							Err(replacement) => error = replacement,
						}
					}
				}
			}
		}
		cursor = current.parent();
	}
	match component.root() {
		Some(root) => root.record_error(error),
		None => error_log!("uncaught render error: {}", error),
	}
}

/// Diffs the root position of a container against its previous base
/// component. On error the previous base stays in place so the caller's
/// teardown still reaches every mounted node.
pub(crate) fn render_into_root(root: &Rc<RootInner>, view: &View) -> Result<(), RenderError> {
	let container = root.container.clone();
	let existing = root.base.borrow().clone();
	let mut insert_after = None;
	let component = diff_child(root, None, existing, view, &container, &mut insert_after)?;
	*root.base.borrow_mut() = Some(component);
	Ok(())
}
