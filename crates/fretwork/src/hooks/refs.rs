//! Ref hooks: use_ref
//!
//! This hook provides a way to hold mutable values that don't trigger re-renders.

use std::cell::RefCell;
use std::rc::Rc;

use crate::hooks::{with_cell, CellKind, HookCell, HOOK_ORDER_MSG};

/// A mutable reference container that doesn't trigger re-renders.
///
/// Unlike state, updating a `Ref`'s value won't schedule an update for the
/// owning component. This is useful for holding host-node references, timers,
/// or any mutable data that shouldn't affect rendering.
///
/// ## Example
///
/// ```ignore
/// use fretwork::use_ref;
///
/// let render_count = use_ref(|| 0);
/// *render_count.current_mut() += 1;
/// ```
pub struct Ref<T: 'static> {
	inner: Rc<RefCell<T>>,
}

impl<T: 'static> Ref<T> {
	/// Creates a new Ref with the given initial value.
	pub(crate) fn new(value: T) -> Self {
		Self {
			inner: Rc::new(RefCell::new(value)),
		}
	}

	/// Gets a reference to the current value.
	///
	/// # Panics
	///
	/// Panics if the value is currently mutably borrowed.
	pub fn current(&self) -> std::cell::Ref<'_, T> {
		self.inner.borrow()
	}

	/// Gets a mutable reference to the current value.
	///
	/// # Panics
	///
	/// Panics if the value is currently borrowed.
	pub fn current_mut(&self) -> std::cell::RefMut<'_, T> {
		self.inner.borrow_mut()
	}

	/// Sets the current value.
	///
	/// This does NOT schedule any update.
	pub fn set(&self, value: T) {
		*self.inner.borrow_mut() = value;
	}

	/// Updates the current value using a function.
	///
	/// This does NOT schedule any update.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		f(&mut *self.inner.borrow_mut());
	}

	/// Returns true when both refs share the same cell.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<T: Clone + 'static> Ref<T> {
	/// Gets a clone of the current value.
	pub fn get(&self) -> T {
		self.inner.borrow().clone()
	}
}

impl<T: 'static> Clone for Ref<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Ref<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Ref")
			.field("current", &*self.inner.borrow())
			.finish()
	}
}

/// A ref holding the host node a vnode mounted, written by the reconciler.
///
/// Created by [`create_ref`], passed through the `ref` prop, filled in when
/// the host node mounts and cleared when that exact node unmounts.
pub type NodeRef = Ref<Option<crate::dom::Node>>;

/// Creates an empty [`NodeRef`] for use as a vnode's `ref` prop.
///
/// The returned ref is owned by the caller; the reconciler only writes its
/// cell.
pub fn create_ref() -> NodeRef {
	Ref::new(None)
}

/// Creates a mutable reference that persists across renders without
/// triggering updates.
///
/// The initializer runs only on the first render of the owning component;
/// the returned `Ref<T>` identity is stable for the component's lifetime.
///
/// # Panics
///
/// Panics when called outside a component body, or when hook order diverges
/// between renders.
///
/// # Example
///
/// ```ignore
/// use fretwork::use_ref;
///
/// let timer_id = use_ref(|| None::<i32>);
/// timer_id.set(Some(123));
/// ```
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Ref<T> {
	with_cell(CellKind::Ref, move |cell, _| {
		if let HookCell::Vacant(_) = cell {
			*cell = HookCell::Ref {
				value: Rc::new(Ref::new(init())),
			};
		}
		let HookCell::Ref { value } = cell else {
			unreachable!()
		};
		value
			.clone()
			.downcast::<Ref<T>>()
			.map(|rc| (*rc).clone())
			.unwrap_or_else(|_| panic!("{}", HOOK_ORDER_MSG))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ref_set_and_get() {
		let r = Ref::new(42);
		assert_eq!(*r.current(), 42);

		r.set(100);
		assert_eq!(*r.current(), 100);
	}

	#[test]
	fn test_ref_update() {
		let r = Ref::new(vec![1, 2, 3]);

		r.update(|v| v.push(4));
		assert_eq!(*r.current(), vec![1, 2, 3, 4]);
	}

	#[test]
	fn test_ref_clone_shares_cell() {
		let r1 = Ref::new(0);
		let r2 = r1.clone();

		r1.set(10);
		assert_eq!(*r2.current(), 10);
		assert!(r1.ptr_eq(&r2));
	}

	#[test]
	fn test_create_ref_starts_empty() {
		let r = create_ref();
		assert!(r.current().is_none());
	}

	#[test]
	fn test_distinct_refs_are_not_ptr_eq() {
		let r1 = create_ref();
		let r2 = create_ref();
		assert!(!r1.ptr_eq(&r2));
	}
}
