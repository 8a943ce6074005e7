//! Memoization hooks: use_memo and use_callback
//!
//! Both cache against a dependency array compared by pairwise identity. The
//! cached value keeps a stable identity until the deps change, which is what
//! lets a memoized vnode subtree hit the reconciler's identity fast path and
//! a memoized handler survive `Props::shallow_eq`.

use std::rc::Rc;

use crate::dom::Event;
use crate::hooks::{deps_eq, with_cell, CellKind, HookCell, HOOK_ORDER_MSG};
use crate::props::{EventHandler, PropValue};

/// Memoizes a computation against a dependency array.
///
/// The computation re-runs only when `deps` fails pairwise identity against
/// the previous render's array; otherwise the cached value (same identity)
/// is returned.
///
/// # Example
///
/// ```ignore
/// let subtree = use_memo(
/// 	move || el("ul", None, items.iter().map(row).collect::<Vec<_>>()),
/// 	deps![revision],
/// );
/// ```
pub fn use_memo<T: Clone + 'static>(compute: impl FnOnce() -> T, deps: Vec<PropValue>) -> T {
	with_cell(CellKind::Memo, move |cell, _| match cell {
		HookCell::Memo {
			value,
			deps: stored,
		} if deps_eq(stored, &deps) => value
			.clone()
			.downcast::<T>()
			.map(|rc| (*rc).clone())
			.unwrap_or_else(|_| panic!("{}", HOOK_ORDER_MSG)),
		other => {
			let fresh = compute();
			*other = HookCell::Memo {
				value: Rc::new(fresh.clone()),
				deps,
			};
			fresh
		}
	})
}

/// Memoizes an event handler against a dependency array.
///
/// Identical shape to [`use_memo`], but the stored value is the handler
/// itself: the returned [`EventHandler`] keeps its identity until `deps`
/// change.
pub fn use_callback(f: impl Fn(&Event) + 'static, deps: Vec<PropValue>) -> EventHandler {
	with_cell(CellKind::Callback, move |cell, _| match cell {
		HookCell::Callback {
			value,
			deps: stored,
		} if deps_eq(stored, &deps) => value.clone(),
		other => {
			let handler = EventHandler::new(f);
			*other = HookCell::Callback {
				value: handler.clone(),
				deps,
			};
			handler
		}
	})
}
