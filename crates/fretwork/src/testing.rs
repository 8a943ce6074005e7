//! Test-mode flushing.
//!
//! [`act`] is a counted, re-entrant helper: while at least one `act` frame
//! is active, roots keep their queues but install no deferred callbacks; on
//! exit of the outermost frame every queue on every root drains to empty:
//! updates, then layout effects, then post-commit effects, repeating until
//! nothing is pending. A panicking callback still restores the scheduler
//! (the depth guard unwinds), so a subsequent `act` works normally.
//!
//! [`flush`] is the per-root synchronous drain a testing wrapper library
//! builds on, and [`base_view`] exposes the last rendered base tree.

use std::cell::Cell;
use std::future::Future;

use crate::dom;
use crate::error::RenderError;
use crate::runtime;
use crate::view::View;

thread_local! {
	static ACT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// True while an `act` frame is active; deferred scheduling is disabled.
pub(crate) fn act_active() -> bool {
	ACT_DEPTH.with(|depth| depth.get() > 0)
}

struct ActGuard;

impl ActGuard {
	fn enter() -> Self {
		ACT_DEPTH.with(|depth| depth.set(depth.get() + 1));
		ActGuard
	}

	fn outermost(&self) -> bool {
		ACT_DEPTH.with(|depth| depth.get() == 1)
	}
}

impl Drop for ActGuard {
	fn drop(&mut self) {
		ACT_DEPTH.with(|depth| depth.set(depth.get() - 1));
	}
}

/// Runs `f` with deferred scheduling disabled, then drains all queues on
/// all roots synchronously.
///
/// Re-entrant: only the outermost call drains. The first error left
/// unhandled by every boundary during the drain tears its root down and
/// surfaces here.
pub fn act<R>(f: impl FnOnce() -> R) -> Result<R, RenderError> {
	let guard = ActGuard::enter();
	let value = f();
	let result = if guard.outermost() { drain_all() } else { Ok(()) };
	drop(guard);
	result.map(|_| value)
}

/// [`act`] for future-returning callbacks: the drain waits for the future
/// to settle, and still runs when the future's output carries an error.
pub async fn act_async<R, Fut>(f: impl FnOnce() -> Fut) -> Result<R, RenderError>
where
	Fut: Future<Output = R>,
{
	let guard = ActGuard::enter();
	let value = f().await;
	let result = if guard.outermost() { drain_all() } else { Ok(()) };
	drop(guard);
	result.map(|_| value)
}

fn drain_all() -> Result<(), RenderError> {
	let mut first_error: Option<RenderError> = None;
	loop {
		let mut worked = false;
		for root in runtime::all_roots() {
			if root.has_pending_work() {
				worked = true;
				runtime::flush_updates(&root);
				runtime::flush_layout_effects(&root);
				runtime::flush_post_effects(&root);
			}
			if let Err(error) = runtime::handle_root_error(&root) {
				first_error.get_or_insert(error);
			}
		}
		if !worked {
			break;
		}
	}
	match first_error {
		Some(error) => Err(error),
		None => Ok(()),
	}
}

/// Synchronously drains one container's queues: updates, layout effects,
/// post-commit effects.
pub fn flush(container: &dom::Element) -> Result<(), RenderError> {
	let Some(root) = runtime::find_root(container) else {
		return Ok(());
	};
	runtime::flush_updates(&root);
	runtime::flush_layout_effects(&root);
	runtime::flush_post_effects(&root);
	runtime::handle_root_error(&root)
}

/// The last rendered base tree of a container, when its root position holds
/// a vnode.
pub fn base_view(container: &dom::Element) -> Option<View> {
	let root = runtime::find_root(container)?;
	let base = root.base.borrow();
	base.as_ref().and_then(|component| component.vnode()).map(View::Node)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serial_test::serial;

	#[test]
	#[serial]
	fn test_act_returns_value() {
		let value = act(|| 42).unwrap();
		assert_eq!(value, 42);
	}

	#[test]
	#[serial]
	fn test_act_nested_depth_restored() {
		let result = act(|| act(|| act(|| "deep")).unwrap()).unwrap();
		assert_eq!(result.unwrap(), "deep");
		assert!(!act_active());
	}

	#[test]
	#[serial]
	fn test_act_depth_restored_after_panic() {
		let caught = std::panic::catch_unwind(|| {
			let _ = act(|| -> () { panic!("boom") });
		});
		assert!(caught.is_err());
		assert!(!act_active());
		// The scheduler still works afterwards.
		assert_eq!(act(|| 1).unwrap(), 1);
	}

	#[test]
	#[serial]
	fn test_flush_without_root_is_ok() {
		let doc = dom::Document::new();
		let container = doc.create_element("div", false);
		assert!(flush(&container).is_ok());
	}
}
