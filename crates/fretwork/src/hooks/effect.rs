//! Effect hooks: use_effect and use_layout_effect
//!
//! Both phases share one state machine; they differ only in when the root
//! flushes them. Layout effects run synchronously at the end of each render
//! or update flush, before the scheduler yields. Post-commit effects run
//! after the host has had a chance to paint.
//!
//! Dependency rules: with `None` deps the body re-runs on every render; with
//! `Some(deps)` it re-runs only when the array fails pairwise identity
//! against the previous render's array. The previous cleanup runs strictly
//! before the next body, and once more at unmount.

use crate::error::RenderError;
use crate::hooks::{
	deps_eq, with_cell, CellKind, CleanupFn, EffectFn, HookCell, IntoEffectResult,
};
use crate::props::PropValue;
use crate::reconcile;

/// Wraps an infallible cleanup closure for returning from an effect body.
///
/// ```ignore
/// use_effect(
/// 	move || cleanup(move || timer.cancel()),
/// 	Some(deps![]),
/// );
/// ```
pub fn cleanup(f: impl FnOnce() + 'static) -> Option<CleanupFn> {
	Some(Box::new(move || {
		f();
		Ok(())
	}))
}

/// Wraps a cleanup closure that may fail; the error routes to the nearest
/// error boundary.
pub fn try_cleanup(
	f: impl FnOnce() -> Result<(), RenderError> + 'static,
) -> Option<CleanupFn> {
	Some(Box::new(f))
}

/// Runs a side effect after the host has painted.
///
/// `deps` of `None` re-runs the body on every render. The body's return
/// value converts through [`IntoEffectResult`]: `()`, an optional cleanup
/// (see [`cleanup`]), or a `Result` carrying a render error.
pub fn use_effect<F, R>(f: F, deps: Option<Vec<PropValue>>)
where
	F: FnOnce() -> R + 'static,
	R: IntoEffectResult,
{
	effect_impl(false, f, deps)
}

/// Runs a side effect synchronously after mutations, before the host
/// paints.
///
/// Same contract as [`use_effect`]; prefer `use_effect` unless the body must
/// read or adjust the host before presentation.
pub fn use_layout_effect<F, R>(f: F, deps: Option<Vec<PropValue>>)
where
	F: FnOnce() -> R + 'static,
	R: IntoEffectResult,
{
	effect_impl(true, f, deps)
}

fn effect_impl<F, R>(layout: bool, f: F, deps: Option<Vec<PropValue>>)
where
	F: FnOnce() -> R + 'static,
	R: IntoEffectResult,
{
	let body: EffectFn = Box::new(move || f().into_effect_result());

	// Decide inside the hook slot; run the stale cleanup and enqueue after
	// the slot borrow is released.
	let decision = with_cell(CellKind::Effect, move |cell, component| match cell {
		HookCell::Effect {
			deps: stored,
			pending,
			cleanup: stale,
			..
		} => {
			let rerun = match (&*stored, &deps) {
				(Some(prev), Some(next)) => !deps_eq(prev, next),
				_ => true,
			};
			if !rerun {
				return None;
			}
			let stale = stale.take();
			*stored = deps;
			*pending = Some(body);
			Some((component.clone(), stale))
		}
		vacant => {
			*vacant = HookCell::Effect {
				layout,
				deps,
				pending: Some(body),
				cleanup: None,
			};
			Some((component.clone(), None))
		}
	});

	if let Some((component, stale)) = decision {
		if let Some(stale) = stale {
			if let Err(err) = stale() {
				reconcile::capture_error(&component, err);
			}
		}
		if let Some(root) = component.root() {
			crate::runtime::schedule_effect(&root, &component, layout);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{ComponentInner, Rendered};
	use crate::deps;
	use crate::hooks::CurrentGuard;
	use serial_test::serial;
	use std::cell::Cell;
	use std::rc::Rc;

	fn pending_count(component: &crate::component::ComponentRef) -> usize {
		component
			.hooks
			.borrow()
			.as_ref()
			.map(|state| {
				state
					.cells
					.iter()
					.filter(|cell| {
						matches!(cell, HookCell::Effect { pending: Some(_), .. })
					})
					.count()
			})
			.unwrap_or(0)
	}

	#[test]
	#[serial]
	fn test_effect_remembers_pending_body() {
		let component = ComponentInner::new(Rendered::Empty);
		let _guard = CurrentGuard::install(&component);

		use_effect(|| {}, Some(vec![]));
		drop(_guard);

		assert_eq!(pending_count(&component), 1);
	}

	#[test]
	#[serial]
	fn test_effect_with_equal_deps_not_rescheduled() {
		let component = ComponentInner::new(Rendered::Empty);
		{
			let _guard = CurrentGuard::install(&component);
			use_effect(|| {}, Some(deps![1]));
		}
		// Simulate the flush taking the body.
		if let Some(state) = component.hooks.borrow_mut().as_mut() {
			for cell in &mut state.cells {
				if let HookCell::Effect { pending, .. } = cell {
					let _ = pending.take();
				}
			}
		}
		{
			let _guard = CurrentGuard::install(&component);
			use_effect(|| {}, Some(deps![1]));
		}
		assert_eq!(pending_count(&component), 0);
	}

	#[test]
	#[serial]
	fn test_effect_with_changed_deps_runs_stale_cleanup() {
		let component = ComponentInner::new(Rendered::Empty);
		let cleaned = Rc::new(Cell::new(0));

		{
			let _guard = CurrentGuard::install(&component);
			let cleaned = Rc::clone(&cleaned);
			use_effect(move || cleanup(move || cleaned.set(cleaned.get() + 1)), Some(deps![1]));
		}
		// Simulate the flush: run the body, store its cleanup.
		{
			let mut hooks = component.hooks.borrow_mut();
			let state = hooks.as_mut().unwrap();
			for cell in &mut state.cells {
				if let HookCell::Effect { pending, cleanup, .. } = cell {
					if let Some(body) = pending.take() {
						*cleanup = body().unwrap();
					}
				}
			}
		}
		{
			let _guard = CurrentGuard::install(&component);
			use_effect(|| {}, Some(deps![2]));
		}
		assert_eq!(cleaned.get(), 1);
		assert_eq!(pending_count(&component), 1);
	}

	#[test]
	#[serial]
	fn test_depless_effect_reruns_every_render() {
		let component = ComponentInner::new(Rendered::Empty);
		for _ in 0..2 {
			let _guard = CurrentGuard::install(&component);
			use_effect(|| {}, None);
		}
		assert_eq!(pending_count(&component), 1);

		// Take the body, render again: it is pending again.
		if let Some(state) = component.hooks.borrow_mut().as_mut() {
			for cell in &mut state.cells {
				if let HookCell::Effect { pending, .. } = cell {
					let _ = pending.take();
				}
			}
		}
		let _guard = CurrentGuard::install(&component);
		use_effect(|| {}, None);
		drop(_guard);
		assert_eq!(pending_count(&component), 1);
	}
}
