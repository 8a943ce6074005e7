//! Hook state: per-component ordered cells behind a render-scoped cursor.
//!
//! Each component owns an ordered list of hook cells. Before the component
//! function runs, the cursor resets and the component is installed as the
//! process-global "current hook state"; every hook call advances the cursor
//! and reads (or creates, the first time) the cell at that index. The cell's
//! tag must match the requested hook; divergence between renders is a fatal
//! programming error.
//!
//! The current-component slot is the only process-wide mutable state the
//! library owns. It is installed through a scope guard that restores the
//! previous value on every exit path.

pub mod effect;
pub mod memo;
pub mod refs;

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::component::{ComponentInner, ComponentRef};
use crate::context::ContextProvider;
use crate::debug_log;
use crate::error::RenderError;
use crate::props::{EventHandler, PropValue};

pub(crate) const HOOK_ORDER_MSG: &str =
	"Hook type mismatch. Hooks must be called in same order on each render.";
pub(crate) const HOOK_OUTSIDE_MSG: &str = "Hook called outside of component";

/// An effect cleanup callback.
pub type CleanupFn = Box<dyn FnOnce() -> Result<(), RenderError>>;

/// What an effect body produces: an optional cleanup, or an error routed to
/// the nearest boundary.
pub type EffectResult = Result<Option<CleanupFn>, RenderError>;

pub(crate) type EffectFn = Box<dyn FnOnce() -> EffectResult>;

/// Conversion from the convenient effect-body return shapes.
pub trait IntoEffectResult {
	/// Normalizes into an [`EffectResult`].
	fn into_effect_result(self) -> EffectResult;
}

impl IntoEffectResult for () {
	fn into_effect_result(self) -> EffectResult {
		Ok(None)
	}
}

impl IntoEffectResult for Option<CleanupFn> {
	fn into_effect_result(self) -> EffectResult {
		Ok(self)
	}
}

impl IntoEffectResult for EffectResult {
	fn into_effect_result(self) -> EffectResult {
		self
	}
}

impl IntoEffectResult for Result<(), RenderError> {
	fn into_effect_result(self) -> EffectResult {
		self.map(|_| None)
	}
}

/// Hook-cell tags; a slot's tag is fixed on first use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CellKind {
	State,
	Reducer,
	Ref,
	Memo,
	Callback,
	Effect,
	Context,
}

/// A single hook slot.
pub(crate) enum HookCell {
	/// Freshly pushed slot; replaced by its accessor in the same call.
	Vacant(CellKind),
	State {
		value: Rc<dyn Any>,
	},
	Reducer {
		value: Rc<dyn Any>,
	},
	Ref {
		value: Rc<dyn Any>,
	},
	Memo {
		value: Rc<dyn Any>,
		deps: Vec<PropValue>,
	},
	Callback {
		value: EventHandler,
		deps: Vec<PropValue>,
	},
	Effect {
		layout: bool,
		deps: Option<Vec<PropValue>>,
		pending: Option<EffectFn>,
		cleanup: Option<CleanupFn>,
	},
	Context {
		provider: Option<ContextProvider>,
		subscription: Option<u64>,
	},
}

impl HookCell {
	pub(crate) fn kind(&self) -> CellKind {
		match self {
			HookCell::Vacant(kind) => *kind,
			HookCell::State { .. } => CellKind::State,
			HookCell::Reducer { .. } => CellKind::Reducer,
			HookCell::Ref { .. } => CellKind::Ref,
			HookCell::Memo { .. } => CellKind::Memo,
			HookCell::Callback { .. } => CellKind::Callback,
			HookCell::Effect { .. } => CellKind::Effect,
			HookCell::Context { .. } => CellKind::Context,
		}
	}
}

/// A component's ordered hook cells plus the render cursor.
pub(crate) struct HookState {
	pub(crate) cells: Vec<HookCell>,
	pub(crate) cursor: usize,
}

impl HookState {
	pub(crate) fn new() -> Self {
		Self {
			cells: Vec::new(),
			cursor: 0,
		}
	}
}

thread_local! {
	static CURRENT: RefCell<Option<ComponentRef>> = const { RefCell::new(None) };
}

/// Installs `component` as the current hook state for the duration of a
/// user-function invocation; restores the previous value on drop, including
/// on unwind.
pub(crate) struct CurrentGuard {
	prev: Option<ComponentRef>,
}

impl CurrentGuard {
	pub(crate) fn install(component: &ComponentRef) -> Self {
		if let Some(state) = component.hooks.borrow_mut().as_mut() {
			state.cursor = 0;
		}
		let prev = CURRENT.with(|current| current.borrow_mut().replace(Rc::clone(component)));
		Self { prev }
	}
}

impl Drop for CurrentGuard {
	fn drop(&mut self) {
		let prev = self.prev.take();
		CURRENT.with(|current| *current.borrow_mut() = prev);
	}
}

/// The component currently rendering.
///
/// # Panics
///
/// Panics when no component is rendering.
pub(crate) fn current_component() -> ComponentRef {
	CURRENT
		.with(|current| current.borrow().clone())
		.unwrap_or_else(|| panic!("{}", HOOK_OUTSIDE_MSG))
}

/// Advances the cursor and hands the slot at that index to `f`.
///
/// A fresh slot arrives as [`HookCell::Vacant`]; the accessor replaces it
/// with its real payload. A tag mismatch against an existing slot panics
/// with the hook-order message.
pub(crate) fn with_cell<R>(
	kind: CellKind,
	f: impl FnOnce(&mut HookCell, &ComponentRef) -> R,
) -> R {
	let component = current_component();
	let mut hooks = component.hooks.borrow_mut();
	let state = hooks.get_or_insert_with(HookState::new);
	let index = state.cursor;
	state.cursor += 1;
	if index == state.cells.len() {
		state.cells.push(HookCell::Vacant(kind));
	} else if state.cells[index].kind() != kind {
		panic!("{}", HOOK_ORDER_MSG);
	}
	debug_log!("hook slot {} ({:?})", index, kind);
	let cell = &mut state.cells[index];
	f(cell, &component)
}

/// Dependency-array equality: same length, pairwise-identical values.
pub fn deps_eq(a: &[PropValue], b: &[PropValue]) -> bool {
	a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same(y))
}

/// Builds a dependency array from values convertible to [`PropValue`].
///
/// ```ignore
/// use_effect(move || info_log!("count changed"), Some(deps![count]));
/// ```
#[macro_export]
macro_rules! deps {
	() => {
		::std::vec::Vec::new()
	};
	($($value:expr),+ $(,)?) => {
		vec![$($crate::PropValue::from($value)),+]
	};
}

/// The setter half of [`use_state`].
///
/// Stores a new value and asks the owning component's root to schedule an
/// update. A setter that outlives its component is inert.
pub struct StateSetter<T: 'static> {
	slot: Rc<RefCell<T>>,
	component: Weak<ComponentInner>,
}

impl<T: 'static> StateSetter<T> {
	/// Stores `value` and schedules a re-render.
	///
	/// Scheduling happens even when the new value equals the old one; use
	/// [`use_reducer`] for change-gated dispatch.
	pub fn set(&self, value: T) {
		*self.slot.borrow_mut() = value;
		self.schedule();
	}

	/// Stores the result of applying `f` to the current value and schedules
	/// a re-render.
	pub fn update(&self, f: impl FnOnce(&T) -> T) {
		let next = f(&self.slot.borrow());
		*self.slot.borrow_mut() = next;
		self.schedule();
	}

	fn schedule(&self) {
		let Some(component) = self.component.upgrade() else {
			return;
		};
		if component.unmounted.get() {
			return;
		}
		if let Some(root) = component.root() {
			crate::runtime::schedule_update(&root, &component);
		}
	}
}

impl<T: 'static> Clone for StateSetter<T> {
	fn clone(&self) -> Self {
		Self {
			slot: Rc::clone(&self.slot),
			component: Weak::clone(&self.component),
		}
	}
}

/// Local component state.
///
/// The initializer runs once, on the component's first render. Returns the
/// current value and a setter; calling the setter schedules a batched
/// re-render of the owning component.
///
/// # Panics
///
/// Panics when called outside a component body, or when hook order diverges
/// between renders.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, StateSetter<T>) {
	with_cell(CellKind::State, move |cell, component| {
		if let HookCell::Vacant(_) = cell {
			*cell = HookCell::State {
				value: Rc::new(RefCell::new(init())),
			};
		}
		let HookCell::State { value } = cell else {
			unreachable!()
		};
		let slot = value
			.clone()
			.downcast::<RefCell<T>>()
			.unwrap_or_else(|_| panic!("{}", HOOK_ORDER_MSG));
		let current = slot.borrow().clone();
		(
			current,
			StateSetter {
				slot,
				component: Rc::downgrade(component),
			},
		)
	})
}

/// The dispatch half of [`use_reducer`].
pub struct Dispatch<S: 'static, A> {
	slot: Rc<RefCell<S>>,
	reducer: fn(&S, A) -> S,
	component: Weak<ComponentInner>,
}

impl<S: PartialEq + 'static, A> Dispatch<S, A> {
	/// Applies the reducer; schedules a re-render only when the produced
	/// state differs from the current one.
	pub fn dispatch(&self, action: A) {
		let next = (self.reducer)(&self.slot.borrow(), action);
		if *self.slot.borrow() == next {
			return;
		}
		*self.slot.borrow_mut() = next;
		let Some(component) = self.component.upgrade() else {
			return;
		};
		if component.unmounted.get() {
			return;
		}
		if let Some(root) = component.root() {
			crate::runtime::schedule_update(&root, &component);
		}
	}
}

impl<S: 'static, A> Clone for Dispatch<S, A> {
	fn clone(&self) -> Self {
		Self {
			slot: Rc::clone(&self.slot),
			reducer: self.reducer,
			component: Weak::clone(&self.component),
		}
	}
}

/// Reducer-backed component state with change-gated dispatch.
pub fn use_reducer<S, A>(reducer: fn(&S, A) -> S, initial: S) -> (S, Dispatch<S, A>)
where
	S: Clone + PartialEq + 'static,
	A: 'static,
{
	use_reducer_with_init(reducer, initial, |s| s)
}

/// Like [`use_reducer`], deriving the initial state from `init_arg` through
/// `init` on the first render only.
pub fn use_reducer_with_init<S, A, I>(
	reducer: fn(&S, A) -> S,
	init_arg: I,
	init: impl FnOnce(I) -> S,
) -> (S, Dispatch<S, A>)
where
	S: Clone + PartialEq + 'static,
	A: 'static,
{
	with_cell(CellKind::Reducer, move |cell, component| {
		if let HookCell::Vacant(_) = cell {
			*cell = HookCell::Reducer {
				value: Rc::new(RefCell::new(init(init_arg))),
			};
		}
		let HookCell::Reducer { value } = cell else {
			unreachable!()
		};
		let slot = value
			.clone()
			.downcast::<RefCell<S>>()
			.unwrap_or_else(|_| panic!("{}", HOOK_ORDER_MSG));
		let current = slot.borrow().clone();
		(
			current,
			Dispatch {
				slot,
				reducer,
				component: Rc::downgrade(component),
			},
		)
	})
}
