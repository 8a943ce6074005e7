//! Integration tests for state hooks and batched update scheduling.

#[cfg(test)]
mod tests {
	use fretwork::prelude::*;
	use fretwork::testing;
	use serial_test::serial;
	use std::cell::{Cell, RefCell};

	thread_local! {
		static COUNTER_RENDERS: Cell<usize> = const { Cell::new(0) };
		static CHILD_RENDERS: Cell<usize> = const { Cell::new(0) };
		static STASHED_SETTER: RefCell<Option<StateSetter<i32>>> = const { RefCell::new(None) };
	}

	fn container() -> (Document, Element) {
		let doc = Document::new();
		let root = doc.create_element("div", false);
		(doc, root)
	}

	fn counter(_props: &Props) -> Render {
		COUNTER_RENDERS.with(|renders| renders.set(renders.get() + 1));
		let (count, set_count) = use_state(|| 0);
		STASHED_SETTER.with(|stash| *stash.borrow_mut() = Some(set_count.clone()));
		Ok(el(
			"button",
			Props::new().on("onClick", move |_| set_count.update(|c| c + 1)),
			View::from(count.to_string()),
		))
	}

	#[test]
	#[serial]
	fn test_state_setter_batches_updates() {
		let (_doc, root) = container();
		act(|| render(el(Component::new("Counter", counter), None, View::Empty), &root).unwrap())
			.unwrap();
		assert_eq!(root.inner_html(), "<button>0</button>");
		assert_eq!(COUNTER_RENDERS.with(Cell::get), 1);

		let button = root.child_nodes()[0].as_element().unwrap();
		button.click();
		button.click();

		// Still unflushed: the two setters batched into one queued update.
		assert_eq!(root.inner_html(), "<button>0</button>");

		act(|| {}).unwrap();
		assert_eq!(root.inner_html(), "<button>2</button>");
		assert_eq!(COUNTER_RENDERS.with(Cell::get), 2);
	}

	#[test]
	#[serial]
	fn test_explicit_flush_drains_updates() {
		let (_doc, root) = container();
		render(el(Component::new("Counter", counter), None, View::Empty), &root).unwrap();

		let button = root.child_nodes()[0].as_element().unwrap();
		button.click();
		testing::flush(&root).unwrap();

		assert_eq!(root.inner_html(), "<button>1</button>");
	}

	#[test]
	#[serial]
	fn test_dangling_setter_is_inert() {
		let (_doc, root) = container();
		act(|| render(el(Component::new("Counter", counter), None, View::Empty), &root).unwrap())
			.unwrap();
		let setter = STASHED_SETTER.with(|stash| stash.borrow().clone()).unwrap();

		assert!(unmount_component_at_node(&root));
		let renders_before = COUNTER_RENDERS.with(Cell::get);

		setter.set(99);
		act(|| {}).unwrap();

		assert_eq!(COUNTER_RENDERS.with(Cell::get), renders_before);
		assert_eq!(root.inner_html(), "");
	}

	fn clamped(state: &i32, action: i32) -> i32 {
		(state + action).min(10)
	}

	thread_local! {
		static CLAMP_RENDERS: Cell<usize> = const { Cell::new(0) };
		static STASHED_DISPATCH: RefCell<Option<Dispatch<i32, i32>>> = const { RefCell::new(None) };
	}

	fn clamp_counter(_props: &Props) -> Render {
		CLAMP_RENDERS.with(|renders| renders.set(renders.get() + 1));
		let (value, dispatch) = use_reducer(clamped, 10);
		STASHED_DISPATCH.with(|stash| *stash.borrow_mut() = Some(dispatch));
		Ok(el("span", None, View::from(value.to_string())))
	}

	#[test]
	#[serial]
	fn test_reducer_skips_schedule_when_unchanged() {
		let (_doc, root) = container();
		act(|| {
			render(
				el(Component::new("ClampCounter", clamp_counter), None, View::Empty),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert_eq!(CLAMP_RENDERS.with(Cell::get), 1);

		// Already clamped at 10: the reducer returns an equal value.
		let dispatch = STASHED_DISPATCH.with(|stash| stash.borrow().clone()).unwrap();
		dispatch.dispatch(5);
		act(|| {}).unwrap();

		assert_eq!(CLAMP_RENDERS.with(Cell::get), 1);
		assert_eq!(root.inner_html(), "<span>10</span>");
	}

	fn memo_child(props: &Props) -> Render {
		CHILD_RENDERS.with(|renders| renders.set(renders.get() + 1));
		let label = match props.get("label") {
			Some(PropValue::Str(label)) => label.clone(),
			_ => String::new(),
		};
		Ok(el("em", None, View::from(label)))
	}

	fn memo_parent(_props: &Props) -> Render {
		let (count, set_count) = use_state(|| 0);
		Ok(el(
			"div",
			Props::new().on("onClick", move |_| set_count.update(|c| c + 1)),
			vec![
				View::from(count.to_string()),
				el(
					memo(Component::new("MemoChild", memo_child)),
					Props::new().attr("label", "static"),
					View::Empty,
				),
			],
		))
	}

	#[test]
	#[serial]
	fn test_memo_component_skips_equal_props() {
		let (_doc, root) = container();
		act(|| {
			render(
				el(Component::new("MemoParent", memo_parent), None, View::Empty),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert_eq!(CHILD_RENDERS.with(Cell::get), 1);
		assert_eq!(root.inner_html(), "<div>0<em>static</em></div>");

		let div = root.child_nodes()[0].as_element().unwrap();
		div.click();
		act(|| {}).unwrap();

		// The parent re-rendered; the memoized child did not.
		assert_eq!(root.inner_html(), "<div>1<em>static</em></div>");
		assert_eq!(CHILD_RENDERS.with(Cell::get), 1);
	}

	fn eager(_props: &Props) -> Render {
		let (step, set_step) = use_state(|| 0);
		// A render-time state transition: scheduled during the flush and
		// absorbed by the same drain.
		if step == 1 {
			set_step.set(2);
		}
		Ok(el(
			"b",
			Props::new().on("onClick", move |_| set_step.set(1)),
			View::from(step.to_string()),
		))
	}

	#[test]
	#[serial]
	fn test_nested_update_keeps_sibling_order() {
		let (_doc, root) = container();
		act(|| {
			render(
				fragment(vec![
					View::from("prefix"),
					el(Component::new("Counter", counter), None, View::Empty),
					View::from("suffix"),
				]),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert_eq!(root.inner_html(), "prefix<button>0</button>suffix");

		let button = root.child_nodes()[1].as_element().unwrap();
		button.click();
		act(|| {}).unwrap();

		assert_eq!(root.inner_html(), "prefix<button>1</button>suffix");
		assert!(root.child_nodes()[1].same_node(&button.node()));
	}

	#[test]
	#[serial]
	fn test_update_scheduled_during_flush_drains_same_pass() {
		let (_doc, root) = container();
		act(|| render(el(Component::new("Eager", eager), None, View::Empty), &root).unwrap())
			.unwrap();

		root.child_nodes()[0].as_element().unwrap().click();
		act(|| {}).unwrap();

		assert_eq!(root.inner_html(), "<b>2</b>");
	}
}
