//! Integration tests for the `act` drain: all phases settle before it
//! returns, and repeated drains observe nothing new.

#[cfg(test)]
mod tests {
	use fretwork::prelude::*;
	use fretwork::testing;
	use serial_test::serial;
	use std::cell::Cell;

	thread_local! {
		static LAYOUT_RUNS: Cell<usize> = const { Cell::new(0) };
		static POST_RUNS: Cell<usize> = const { Cell::new(0) };
	}

	fn container() -> (Document, Element) {
		let doc = Document::new();
		let root = doc.create_element("div", false);
		(doc, root)
	}

	fn widget(_props: &Props) -> Render {
		use_layout_effect(
			|| LAYOUT_RUNS.with(|runs| runs.set(runs.get() + 1)),
			Some(deps![]),
		);
		use_effect(
			|| POST_RUNS.with(|runs| runs.set(runs.get() + 1)),
			Some(deps![]),
		);
		Ok(el("div", None, View::from("widget")))
	}

	fn widget_view() -> View {
		el(Component::new("Widget", widget), None, View::Empty)
	}

	#[test]
	#[serial]
	fn test_act_drains_all_phases() {
		let (_doc, root) = container();
		act(|| render(widget_view(), &root).unwrap()).unwrap();

		assert_eq!(LAYOUT_RUNS.with(Cell::get), 1);
		assert_eq!(POST_RUNS.with(Cell::get), 1);

		// A second, empty act observes nothing new.
		act(|| {}).unwrap();
		assert_eq!(LAYOUT_RUNS.with(Cell::get), 1);
		assert_eq!(POST_RUNS.with(Cell::get), 1);
		assert_eq!(root.inner_html(), "<div>widget</div>");
	}

	#[test]
	#[serial]
	fn test_repeated_act_render_keeps_effects_at_one() {
		let (_doc, root) = container();
		let view = widget_view();

		act(|| render(view.clone(), &root).unwrap()).unwrap();
		act(|| render(view, &root).unwrap()).unwrap();

		assert_eq!(POST_RUNS.with(Cell::get), 1);
		assert_eq!(LAYOUT_RUNS.with(Cell::get), 1);
	}

	#[test]
	#[serial]
	fn test_nested_act_drains_once_at_outermost_exit() {
		let (_doc, root) = container();
		act(|| {
			act(|| render(widget_view(), &root).unwrap()).unwrap();
			// Inner act does not drain: the post-commit effect is still
			// pending while the outer frame is active.
			assert_eq!(POST_RUNS.with(Cell::get), 0);
		})
		.unwrap();

		assert_eq!(POST_RUNS.with(Cell::get), 1);
	}

	#[test]
	#[serial]
	fn test_mount_unmount_leaves_container_clean() {
		let (_doc, root) = container();
		let node_ref = create_ref();
		act(|| {
			render(
				el(
					"div",
					Props::new().node_ref(node_ref.clone()),
					vec![widget_view()],
				),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert!(node_ref.get().is_some());

		act(|| {
			assert!(unmount_component_at_node(&root));
		})
		.unwrap();

		assert_eq!(root.inner_html(), "");
		assert!(node_ref.get().is_none());
	}

	#[test]
	#[serial]
	fn test_base_view_exposes_last_tree() {
		let (_doc, root) = container();
		assert!(testing::base_view(&root).is_none());

		act(|| render(widget_view(), &root).unwrap()).unwrap();
		let base = testing::base_view(&root).expect("base tree present");
		assert!(is_valid_element(&base));
	}
}
