//! Integration tests for context providers and consumers.

#[cfg(test)]
mod tests {
	use fretwork::prelude::*;
	use serial_test::serial;
	use std::cell::{Cell, RefCell};

	thread_local! {
		static THEME: Context = create_context("default");
		static CONSUMER_RENDERS: Cell<usize> = const { Cell::new(0) };
		static STASHED_SETTER: RefCell<Option<StateSetter<String>>> = const { RefCell::new(None) };
	}

	fn container() -> (Document, Element) {
		let doc = Document::new();
		let root = doc.create_element("div", false);
		(doc, root)
	}

	fn consumer(_props: &Props) -> Render {
		CONSUMER_RENDERS.with(|renders| renders.set(renders.get() + 1));
		let value = THEME.with(|theme| use_context(theme));
		let text = match value {
			PropValue::Str(text) => text,
			other => format!("{:?}", other),
		};
		Ok(el("div", None, View::from(text)))
	}

	fn consumer_view() -> View {
		el(Component::new("Consumer", consumer), None, View::Empty)
	}

	#[test]
	#[serial]
	fn test_consumer_without_provider_reads_default() {
		let (_doc, root) = container();
		render(consumer_view(), &root).unwrap();
		assert_eq!(root.inner_html(), "<div>default</div>");
	}

	#[test]
	#[serial]
	fn test_nearest_provider_wins() {
		let (_doc, root) = container();
		let tree = THEME.with(|theme| {
			theme.provider(
				"outer",
				vec![theme.provider("inner", vec![consumer_view()])],
			)
		});
		render(tree, &root).unwrap();
		assert_eq!(root.inner_html(), "<div>inner</div>");
	}

	#[test]
	#[serial]
	fn test_provider_without_value_prop_uses_default() {
		let (_doc, root) = container();
		let tree = THEME.with(|theme| theme.provider_default(vec![consumer_view()]));
		render(tree, &root).unwrap();
		assert_eq!(root.inner_html(), "<div>default</div>");
	}

	#[test]
	#[serial]
	fn test_null_value_prop_still_wins_over_default() {
		let (_doc, root) = container();
		let tree = THEME.with(|theme| theme.provider(PropValue::Null, vec![consumer_view()]));
		render(tree, &root).unwrap();
		assert_eq!(root.inner_html(), "<div>Null</div>");
	}

	fn themed_app(_props: &Props) -> Render {
		let (value, set_value) = use_state(|| "one".to_string());
		STASHED_SETTER.with(|stash| *stash.borrow_mut() = Some(set_value));
		Ok(THEME.with(|theme| {
			theme.provider(
				value.as_str(),
				vec![el(
					memo(Component::new("Consumer", consumer)),
					None,
					View::Empty,
				)],
			)
		}))
	}

	#[test]
	#[serial]
	fn test_value_change_notifies_subscribed_consumer() {
		let (_doc, root) = container();
		act(|| {
			render(
				el(Component::new("ThemedApp", themed_app), None, View::Empty),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert_eq!(root.inner_html(), "<div>one</div>");
		assert_eq!(CONSUMER_RENDERS.with(Cell::get), 1);

		let setter = STASHED_SETTER.with(|stash| stash.borrow().clone()).unwrap();
		setter.set("two".to_string());
		act(|| {}).unwrap();

		// The memoized consumer skipped the tree walk but re-rendered through
		// its context subscription.
		assert_eq!(root.inner_html(), "<div>two</div>");
		assert_eq!(CONSUMER_RENDERS.with(Cell::get), 2);
	}

	thread_local! {
		static MIXED_CLEANUPS: Cell<usize> = const { Cell::new(0) };
	}

	fn mixed_consumer(_props: &Props) -> Render {
		let value = THEME.with(|theme| use_context(theme));
		use_effect(
			move || cleanup(move || MIXED_CLEANUPS.with(|runs| runs.set(runs.get() + 1))),
			Some(deps![]),
		);
		let text = match value {
			PropValue::Str(text) => text,
			_ => String::new(),
		};
		Ok(el("span", None, View::from(text)))
	}

	fn mixed_app(_props: &Props) -> Render {
		let (value, set_value) = use_state(|| "start".to_string());
		STASHED_SETTER.with(|stash| *stash.borrow_mut() = Some(set_value));
		Ok(THEME.with(|theme| {
			theme.provider(
				value.as_str(),
				vec![el(
					Component::new("MixedConsumer", mixed_consumer),
					None,
					View::Empty,
				)],
			)
		}))
	}

	#[test]
	#[serial]
	fn test_unmount_component_mixing_effect_and_context() {
		let (_doc, root) = container();
		act(|| {
			render(
				el(Component::new("MixedApp", mixed_app), None, View::Empty),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		assert_eq!(root.inner_html(), "<span>start</span>");
		assert_eq!(MIXED_CLEANUPS.with(Cell::get), 0);

		act(|| {
			assert!(unmount_component_at_node(&root));
		})
		.unwrap();
		assert_eq!(MIXED_CLEANUPS.with(Cell::get), 1);

		// A late provider update reaches neither the dropped subscription
		// nor the already-run cleanup.
		let setter = STASHED_SETTER.with(|stash| stash.borrow().clone()).unwrap();
		setter.set("late".to_string());
		act(|| {}).unwrap();
		assert_eq!(MIXED_CLEANUPS.with(Cell::get), 1);
		assert_eq!(root.inner_html(), "");
	}

	#[test]
	#[serial]
	fn test_unmount_unsubscribes_consumer() {
		let (_doc, root) = container();
		act(|| {
			render(
				el(Component::new("ThemedApp", themed_app), None, View::Empty),
				&root,
			)
			.unwrap()
		})
		.unwrap();
		let renders_before = CONSUMER_RENDERS.with(Cell::get);
		let setter = STASHED_SETTER.with(|stash| stash.borrow().clone()).unwrap();

		act(|| {
			assert!(unmount_component_at_node(&root));
		})
		.unwrap();

		// A late provider update reaches no unmounted subscriber.
		setter.set("three".to_string());
		act(|| {}).unwrap();
		assert_eq!(CONSUMER_RENDERS.with(Cell::get), renders_before);
	}
}
