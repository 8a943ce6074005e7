//! Property application: diffing a prop bag onto a host element.
//!
//! The decision of property vs attribute vs event listener is made here, per
//! prop name, and is opaque to the reconciler. `on*` props become listeners
//! (a `Capture` suffix selects the capture phase); the reserved names
//! (`children`, `ref`, `key`) never touch the host; everything else is an
//! attribute keyed by its (alias-resolved) name.
//!
//! Application is idempotent for unchanged prop sets: identical values are
//! skipped, and listener identity is compared before re-binding.

use crate::dom::Element;
use crate::error::RenderError;
use crate::props::{PropValue, Props};

/// Names the reconciler consumes itself; never forwarded to the host.
fn is_reserved(name: &str) -> bool {
	matches!(name, "children" | "ref" | "key")
}

/// Prop-name aliases for attribute targets.
fn attribute_name(name: &str) -> &str {
	match name {
		"className" => "class",
		"htmlFor" => "for",
		_ => name,
	}
}

/// Splits an `on*` prop name into `(event, capture)`, e.g.
/// `onClickCapture` → `("click", true)`.
fn parse_event_prop(name: &str) -> Option<(String, bool)> {
	let rest = name.strip_prefix("on")?;
	if rest.is_empty() {
		return None;
	}
	let (event, capture) = match rest.strip_suffix("Capture") {
		Some(stripped) if !stripped.is_empty() => (stripped, true),
		_ => (rest, false),
	};
	Some((event.to_ascii_lowercase(), capture))
}

/// Applies the difference between `prev` and `next` onto `el`.
pub(crate) fn apply_props(el: &Element, prev: &Props, next: &Props) -> Result<(), RenderError> {
	// Clear props that disappeared.
	for (name, value) in prev.iter() {
		if is_reserved(name) || next.contains(name) {
			continue;
		}
		clear_prop(el, name, value);
	}

	// Set changed props in a stable order.
	let mut entries: Vec<(&str, &PropValue)> = next
		.iter()
		.filter(|(name, _)| !is_reserved(name))
		.collect();
	entries.sort_unstable_by_key(|(name, _)| *name);

	for (name, value) in entries {
		if prev.get(name).is_some_and(|p| p.same(value)) {
			continue;
		}
		set_prop(el, name, prev.get(name), value)?;
	}
	Ok(())
}

fn clear_prop(el: &Element, name: &str, value: &PropValue) {
	if let Some((event, capture)) = parse_event_prop(name) {
		if matches!(value, PropValue::Handler(_)) {
			el.remove_listener(&event, capture);
			return;
		}
	}
	el.remove_attribute(attribute_name(name));
}

fn set_prop(
	el: &Element,
	name: &str,
	prev: Option<&PropValue>,
	value: &PropValue,
) -> Result<(), RenderError> {
	if let Some((event, capture)) = parse_event_prop(name) {
		let had_listener = matches!(prev, Some(PropValue::Handler(_)));
		match value {
			PropValue::Handler(handler) => {
				if had_listener {
					el.remove_listener(&event, capture);
				}
				el.add_listener(&event, capture, handler.clone());
				return Ok(());
			}
			PropValue::Null => {
				if had_listener {
					el.remove_listener(&event, capture);
					return Ok(());
				}
			}
			_ => {}
		}
	}
	match value.attribute_text() {
		Some(text) => el.set_attribute(attribute_name(name), &text)?,
		None => el.remove_attribute(attribute_name(name)),
	}
	Ok(())
}
