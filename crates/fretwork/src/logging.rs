//! Console logging for development builds.
//!
//! All rendering diagnostics funnel through one [`emit`] function per
//! target: the browser console on `wasm32`, stderr elsewhere, and nothing at
//! all in release builds. Four level macros wrap the emitter; `debug_log!`
//! carries the per-slot hook tracing and stays silent unless the
//! `debug-hooks` feature is enabled.
//!
//! ## Example
//!
//! ```ignore
//! use fretwork::{debug_log, info_log, warn_log, error_log};
//!
//! debug_log!("hook slot {} ({:?})", index, kind);
//! info_log!("unmounting container root");
//! warn_log!("suppressing subsequent render error: {}", error);
//! error_log!("uncaught render error: {}", error);
//! ```

use std::fmt;

/// Severity of a diagnostic message.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
	/// Hook and reconciler tracing (`debug-hooks` builds only).
	Debug,
	/// Root lifecycle notes.
	Info,
	/// Recoverable oddities (suppressed errors, slow paths).
	Warn,
	/// Errors that reached the root unhandled.
	Error,
}

impl LogLevel {
	#[doc(hidden)]
	pub fn tag(self) -> &'static str {
		match self {
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}

/// Routes a formatted diagnostic to the browser console.
#[doc(hidden)]
#[cfg(all(debug_assertions, target_arch = "wasm32"))]
pub fn emit(level: LogLevel, message: fmt::Arguments<'_>) {
	let text = message.to_string().into();
	match level {
		LogLevel::Debug => web_sys::console::debug_1(&text),
		LogLevel::Info => web_sys::console::info_1(&text),
		LogLevel::Warn => web_sys::console::warn_1(&text),
		LogLevel::Error => web_sys::console::error_1(&text),
	}
}

/// Routes a formatted diagnostic to stderr.
#[doc(hidden)]
#[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
pub fn emit(level: LogLevel, message: fmt::Arguments<'_>) {
	eprintln!("fretwork:{} {}", level.tag(), message);
}

/// Release builds drop diagnostics entirely.
#[doc(hidden)]
#[cfg(not(debug_assertions))]
pub fn emit(_level: LogLevel, _message: fmt::Arguments<'_>) {}

/// Logs hook and reconciler tracing.
///
/// Compiled out unless the `debug-hooks` feature is enabled; with the
/// feature, messages reach the console in debug builds only.
#[macro_export]
#[cfg(feature = "debug-hooks")]
macro_rules! debug_log {
	($($arg:tt)*) => {
		$crate::logging::emit($crate::logging::LogLevel::Debug, ::core::format_args!($($arg)*))
	};
}

/// No-op without the `debug-hooks` feature.
#[macro_export]
#[cfg(not(feature = "debug-hooks"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs a root lifecycle note (debug builds only).
#[macro_export]
macro_rules! info_log {
	($($arg:tt)*) => {
		$crate::logging::emit($crate::logging::LogLevel::Info, ::core::format_args!($($arg)*))
	};
}

/// Logs a recoverable oddity (debug builds only).
#[macro_export]
macro_rules! warn_log {
	($($arg:tt)*) => {
		$crate::logging::emit($crate::logging::LogLevel::Warn, ::core::format_args!($($arg)*))
	};
}

/// Logs an error that reached the root unhandled (debug builds only).
#[macro_export]
macro_rules! error_log {
	($($arg:tt)*) => {
		$crate::logging::emit($crate::logging::LogLevel::Error, ::core::format_args!($($arg)*))
	};
}

#[cfg(test)]
mod tests {
	use crate::dom::Document;
	use crate::error::RenderError;
	use crate::hooks::use_state;
	use crate::props::Props;
	use crate::runtime::{render, unmount_component_at_node};
	use crate::view::{el, Component, Render, View};
	use serial_test::serial;

	fn chatty(_props: &Props) -> Render {
		let (count, _set_count) = use_state(|| 0);
		debug_log!("chatty rendered with count {}", count);
		Ok(el("p", None, View::from(count)))
	}

	#[test]
	#[serial]
	fn test_macros_usable_from_component_body() {
		let doc = Document::new();
		let container = doc.create_element("div", false);
		render(
			el(Component::new("Chatty", chatty), None, View::Empty),
			&container,
		)
		.unwrap();
		assert_eq!(container.inner_html(), "<p>0</p>");
		assert!(unmount_component_at_node(&container));
	}

	#[test]
	fn test_levels_format_crate_errors() {
		let error = RenderError::new("style prop rejected");
		warn_log!("suppressing subsequent render error: {}", error);
		error_log!("uncaught render error: {}", error);
		assert_eq!(error.message(), "style prop rejected");
	}

	#[test]
	fn test_level_tags() {
		use super::LogLevel;
		assert_eq!(LogLevel::Debug.tag(), "debug");
		assert_eq!(LogLevel::Info.tag(), "info");
		assert_eq!(LogLevel::Warn.tag(), "warn");
		assert_eq!(LogLevel::Error.tag(), "error");
	}
}
