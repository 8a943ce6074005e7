//! Render errors and their propagation shape.
//!
//! User code signals failure by returning a [`RenderError`] from a component
//! body, an effect body, or an effect cleanup. The reconciler walks the
//! ancestor chain for the nearest error boundary; an uncaught error tears the
//! root down and surfaces from the entry point that triggered the work.

use std::fmt;
use std::rc::Rc;

/// An error raised by user code during render, an effect body, or a cleanup,
/// or by the host adapter while applying properties.
#[derive(Debug, Clone)]
pub struct RenderError {
	message: String,
	source: Option<Rc<dyn std::error::Error>>,
}

impl RenderError {
	/// Creates an error from a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	/// Creates an error wrapping an underlying cause.
	pub fn with_source(
		message: impl Into<String>,
		source: impl std::error::Error + 'static,
	) -> Self {
		Self {
			message: message.into(),
			source: Some(Rc::new(source)),
		}
	}

	/// The error message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl fmt::Display for RenderError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.message)
	}
}

impl std::error::Error for RenderError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source.as_deref().map(|e| e as _)
	}
}

impl From<String> for RenderError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

impl From<&str> for RenderError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}
