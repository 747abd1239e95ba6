//! Environment variable access behind a trait so configuration can be
//! loaded from the process environment or from a test map.

use std::cell::RefCell;
use std::collections::HashMap;

/// Read-only view of environment variables.
pub trait EnvSource {
	/// Returns the value of `key`, treating unset and empty as absent.
	fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
	fn var(&self, key: &str) -> Option<String> {
		std::env::var(key).ok().filter(|value| !value.trim().is_empty())
	}
}

/// Variables held in memory, for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemoryEnv {
	vars: RefCell<HashMap<String, String>>,
}

impl MemoryEnv {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);
		self
	}

	pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
		self.vars.borrow_mut().insert(key.into(), value.into());
	}

	pub fn remove(&self, key: &str) {
		self.vars.borrow_mut().remove(key);
	}
}

impl EnvSource for MemoryEnv {
	fn var(&self, key: &str) -> Option<String> {
		self.vars.borrow().get(key).filter(|value| !value.trim().is_empty()).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_values_read_as_absent() {
		let env = MemoryEnv::new().with("EDWIX_APP_URL", "  ");
		assert_eq!(env.var("EDWIX_APP_URL"), None);
	}

	#[test]
	fn remove_clears_value() {
		let env = MemoryEnv::new().with("A", "1");
		assert_eq!(env.var("A").as_deref(), Some("1"));
		env.remove("A");
		assert_eq!(env.var("A"), None);
	}
}
