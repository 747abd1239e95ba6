use serde::{Deserialize, Serialize};

/// Active property context selected in the host shell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
	pub id: String,
	pub name: String,
}

impl Property {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
		}
	}
}
