//! Loads a binary's typed config from an optional YAML path, falling back
//! to `T::default()` for local manual testing when no path is given.

use std::path::Path;

use serde::de::DeserializeOwned;

/// Reads and parses a YAML config file. Absent a path, returns the type's
/// default -- argument parsing beyond "one optional path" is out of scope.
pub fn load<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
	match path {
		Some(path) => {
			let contents = fs_err::read_to_string(path)?;
			Ok(serde_yaml::from_str(&contents)?)
		},
		None => Ok(T::default()),
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;
	use tempfile::NamedTempFile;

	use super::*;

	#[derive(Debug, Default, Deserialize, PartialEq)]
	struct Example {
		#[serde(default)]
		name: String,
	}

	#[test]
	fn missing_path_uses_default() {
		let cfg: Example = load(None).unwrap();
		assert_eq!(cfg, Example::default());
	}

	#[test]
	fn reads_yaml_file() {
		let mut f = NamedTempFile::new().unwrap();
		std::io::Write::write_all(&mut f, b"name: foo").unwrap();
		let cfg: Example = load(Some(f.path())).unwrap();
		assert_eq!(cfg.name, "foo");
	}
}
