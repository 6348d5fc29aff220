//! Human-friendly duration strings (`"60s"`, `"1m30s"`) in config files,
//! parsed with the same crates the upstream gateway uses for the same job.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `Duration` that (de)serializes from/to a Go-style duration string
/// instead of a nanosecond integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl From<Duration> for HumanDuration {
	fn from(d: Duration) -> Self {
		HumanDuration(d)
	}
}

impl From<HumanDuration> for Duration {
	fn from(d: HumanDuration) -> Self {
		d.0
	}
}

impl Serialize for HumanDuration {
	fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
		s.serialize_str(&durationfmt::to_string(self.0.as_nanos() as i64))
	}
}

impl<'de> Deserialize<'de> for HumanDuration {
	fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		let s = String::deserialize(d)?;
		let nanos = go_parse_duration::parse_duration(&s)
			.map_err(|e| serde::de::Error::custom(format!("invalid duration {s:?}: {e:?}")))?;
		Ok(HumanDuration(Duration::from_nanos(nanos as u64)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_seconds() {
		let d: HumanDuration = serde_json::from_str("\"60s\"").unwrap();
		assert_eq!(d.0, Duration::from_secs(60));
	}

	#[test]
	fn round_trips() {
		let d = HumanDuration(Duration::from_secs(90));
		let s = serde_json::to_string(&d).unwrap();
		let back: HumanDuration = serde_json::from_str(&s).unwrap();
		assert_eq!(back.0, d.0);
	}
}
