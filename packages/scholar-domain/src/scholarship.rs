use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::eligibility::DegreeLevel;

/// A scholarship returned by the vector store. Read-only: the pipeline filters and copies
/// records but never changes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipRecord {
	#[serde(rename = "scholarship", alias = "id")]
	pub id: String,
	/// Dissimilarity reported by the store; lower is closer.
	pub distance: f64,
	pub url: String,
	pub full_text: String,
	pub metadata: ScholarshipMetadata,
}

/// Known metadata keys are decoded into text regardless of whether the store kept them as
/// strings, numbers, or lists. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipMetadata {
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub minimum_gpa: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub degree_levels: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub fields_of_study: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub emphasis_areas: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub values_mission: Option<String>,
	#[serde(default, deserialize_with = "flexible_text", skip_serializing_if = "Option::is_none")]
	pub award_amount: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl ScholarshipMetadata {
	/// `None` when the field is absent or not a plain number.
	pub fn minimum_gpa(&self) -> Option<f64> {
		self.minimum_gpa
			.as_deref()
			.and_then(|raw| raw.trim().parse::<f64>().ok())
			.filter(|value| value.is_finite())
	}

	/// Recognized degree levels named by the scholarship. Unrecognized entries are ignored, so
	/// an empty set means "not specified".
	pub fn degree_level_set(&self) -> Vec<DegreeLevel> {
		let Some(raw) = self.degree_levels.as_deref() else {
			return Vec::new();
		};
		let lowered = raw.to_ascii_lowercase().replace(" and ", ",").replace(" or ", ",");
		let mut levels = Vec::new();

		for part in lowered.split([',', ';', '/', '|']) {
			let level = DegreeLevel::parse(part);

			if level.is_known() && !levels.contains(&level) {
				levels.push(level);
			}
		}

		levels
	}
}

fn flexible_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;

	Ok(value_to_text(&value))
}

fn value_to_text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Array(items) => {
			let parts = items.iter().filter_map(value_to_text).collect::<Vec<_>>();

			if parts.is_empty() { None } else { Some(parts.join(", ")) }
		},
		Value::Object(_) => Some(value.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn decodes_mixed_metadata_shapes() {
		let meta: ScholarshipMetadata = serde_json::from_value(json!({
			"minimum_gpa": 3.5,
			"degree_levels": ["Undergraduate", "Graduate"],
			"award_amount": "$5,000",
			"deadline": "2026-03-01"
		}))
		.expect("Metadata must decode.");

		assert_eq!(meta.minimum_gpa.as_deref(), Some("3.5"));
		assert_eq!(meta.minimum_gpa(), Some(3.5));
		assert_eq!(meta.degree_levels.as_deref(), Some("Undergraduate, Graduate"));
		assert_eq!(meta.extra.get("deadline"), Some(&json!("2026-03-01")));
	}

	#[test]
	fn degree_set_splits_common_separators() {
		let meta = ScholarshipMetadata {
			degree_levels: Some("High School and Undergraduate / graduate".to_string()),
			..Default::default()
		};

		assert_eq!(
			meta.degree_level_set(),
			vec![DegreeLevel::HighSchool, DegreeLevel::Undergraduate, DegreeLevel::Graduate]
		);
	}

	#[test]
	fn undergraduate_alone_does_not_imply_graduate() {
		let meta = ScholarshipMetadata {
			degree_levels: Some("undergraduate".to_string()),
			..Default::default()
		};

		assert_eq!(meta.degree_level_set(), vec![DegreeLevel::Undergraduate]);
	}

	#[test]
	fn record_serializes_id_as_scholarship() {
		let record = ScholarshipRecord {
			id: "Future Leaders Award".to_string(),
			distance: 0.25,
			url: "https://example.org".to_string(),
			full_text: "Rewards leadership.".to_string(),
			metadata: ScholarshipMetadata::default(),
		};
		let value = serde_json::to_value(&record).expect("Record must encode.");

		assert_eq!(value["scholarship"], json!("Future Leaders Award"));
		assert!(value["metadata"].as_object().is_some_and(|map| map.is_empty()));
	}
}
