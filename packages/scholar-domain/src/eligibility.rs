use serde::{Deserialize, Deserializer, Serialize};

use crate::scholarship::ScholarshipMetadata;

pub const MAX_KEY_ACTIVITIES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
	HighSchool,
	Undergraduate,
	Graduate,
	#[default]
	Unknown,
}
impl DegreeLevel {
	/// Lenient parse of free-form labels such as "High School", "undergrad", or "graduate
	/// students". Anything unrecognized is `Unknown`.
	pub fn parse(raw: &str) -> Self {
		let normalized = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");

		if normalized.contains("high school") || normalized.contains("highschool") {
			Self::HighSchool
		} else if normalized.contains("undergrad") {
			Self::Undergraduate
		} else if normalized.contains("grad") {
			Self::Graduate
		} else {
			Self::Unknown
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::HighSchool => "high school",
			Self::Undergraduate => "undergraduate",
			Self::Graduate => "graduate",
			Self::Unknown => "unknown",
		}
	}

	pub fn is_known(self) -> bool {
		self != Self::Unknown
	}
}
impl<'de> Deserialize<'de> for DegreeLevel {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = Option::<String>::deserialize(deserializer)?;

		Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
	}
}

/// The compact, typed subset of a profile used for rule-based filtering.
///
/// Fields the extraction could not establish stay `None`/`Unknown`; nothing is guessed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredEligibility {
	pub gpa: Option<f64>,
	pub degree_level: DegreeLevel,
	pub field_of_study: Option<String>,
	pub citizenship: Option<String>,
	pub age: Option<u32>,
	pub key_activities: Vec<String>,
}
impl StructuredEligibility {
	/// The conservative all-unknown record used whenever extraction fails.
	pub fn unknown() -> Self {
		Self::default()
	}

	/// Builds a record from extracted values, dropping anything that cannot be trusted.
	pub fn new(
		gpa: Option<f64>,
		degree_level: DegreeLevel,
		field_of_study: Option<String>,
		citizenship: Option<String>,
		age: Option<u32>,
		key_activities: Vec<String>,
	) -> Self {
		let key_activities = key_activities
			.into_iter()
			.map(|activity| activity.trim().to_string())
			.filter(|activity| !activity.is_empty())
			.take(MAX_KEY_ACTIVITIES)
			.collect();

		Self {
			gpa: gpa.filter(|value| value.is_finite() && *value >= 0.0),
			degree_level,
			field_of_study: non_blank(field_of_study),
			citizenship: non_blank(citizenship),
			age,
			key_activities,
		}
	}

	/// Applies the hard metadata filters in order and reports the first one that rejects.
	pub fn check(&self, metadata: &ScholarshipMetadata) -> Result<(), Rejection> {
		if !self.meets_minimum_gpa(metadata) {
			return Err(Rejection::Gpa);
		}
		if !self.degree_level_compatible(metadata) {
			return Err(Rejection::DegreeLevel);
		}

		Ok(())
	}

	/// Only evaluated when both sides are known; an unparsable minimum passes.
	pub fn meets_minimum_gpa(&self, metadata: &ScholarshipMetadata) -> bool {
		match (self.gpa, metadata.minimum_gpa()) {
			(Some(gpa), Some(minimum)) => gpa >= minimum,
			_ => true,
		}
	}

	/// Rejects only an undergraduate-only award for a graduate student and a graduate award for a
	/// high-school student.
	pub fn degree_level_compatible(&self, metadata: &ScholarshipMetadata) -> bool {
		let levels = metadata.degree_level_set();

		if levels.is_empty() || !self.degree_level.is_known() {
			return true;
		}
		if levels.contains(&self.degree_level) {
			return true;
		}

		let undergraduate_for_graduate = levels.contains(&DegreeLevel::Undergraduate)
			&& self.degree_level == DegreeLevel::Graduate;
		let graduate_for_high_school =
			levels.contains(&DegreeLevel::Graduate) && self.degree_level == DegreeLevel::HighSchool;

		!(undergraduate_for_graduate || graduate_for_high_school)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
	Distance,
	Gpa,
	DegreeLevel,
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}
