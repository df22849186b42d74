use serde::{Deserialize, Serialize};

use crate::eligibility::DegreeLevel;

const MISSING: &str = "N/A";

/// Caller-supplied profile. Immutable input to a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub gpa: Option<f64>,
	#[serde(default)]
	pub degree_level: DegreeLevel,
	#[serde(default)]
	pub field_of_study: Option<String>,
	#[serde(default)]
	pub citizenship: Option<String>,
	#[serde(default)]
	pub age: Option<u32>,
	#[serde(default)]
	pub activities: Option<String>,
	#[serde(default)]
	pub background_story: Option<String>,
	#[serde(default)]
	pub career_goals: Option<String>,
	#[serde(default)]
	pub challenges: Option<String>,
}
impl StudentProfile {
	/// The raw profile text block handed to the structurer and the enhancer.
	pub fn render(&self) -> String {
		let name = if self.name.trim().is_empty() { MISSING } else { self.name.trim() };
		let gpa = self.gpa.map(|gpa| gpa.to_string()).unwrap_or_else(|| MISSING.to_string());
		let degree_level =
			if self.degree_level.is_known() { self.degree_level.label() } else { MISSING };
		let age = self.age.map(|age| age.to_string()).unwrap_or_else(|| MISSING.to_string());

		format!(
			"Name: {name}\n\
GPA: {gpa}\n\
Degree Level: {degree_level}\n\
Field of Study: {field}\n\
Citizenship: {citizenship}\n\
Age: {age}\n\
\n\
Activities & Involvement:\n{activities}\n\
\n\
Background Story:\n{background}\n\
\n\
Career Goals:\n{goals}\n\
\n\
Challenges Overcome:\n{challenges}",
			field = text_or_missing(&self.field_of_study),
			citizenship = text_or_missing(&self.citizenship),
			activities = text_or_missing(&self.activities),
			background = text_or_missing(&self.background_story),
			goals = text_or_missing(&self.career_goals),
			challenges = text_or_missing(&self.challenges),
		)
	}

	/// Pretty JSON of the profile as the caller sent it, used by the essay prompts.
	pub fn to_prompt_json(&self) -> String {
		serde_json::to_string_pretty(self).unwrap_or_else(|_| self.render())
	}
}

fn text_or_missing(value: &Option<String>) -> &str {
	value.as_deref().map(str::trim).filter(|text| !text.is_empty()).unwrap_or(MISSING)
}
