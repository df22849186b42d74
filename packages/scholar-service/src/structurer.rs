use serde::Deserialize;
use tracing::{debug, warn};

use scholar_domain::{
	DegreeLevel, Fallback, Staged, StructuredEligibility, eligibility::MAX_KEY_ACTIVITIES, payload,
};

use crate::{Error, ScholarService};

const MAX_TOKENS: u32 = 500;

#[derive(Debug, Deserialize)]
struct ExtractedEligibility {
	#[serde(default, deserialize_with = "payload::lenient_number")]
	gpa: Option<f64>,
	#[serde(default)]
	degree_level: DegreeLevel,
	#[serde(default)]
	field_of_study: Option<String>,
	#[serde(default)]
	citizenship: Option<String>,
	#[serde(default, deserialize_with = "payload::lenient_number")]
	age: Option<f64>,
	key_activities: Vec<String>,
}

impl ScholarService {
	/// Extracts the hard-filter fields from the rendered profile.
	///
	/// Any generation or decoding failure degrades to [`StructuredEligibility::unknown`], which
	/// makes every rule filter pass.
	pub async fn structure_profile(&self, raw_profile: &str) -> Staged<StructuredEligibility> {
		let result = match self.classify(build_structure_prompt(raw_profile), MAX_TOKENS).await {
			Ok(text) => payload::decode_payload::<ExtractedEligibility>(&text).map_err(Error::from),
			Err(err) => Err(err),
		};

		match result {
			Ok(extracted) => {
				let eligibility = extracted.into_eligibility();

				debug!(
					gpa = ?eligibility.gpa,
					degree_level = eligibility.degree_level.label(),
					activities = eligibility.key_activities.len(),
					"Structured student profile."
				);

				Ok(eligibility)
			},
			Err(err) => {
				warn!(error = %err, "Profile structuring failed; treating eligibility as unknown.");

				Err(Fallback::new(StructuredEligibility::unknown(), crate::fallback_reason(&err)))
			},
		}
	}
}

impl ExtractedEligibility {
	fn into_eligibility(self) -> StructuredEligibility {
		let age = self
			.age
			.filter(|age| age.is_finite() && *age >= 0.0 && age.fract() == 0.0)
			.and_then(|age| u32::try_from(age as u64).ok());

		StructuredEligibility::new(
			self.gpa,
			self.degree_level,
			self.field_of_study,
			self.citizenship,
			age,
			self.key_activities,
		)
	}
}

fn build_structure_prompt(raw_profile: &str) -> String {
	format!(
		"Extract structured eligibility data from the student profile below.\n\
\n\
Return only a JSON object with exactly these keys:\n\
- \"gpa\": the GPA as a number, or null if it is not stated\n\
- \"degree_level\": one of \"high school\", \"undergraduate\", \"graduate\", or null\n\
- \"field_of_study\": the intended or current major as a string, or null\n\
- \"citizenship\": citizenship or residency status as a string, or null\n\
- \"age\": age in years as an integer, or null\n\
- \"key_activities\": a list of at most {MAX_KEY_ACTIVITIES} short phrases naming the student's \
most significant activities, achievements, or experiences\n\
\n\
Use null for anything the profile does not state. Do not guess.\n\
\n\
Student profile:\n\
{raw_profile}"
	)
}
