use tracing::{debug, warn};

use scholar_domain::{Fallback, FallbackReason, Staged, StructuredEligibility};

use crate::ScholarService;

const MAX_TOKENS: u32 = 1_200;
const STRENGTHS_LABEL: &str = "Core strengths and activities";
const STRENGTHS_REPEAT: usize = 2;

impl ScholarService {
	/// Rewrites the profile as a retrieval-oriented narrative and appends the key activities
	/// twice so they carry more weight in the embedding.
	///
	/// Falls back to the raw profile doubled when generation fails.
	pub async fn enhance_profile(
		&self,
		raw_profile: &str,
		eligibility: &StructuredEligibility,
	) -> Staged<String> {
		let prompt = build_enhance_prompt(raw_profile);
		let narrative = match self.draft(prompt, MAX_TOKENS).await {
			Ok(text) => text,
			Err(err) => {
				warn!(error = %err, "Profile enhancement failed; using the raw profile.");

				return Err(Fallback::new(
					double_raw(raw_profile),
					crate::fallback_reason(&err),
				));
			},
		};
		let narrative = narrative.trim();

		if narrative.is_empty() {
			warn!("Profile enhancement returned no text; using the raw profile.");

			return Err(Fallback::new(double_raw(raw_profile), FallbackReason::Empty));
		}

		let enhanced = weight_profile(narrative, &eligibility.key_activities);

		debug!(chars = enhanced.chars().count(), "Enhanced student profile.");

		Ok(enhanced)
	}
}

/// Narrative followed by the key activities line repeated, or the narrative alone when there
/// are no activities.
pub fn weight_profile(narrative: &str, key_activities: &[String]) -> String {
	if key_activities.is_empty() {
		return narrative.to_string();
	}

	let strengths = format!("{STRENGTHS_LABEL}: {}", key_activities.join(" | "));
	let mut out = String::from(narrative);

	out.push_str("\n\n");

	for _ in 0..STRENGTHS_REPEAT {
		out.push_str(&strengths);
		out.push('\n');
	}

	out
}

fn double_raw(raw_profile: &str) -> String {
	format!("{raw_profile}\n\n{raw_profile}")
}

fn build_enhance_prompt(raw_profile: &str) -> String {
	format!(
		"Rewrite the student profile below as a single narrative paragraph written for matching \
against scholarship descriptions.\n\
\n\
Emphasize, in this order:\n\
1. Leadership roles and initiatives the student started or led\n\
2. Community service and the values behind it\n\
3. Projects the student built or carried through\n\
4. Concrete skills\n\
5. Passions and long-term interests\n\
6. Character traits shown through the story\n\
7. Academic achievements\n\
\n\
Use vocabulary that scholarship committees use when describing the students they fund. \
Do not invent facts that are not in the profile. Return only the narrative.\n\
\n\
Student profile:\n\
{raw_profile}"
	)
}
