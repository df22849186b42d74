use serde::{Deserialize, Serialize};
use tracing::info;

use scholar_domain::{
	EssayResult, StagedExt, StrategyCluster, StudentProfile,
	essay::scholarship_name_from_description,
};

use crate::{Error, Result, ScholarService, clusters};

const MAX_TOKENS: u32 = 4_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayRequest {
	pub scholarship_description: String,
	pub student_profile: StudentProfile,
	#[serde(default)]
	pub scholarship_name: Option<String>,
}

impl ScholarService {
	/// Matches strategies to the description, keeps the ones the student can carry, picks one at
	/// random, and drafts the essay with it.
	pub async fn generate_essay(&self, req: EssayRequest) -> Result<EssayResult> {
		let description = req.scholarship_description.trim();

		if description.is_empty() {
			return Err(Error::InvalidRequest {
				message: "scholarshipDescription must be non-empty.".to_string(),
			});
		}

		crate::ensure_profile_present(&req.student_profile)?;

		let matched = self.match_clusters(description).await?;
		let filtered = self.filter_by_capability(&matched, &req.student_profile).await;
		let feasible = clusters::reinstate_top_match(filtered, &matched).settle();
		let selected = self.select_strategy(&feasible).cloned().ok_or_else(|| Error::NoStrategy {
			message: "No feasible strategy remained after filtering.".to_string(),
		})?;
		let essay = self.draft_essay(description, &req.student_profile, &selected).await?;
		let scholarship_name = req
			.scholarship_name
			.map(|name| name.trim().to_string())
			.filter(|name| !name.is_empty())
			.unwrap_or_else(|| scholarship_name_from_description(description));

		info!(
			cluster_id = selected.cluster_id,
			feasible = feasible.len(),
			words = essay.split_whitespace().count(),
			"Essay drafted."
		);

		Ok(EssayResult {
			essay,
			selected_strategy: selected,
			matching_clusters: matched.iter().map(StrategyCluster::display_name).collect(),
			scholarship_name,
		})
	}

	/// Uniform choice among `feasible` through the configured selector.
	pub fn select_strategy<'a>(
		&self,
		feasible: &'a [StrategyCluster],
	) -> Option<&'a StrategyCluster> {
		if feasible.is_empty() {
			return None;
		}

		let index = self.selector.pick(feasible.len()).min(feasible.len() - 1);

		feasible.get(index)
	}

	/// One drafting call; the answer is returned trimmed and otherwise unchecked.
	pub async fn draft_essay(
		&self,
		description: &str,
		profile: &StudentProfile,
		strategy: &StrategyCluster,
	) -> Result<String> {
		let prompt = build_draft_prompt(description, profile, strategy);
		let text = self.draft(prompt, MAX_TOKENS).await?;
		let essay = text.trim();

		if essay.is_empty() {
			return Err(Error::MalformedResponse { message: "Drafted essay is empty.".to_string() });
		}

		Ok(essay.to_string())
	}
}

fn build_draft_prompt(
	description: &str,
	profile: &StudentProfile,
	strategy: &StrategyCluster,
) -> String {
	format!(
		"Write a scholarship essay for the student below.\n\
\n\
Scholarship description:\n\
{description}\n\
\n\
Student profile:\n\
{profile}\n\
\n\
Strategy: {name}\n\
{instructions}\n\
\n\
Structural template:\n\
{template}\n\
\n\
Requirements:\n\
- Write in the first person as the student.\n\
- Length: 500 to 650 words.\n\
- Follow the structural template section by section.\n\
- Use only experiences found in the profile; do not invent achievements.\n\
- Output only the essay text with no title, heading, or preamble.",
		profile = profile.to_prompt_json(),
		name = strategy.display_name(),
		instructions = strategy.writing_strategy.broad_instructions,
		template = strategy.writing_strategy.structural_template,
	)
}
