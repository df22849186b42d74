use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use scholar_domain::{
	Fallback, FallbackReason, RankedMatch, RankingDraft, ScholarshipRecord, Staged,
	StructuredEligibility, payload,
};

use crate::{Error, ScholarService};

const MAX_TOKENS: u32 = 2_000;
const MISSING: &str = "N/A";

#[derive(Debug, Deserialize)]
struct RerankPayload {
	rankings: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
	scholarship_id: Value,
	#[serde(default, deserialize_with = "payload::lenient_number")]
	rank: Option<f64>,
	#[serde(default, deserialize_with = "payload::lenient_number")]
	match_score: Option<f64>,
	#[serde(default)]
	reasoning: Option<String>,
	#[serde(default)]
	key_strengths: Vec<String>,
}

impl ScholarService {
	/// Asks the model for a qualitative ranking of `candidates` and maps it back onto the
	/// records by 1-based position.
	///
	/// Any failure, or a ranking with no usable entries, falls back to distance order with
	/// distance-derived scores.
	pub async fn rerank_candidates(
		&self,
		enhanced_profile: &str,
		eligibility: &StructuredEligibility,
		candidates: &[ScholarshipRecord],
		k: usize,
	) -> Staged<Vec<RankedMatch>> {
		if candidates.is_empty() {
			return Ok(Vec::new());
		}

		let prompt = build_rerank_prompt(enhanced_profile, eligibility, candidates);
		let decoded = self.classify(prompt, MAX_TOKENS).await.and_then(|text| {
			payload::decode_payload::<RerankPayload>(&text).map_err(Error::from)
		});
		let rankings = match decoded {
			Ok(payload) => payload.rankings,
			Err(err) => {
				warn!(error = %err, "Reranking failed; falling back to distance order.");

				return Err(Fallback::new(
					RankedMatch::rank_by_distance(candidates, k),
					crate::fallback_reason(&err),
				));
			},
		};
		let mut drafts = map_rankings(&rankings, candidates);

		if drafts.is_empty() {
			warn!(
				entries = rankings.len(),
				"Reranking produced no usable entries; falling back to distance order."
			);

			return Err(Fallback::new(
				RankedMatch::rank_by_distance(candidates, k),
				FallbackReason::Empty,
			));
		}

		drafts.truncate(k);

		info!(kept = drafts.len(), entries = rankings.len(), "Reranked scholarship candidates.");

		Ok(RankedMatch::rank_all(drafts))
	}
}

/// Resolves ranking entries against `candidates`, ordered by the model's stated rank.
///
/// Entries that do not decode, point outside `1..=candidates.len()`, or repeat an id already
/// taken are dropped.
pub fn map_rankings(entries: &[Value], candidates: &[ScholarshipRecord]) -> Vec<RankingDraft> {
	let mut seen = HashSet::new();
	let mut resolved = Vec::with_capacity(entries.len().min(candidates.len()));

	for (position, raw) in entries.iter().enumerate() {
		let entry = match serde_json::from_value::<RankingEntry>(raw.clone()) {
			Ok(entry) => entry,
			Err(err) => {
				debug!(position, error = %err, "Dropping undecodable ranking entry.");

				continue;
			},
		};
		let Some(index) = candidate_index(&entry.scholarship_id, candidates.len()) else {
			debug!(position, id = %entry.scholarship_id, "Dropping out-of-range ranking entry.");

			continue;
		};

		let Some(match_score) = entry.match_score else {
			debug!(position, "Dropping ranking entry without a match score.");

			continue;
		};

		if !seen.insert(index) {
			continue;
		}

		resolved.push((entry.rank.unwrap_or(f64::MAX), match_score, entry, index));
	}

	resolved.sort_by(|a, b| a.0.total_cmp(&b.0));

	resolved
		.into_iter()
		.map(|(_, match_score, entry, index)| RankingDraft {
			record: candidates[index].clone(),
			match_score: match_score.round() as i64,
			reasoning: entry.reasoning,
			key_strengths: entry
				.key_strengths
				.into_iter()
				.map(|strength| strength.trim().to_string())
				.filter(|strength| !strength.is_empty())
				.collect(),
		})
		.collect()
}

/// Zero-based index for a 1-based id.
fn candidate_index(id: &Value, len: usize) -> Option<usize> {
	let id = payload::integral_from_value(id)?;
	let index = usize::try_from(id).ok()?.checked_sub(1)?;

	(index < len).then_some(index)
}

fn build_rerank_prompt(
	enhanced_profile: &str,
	eligibility: &StructuredEligibility,
	candidates: &[ScholarshipRecord],
) -> String {
	let candidates_json = candidates
		.iter()
		.zip(1_usize..)
		.map(|(record, id)| candidate_json(record, id))
		.collect::<Vec<_>>();
	let candidates_json =
		serde_json::to_string_pretty(&candidates_json).unwrap_or_else(|_| "[]".to_string());
	let gpa = eligibility.gpa.map(|gpa| gpa.to_string()).unwrap_or_else(|| MISSING.to_string());
	let degree_level = if eligibility.degree_level.is_known() {
		eligibility.degree_level.label()
	} else {
		MISSING
	};
	let field = eligibility.field_of_study.as_deref().unwrap_or(MISSING);
	let activities = if eligibility.key_activities.is_empty() {
		MISSING.to_string()
	} else {
		eligibility.key_activities.join(", ")
	};

	format!(
		"You are ranking scholarships for one student. Judge how well each candidate fits the \
student, weighing these criteria from most to least important:\n\
1. Fit between the student's activities and the scholarship's emphasis areas\n\
2. Fit between the student's values and the scholarship's mission\n\
3. Leadership and demonstrated impact\n\
4. Eligibility details such as field of study and degree level\n\
5. GPA\n\
\n\
Student:\n\
GPA: {gpa}\n\
Degree level: {degree_level}\n\
Field of study: {field}\n\
Key activities: {activities}\n\
\n\
Student narrative:\n\
{enhanced_profile}\n\
\n\
Candidates (refer to each by its id):\n\
{candidates_json}\n\
\n\
Return only JSON of this shape, best match first:\n\
{{\"rankings\": [{{\"rank\": 1, \"scholarship_id\": <candidate id>, \"match_score\": <0-100>, \
\"reasoning\": \"<one or two sentences>\", \"key_strengths\": [\"<strength>\"]}}]}}"
	)
}

fn candidate_json(record: &ScholarshipRecord, id: usize) -> Value {
	let metadata = &record.metadata;
	let field = |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING.to_string());

	json!({
		"id": id,
		"name": record.id,
		"distance": (record.distance * 10_000.0).round() / 10_000.0,
		"url": record.url,
		"description": record.full_text,
		"minimum_gpa": field(&metadata.minimum_gpa),
		"degree_levels": field(&metadata.degree_levels),
		"fields_of_study": field(&metadata.fields_of_study),
		"emphasis_areas": field(&metadata.emphasis_areas),
		"values_mission": field(&metadata.values_mission),
		"award_amount": field(&metadata.award_amount),
	})
}
