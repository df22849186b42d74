use serde::{Deserialize, Serialize};
use tracing::info;

use scholar_domain::{RankedMatch, StagedExt, StudentProfile};

use crate::{Result, ScholarService};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
	pub student_profile: StudentProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
	pub matches: Vec<RankedMatch>,
}

impl ScholarService {
	/// Runs structuring, enhancement, retrieval, and reranking in sequence.
	///
	/// Stage failures degrade rather than abort, so the only error is an empty profile. When no
	/// candidate survives retrieval the result is an empty list.
	pub async fn match_scholarships(&self, req: MatchRequest) -> Result<MatchResponse> {
		crate::ensure_profile_present(&req.student_profile)?;

		let matching = &self.cfg.matching;
		let retrieve_k = matching.retrieve_k as usize;
		let rerank_k = matching.rerank_k as usize;
		let raw_profile = req.student_profile.render();
		let eligibility = self.structure_profile(&raw_profile).await.settle();
		let enhanced = self.enhance_profile(&raw_profile, &eligibility).await.settle();
		let retrieval = self
			.retrieve_candidates(&enhanced, &eligibility, retrieve_k, matching.distance_threshold)
			.await
			.settle();

		if retrieval.candidates.is_empty() {
			info!(fetched = retrieval.fetched, "No scholarship candidates survived retrieval.");

			return Ok(MatchResponse { matches: Vec::new() });
		}

		let ranked = self
			.rerank_candidates(&enhanced, &eligibility, &retrieval.candidates, rerank_k)
			.await;
		let degraded = ranked.is_degraded();
		let matches = ranked.settle();

		info!(matches = matches.len(), degraded, "Scholarship matching finished.");

		Ok(MatchResponse { matches })
	}
}
