use tracing::{info, warn};

use scholar_domain::{Fallback, Rejection, ScholarshipRecord, Staged, StructuredEligibility};
use scholar_providers::embedding::truncate_chars;

use crate::{Error, ScholarService};

/// Candidates rejected by each filter, in the order the filters run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
	pub distance: usize,
	pub gpa: usize,
	pub degree_level: usize,
}

/// Filtered, distance-sorted candidates plus what it took to get them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
	pub candidates: Vec<ScholarshipRecord>,
	pub fetched: usize,
	pub filtered: FilterCounts,
}

impl ScholarService {
	/// Embeds the enhanced profile, over-fetches nearest neighbours, and keeps the `k` closest
	/// that pass the distance threshold and the eligibility rules.
	///
	/// An embedding or vector store failure yields an empty retrieval.
	pub async fn retrieve_candidates(
		&self,
		enhanced_profile: &str,
		eligibility: &StructuredEligibility,
		k: usize,
		distance_threshold: f64,
	) -> Staged<Retrieval> {
		match self.fetch_nearest(enhanced_profile, k).await {
			Ok(records) => {
				let retrieval = filter_candidates(records, eligibility, k, distance_threshold);

				info!(
					fetched = retrieval.fetched,
					kept = retrieval.candidates.len(),
					rejected_distance = retrieval.filtered.distance,
					rejected_gpa = retrieval.filtered.gpa,
					rejected_degree_level = retrieval.filtered.degree_level,
					"Retrieved scholarship candidates."
				);

				Ok(retrieval)
			},
			Err(err) => {
				warn!(error = %err, "Candidate retrieval failed; continuing with no candidates.");

				Err(Fallback::new(Retrieval::default(), crate::fallback_reason(&err)))
			},
		}
	}

	async fn fetch_nearest(
		&self,
		enhanced_profile: &str,
		k: usize,
	) -> Result<Vec<ScholarshipRecord>, Error> {
		let cfg = &self.cfg.providers.embedding;
		let input = truncate_chars(enhanced_profile, cfg.max_input_chars);
		let vector = self.providers.embedding.embed(cfg, input).await?;
		let corpus_size = self.index.count().await?;
		let limit = overfetch_limit(k, self.cfg.matching.overfetch_factor, corpus_size);

		if limit == 0 {
			return Ok(Vec::new());
		}

		Ok(self.index.nearest(vector, limit).await?)
	}
}

/// `min(k * factor, corpus_size)`.
pub fn overfetch_limit(k: usize, factor: u32, corpus_size: u64) -> u64 {
	let k = u64::try_from(k).unwrap_or(u64::MAX);

	k.saturating_mul(u64::from(factor)).min(corpus_size)
}

/// Applies the distance threshold, then the eligibility rules, then sorts ascending by distance
/// and keeps the first `k`.
pub fn filter_candidates(
	records: Vec<ScholarshipRecord>,
	eligibility: &StructuredEligibility,
	k: usize,
	distance_threshold: f64,
) -> Retrieval {
	let fetched = records.len();
	let mut filtered = FilterCounts::default();
	let mut candidates = Vec::with_capacity(fetched.min(k));

	for record in records {
		let verdict = if record.distance <= distance_threshold {
			eligibility.check(&record.metadata)
		} else {
			Err(Rejection::Distance)
		};

		match verdict {
			Ok(()) => candidates.push(record),
			Err(Rejection::Distance) => filtered.distance += 1,
			Err(Rejection::Gpa) => filtered.gpa += 1,
			Err(Rejection::DegreeLevel) => filtered.degree_level += 1,
		}
	}

	candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
	candidates.truncate(k);

	Retrieval { candidates, fetched, filtered }
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use scholar_domain::DegreeLevel;

	fn record(id: &str, distance: f64, metadata: serde_json::Value) -> ScholarshipRecord {
		ScholarshipRecord {
			id: id.to_string(),
			distance,
			url: "N/A".to_string(),
			full_text: String::new(),
			metadata: serde_json::from_value(metadata).expect("Metadata must decode."),
		}
	}

	#[test]
	fn threshold_rejects_and_sorts_survivors() {
		let records = vec![
			record("a", 0.2, json!({})),
			record("b", 0.9, json!({})),
			record("c", 1.1, json!({})),
			record("d", 0.5, json!({})),
		];
		let retrieval = filter_candidates(records, &StructuredEligibility::unknown(), 15, 1.0);
		let ids = retrieval.candidates.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, vec!["a", "d", "b"]);
		assert_eq!(retrieval.fetched, 4);
		assert_eq!(retrieval.filtered.distance, 1);
	}

	#[test]
	fn unknown_gpa_skips_the_gpa_filter() {
		let records = vec![record("strict", 0.3, json!({ "minimum_gpa": "3.9" }))];
		let retrieval = filter_candidates(records, &StructuredEligibility::unknown(), 15, 1.0);

		assert_eq!(retrieval.candidates.len(), 1);
	}

	#[test]
	fn counts_rule_rejections_separately() {
		let eligibility = StructuredEligibility::new(
			Some(3.0),
			DegreeLevel::Graduate,
			None,
			None,
			None,
			Vec::new(),
		);
		let records = vec![
			record("gpa", 0.1, json!({ "minimum_gpa": 3.5 })),
			record("degree", 0.2, json!({ "degree_levels": "undergraduate" })),
			record("ok", 0.3, json!({ "minimum_gpa": "2.5", "degree_levels": "graduate" })),
		];
		let retrieval = filter_candidates(records, &eligibility, 15, 1.0);

		assert_eq!(retrieval.candidates.len(), 1);
		assert_eq!(retrieval.candidates[0].id, "ok");
		assert_eq!(retrieval.filtered, FilterCounts { distance: 0, gpa: 1, degree_level: 1 });
	}

	#[test]
	fn keeps_at_most_k() {
		let records =
			(0..10).map(|i| record(&i.to_string(), f64::from(i) / 20.0, json!({}))).collect();
		let retrieval = filter_candidates(records, &StructuredEligibility::unknown(), 3, 1.0);

		assert_eq!(retrieval.candidates.len(), 3);
		assert_eq!(retrieval.candidates[2].id, "2");
	}

	#[test]
	fn overfetch_is_capped_by_corpus() {
		assert_eq!(overfetch_limit(15, 3, 1_000), 45);
		assert_eq!(overfetch_limit(15, 3, 20), 20);
		assert_eq!(overfetch_limit(15, 3, 0), 0);
	}
}
