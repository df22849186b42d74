use serde::Serialize;

use crate::scholarship::ScholarshipRecord;

pub const MAX_MATCH_SCORE: i64 = 100;

/// One reranked scholarship as reported to the caller.
///
/// Only [`RankedMatch::rank_all`] builds these, which keeps ranks dense from 1 and scores within
/// 0-100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
	#[serde(flatten)]
	record: ScholarshipRecord,
	rank: u32,
	match_score: u8,
	#[serde(skip_serializing_if = "Option::is_none")]
	reasoning: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	key_strengths: Vec<String>,
}
impl RankedMatch {
	/// Assigns ranks `1..=n` in the given order and clamps every score into range.
	pub fn rank_all(drafts: Vec<RankingDraft>) -> Vec<Self> {
		drafts
			.into_iter()
			.zip(1_u32..)
			.map(|(draft, rank)| Self {
				record: draft.record,
				rank,
				match_score: draft.match_score.clamp(0, MAX_MATCH_SCORE) as u8,
				reasoning: draft.reasoning.filter(|text| !text.trim().is_empty()),
				key_strengths: draft.key_strengths,
			})
			.collect()
	}

	/// Distance-only ordering used when qualitative reranking is unavailable.
	pub fn rank_by_distance(records: &[ScholarshipRecord], k: usize) -> Vec<Self> {
		let drafts = records
			.iter()
			.take(k)
			.map(|record| RankingDraft {
				match_score: distance_score(record.distance),
				record: record.clone(),
				reasoning: None,
				key_strengths: Vec::new(),
			})
			.collect();

		Self::rank_all(drafts)
	}

	pub fn record(&self) -> &ScholarshipRecord {
		&self.record
	}

	pub fn rank(&self) -> u32 {
		self.rank
	}

	pub fn match_score(&self) -> u8 {
		self.match_score
	}

	pub fn reasoning(&self) -> Option<&str> {
		self.reasoning.as_deref()
	}

	pub fn key_strengths(&self) -> &[String] {
		&self.key_strengths
	}
}

/// Unvalidated ranking entry; becomes a [`RankedMatch`] through [`RankedMatch::rank_all`].
#[derive(Debug, Clone)]
pub struct RankingDraft {
	pub record: ScholarshipRecord,
	pub match_score: i64,
	pub reasoning: Option<String>,
	pub key_strengths: Vec<String>,
}

/// `round((1 - distance) * 100)`, clamped to the score range.
pub fn distance_score(distance: f64) -> i64 {
	let score = ((1.0 - distance) * 100.0).round();

	if score.is_nan() { 0 } else { (score as i64).clamp(0, MAX_MATCH_SCORE) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scholarship::ScholarshipMetadata;

	fn record(id: &str, distance: f64) -> ScholarshipRecord {
		ScholarshipRecord {
			id: id.to_string(),
			distance,
			url: "N/A".to_string(),
			full_text: String::new(),
			metadata: ScholarshipMetadata::default(),
		}
	}

	#[test]
	fn ranks_are_dense_and_scores_clamped() {
		let drafts = vec![
			RankingDraft {
				record: record("a", 0.1),
				match_score: 140,
				reasoning: Some("Strong fit.".to_string()),
				key_strengths: vec!["leadership".to_string()],
			},
			RankingDraft {
				record: record("b", 0.2),
				match_score: -3,
				reasoning: Some("   ".to_string()),
				key_strengths: Vec::new(),
			},
		];
		let ranked = RankedMatch::rank_all(drafts);

		assert_eq!(ranked.iter().map(RankedMatch::rank).collect::<Vec<_>>(), vec![1, 2]);
		assert_eq!(ranked[0].match_score(), 100);
		assert_eq!(ranked[1].match_score(), 0);
		assert_eq!(ranked[1].reasoning(), None);
	}

	#[test]
	fn distance_ranking_scores_from_distance() {
		let records = vec![record("a", 0.2), record("b", 0.5), record("c", 0.9)];
		let ranked = RankedMatch::rank_by_distance(&records, 2);

		assert_eq!(ranked.len(), 2);
		assert_eq!(ranked[0].match_score(), 80);
		assert_eq!(ranked[1].match_score(), 50);
		assert_eq!(ranked[1].record().id, "b");
	}

	#[test]
	fn serializes_record_fields_alongside_rank() {
		let ranked = RankedMatch::rank_by_distance(&[record("a", 0.25)], 5);
		let value = serde_json::to_value(&ranked[0]).expect("Match must encode.");

		assert_eq!(value["scholarship"], "a");
		assert_eq!(value["rank"], 1);
		assert_eq!(value["match_score"], 75);
		assert!(value.get("reasoning").is_none());
	}
}
