use std::sync::Arc;

use serde_json::{Value, json};

use scholar_domain::{RankedMatch, StudentProfile};
use scholar_service::{Error, MatchRequest, MatchResponse};
use scholar_testkit::{
	FixedSelector, InMemoryIndex, ScriptedGeneration, StubEmbedding, TestRig, record,
	sample_profile, structured_reply, test_config,
};

fn ok(text: &str) -> Result<String, String> {
	Ok(text.to_string())
}

fn request() -> MatchRequest {
	MatchRequest { student_profile: sample_profile() }
}

fn ids(matches: &[RankedMatch]) -> Vec<&str> {
	matches.iter().map(|m| m.record().id.as_str()).collect()
}

fn spread_index() -> InMemoryIndex {
	InMemoryIndex::new(vec![
		record("Alpha", 0.2, json!({})),
		record("Beta", 0.9, json!({})),
		record("Gamma", 1.1, json!({})),
		record("Delta", 0.5, json!({})),
	])
}

#[tokio::test]
async fn failed_rerank_falls_back_to_distance_order() {
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("A builder who turns compost into community."),
		Err("rerank unavailable".to_string()),
	]);
	let rig = TestRig::new(generation, spread_index());
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(ids(&response.matches), vec!["Alpha", "Delta", "Beta"]);
	assert_eq!(
		response.matches.iter().map(RankedMatch::match_score).collect::<Vec<_>>(),
		vec![80, 50, 10]
	);
	assert_eq!(response.matches.iter().map(RankedMatch::rank).collect::<Vec<_>>(), vec![1, 2, 3]);
	assert!(response.matches.iter().all(|m| m.reasoning().is_none()));
}

#[tokio::test]
async fn rerank_maps_positions_back_to_candidates() {
	let rankings = json!({
		"rankings": [
			{ "rank": 1, "scholarship_id": 3, "match_score": 88, "reasoning": "Service focus.",
				"key_strengths": ["composting"] },
			{ "rank": 2, "scholarship_id": 7, "match_score": 80 },
			{ "rank": 3, "scholarship_id": 1, "match_score": 64, "reasoning": "Solid fit." }
		]
	});
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		ok(&format!("```json\n{rankings}\n```")),
	]);
	let rig = TestRig::new(generation, spread_index());
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");
	let body = serde_json::to_value(&response).expect("Response must encode.");

	assert_eq!(ids(&response.matches), vec!["Beta", "Alpha"]);
	assert_eq!(body["matches"][0]["scholarship"], "Beta");
	assert_eq!(body["matches"][0]["rank"], 1);
	assert_eq!(body["matches"][0]["match_score"], 88);
	assert_eq!(body["matches"][0]["key_strengths"], json!(["composting"]));
	assert_eq!(body["matches"][1]["rank"], 2);
	assert_eq!(body["matches"][1]["reasoning"], "Solid fit.");
}

#[tokio::test]
async fn unknown_gpa_keeps_strict_scholarships() {
	let index = InMemoryIndex::new(vec![record("Strict", 0.3, json!({ "minimum_gpa": 3.9 }))]);
	let generation = ScriptedGeneration::new(vec![
		Err("structurer down".to_string()),
		ok("Narrative."),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, index);
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(ids(&response.matches), vec!["Strict"]);
}

#[tokio::test]
async fn known_gpa_below_minimum_is_filtered() {
	let index = InMemoryIndex::new(vec![
		record("Strict", 0.3, json!({ "minimum_gpa": 3.9 })),
		record("Open", 0.4, json!({ "minimum_gpa": "3.0" })),
	]);
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, index);
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(ids(&response.matches), vec!["Open"]);
}

#[tokio::test]
async fn embedding_failure_ends_with_no_matches() {
	let generation = ScriptedGeneration::new(vec![ok(&structured_reply()), ok("Narrative.")]);
	let rig = TestRig::new(generation, spread_index()).with_embedding(StubEmbedding::failing());
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert!(response.matches.is_empty());
	assert_eq!(rig.generation.calls(), 2);
	assert!(rig.index.limits().is_empty());
}

#[tokio::test]
async fn unavailable_store_ends_with_no_matches() {
	let generation = ScriptedGeneration::new(vec![ok(&structured_reply()), ok("Narrative.")]);
	let rig = TestRig::new(generation, InMemoryIndex::unavailable());
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert!(response.matches.is_empty());
	assert_eq!(rig.generation.calls(), 2);
}

#[tokio::test]
async fn enhancement_failure_embeds_the_raw_profile_twice() {
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		Err("enhancer down".to_string()),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, spread_index());
	let raw = sample_profile().render();

	rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(rig.embedding.inputs(), vec![format!("{raw}\n\n{raw}")]);
}

#[tokio::test]
async fn enhanced_profile_repeats_key_activities() {
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("  A builder who turns compost into community.  "),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, spread_index());

	rig.service().match_scholarships(request()).await.expect("Match failed.");

	let inputs = rig.embedding.inputs();
	let line = "Core strengths and activities: campus composting program | robotics captain";

	assert_eq!(inputs.len(), 1);
	assert!(inputs[0].starts_with("A builder who turns compost into community.\n\n"));
	assert_eq!(inputs[0].matches(line).count(), 2);
}

#[tokio::test]
async fn embedding_input_is_truncated() {
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok(&"long narrative ".repeat(100)),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, spread_index());
	let mut cfg = test_config();

	cfg.providers.embedding.max_input_chars = 50;

	let service = rig.service_with(cfg, Arc::new(FixedSelector(0)));

	service.match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(rig.embedding.inputs()[0].chars().count(), 50);
}

#[tokio::test]
async fn retrieval_overfetches_within_corpus_size() {
	let large = (0..100).map(|i| record(&format!("S{i}"), 0.3, json!({}))).collect();
	let generation = ScriptedGeneration::repeating(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, InMemoryIndex::new(large));
	let response = rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(rig.index.limits(), vec![45]);
	assert_eq!(response.matches.len(), 5);

	let generation = ScriptedGeneration::repeating(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, spread_index());

	rig.service().match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(rig.index.limits(), vec![4]);
}

#[tokio::test]
async fn calls_use_classification_and_drafting_parameters() {
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		ok(r#"{"rankings": []}"#),
	]);
	let rig = TestRig::new(generation, spread_index());

	rig.service().match_scholarships(request()).await.expect("Match failed.");

	let requests = rig.generation.requests();

	assert_eq!(requests.iter().map(|r| r.temperature).collect::<Vec<_>>(), vec![0.2, 0.7, 0.2]);
	assert_eq!(
		requests.iter().map(|r| r.max_tokens).collect::<Vec<_>>(),
		vec![500, 1_200, 2_000]
	);
	assert!(requests[2].prompt.contains("\"id\": 1"));
}

#[tokio::test]
async fn repeated_runs_are_identical_under_stubs() {
	let rankings = r#"{"rankings": [{"rank": 1, "scholarship_id": 2, "match_score": 71}]}"#;
	let generation = ScriptedGeneration::repeating(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		ok(rankings),
	]);
	let rig = TestRig::new(generation, spread_index());
	let service = rig.service();
	let first = service.match_scholarships(request()).await.expect("Match failed.");
	let second = service.match_scholarships(request()).await.expect("Match failed.");
	let encode =
		|value: MatchResponse| serde_json::to_string(&value).expect("Response must encode.");

	assert_eq!(encode(first), encode(second));
	assert_eq!(rig.embedding.inputs()[0], rig.embedding.inputs()[1]);
}

#[tokio::test]
async fn empty_profile_is_rejected_before_any_call() {
	let rig = TestRig::new(ScriptedGeneration::new(Vec::new()), spread_index());
	let err = rig
		.service()
		.match_scholarships(MatchRequest { student_profile: StudentProfile::default() })
		.await
		.expect_err("Empty profile must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(rig.generation.calls(), 0);
}

#[test]
fn request_reads_camel_case_profile() {
	let req: MatchRequest = serde_json::from_value(json!({
		"studentProfile": {
			"name": "Ada",
			"gpa": 3.2,
			"degreeLevel": "Graduate",
			"fieldOfStudy": "Physics",
			"backgroundStory": "Grew up near the coast."
		}
	}))
	.expect("Request must decode.");

	assert_eq!(req.student_profile.name, "Ada");
	assert_eq!(req.student_profile.field_of_study.as_deref(), Some("Physics"));

	let encoded = serde_json::to_value(&req).expect("Request must encode.");

	assert_eq!(encoded["studentProfile"]["gpa"], Value::from(3.2));
}

#[tokio::test]
async fn candidate_exactly_at_the_threshold_is_kept() {
	let index = InMemoryIndex::new(vec![
		record("Edge", 0.7, json!({})),
		record("Beyond", 0.71, json!({})),
	]);
	let generation = ScriptedGeneration::new(vec![
		ok(&structured_reply()),
		ok("Narrative."),
		Err("rerank down".to_string()),
	]);
	let rig = TestRig::new(generation, index);
	let mut cfg = test_config();

	cfg.matching.distance_threshold = 0.7;

	let service = rig.service_with(cfg, Arc::new(FixedSelector(0)));
	let response = service.match_scholarships(request()).await.expect("Match failed.");

	assert_eq!(ids(&response.matches), vec!["Edge"]);
}
