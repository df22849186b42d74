use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use scholar_api::{routes, state::AppState};
use scholar_testkit::{InMemoryIndex, ScriptedGeneration, TestRig, record, structured_reply};

fn app(rig: &TestRig) -> axum::Router {
	routes::router(AppState::from_service(rig.service()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.expect("Failed to build request.")
}

async fn read_json(response: axum::response::Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Response body must be JSON.")
}

fn profile() -> Value {
	json!({
		"name": "Maya Torres",
		"gpa": 3.6,
		"degreeLevel": "undergraduate",
		"activities": "Founded a campus composting program."
	})
}

#[tokio::test]
async fn health_ok() {
	let rig = TestRig::new(ScriptedGeneration::new(Vec::new()), InMemoryIndex::new(Vec::new()));
	let response = app(&rig)
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn match_scholarships_returns_ranked_matches() {
	let generation = ScriptedGeneration::new(vec![
		Ok(structured_reply()),
		Ok("Narrative.".to_string()),
		Err("rerank down".to_string()),
	]);
	let index = InMemoryIndex::new(vec![
		record("Alpha", 0.25, json!({})),
		record("Beta", 0.5, json!({ "award_amount": "$2,000" })),
	]);
	let rig = TestRig::new(generation, index);
	let response = app(&rig)
		.oneshot(post_json("/api/match-scholarships", json!({ "studentProfile": profile() })))
		.await
		.expect("Failed to call match endpoint.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = read_json(response).await;

	assert_eq!(body["matches"][0]["scholarship"], "Alpha");
	assert_eq!(body["matches"][0]["match_score"], 75);
	assert_eq!(body["matches"][1]["rank"], 2);
	assert_eq!(body["matches"][1]["metadata"]["award_amount"], "$2,000");
}

#[tokio::test]
async fn generate_essay_returns_the_draft() {
	let generation = ScriptedGeneration::new(vec![
		Ok("[1]".to_string()),
		Ok("[1]".to_string()),
		Ok("My essay.".to_string()),
	]);
	let rig = TestRig::new(generation, InMemoryIndex::new(Vec::new()));
	let response = app(&rig)
		.oneshot(post_json(
			"/api/generate-essay",
			json!({
				"scholarshipDescription": "Community Service Award\nFor local volunteers.",
				"studentProfile": profile()
			}),
		))
		.await
		.expect("Failed to call essay endpoint.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = read_json(response).await;

	assert_eq!(body["essay"], "My essay.");
	assert_eq!(body["scholarship_name"], "Community Service Award");
	assert_eq!(body["selected_strategy"]["cluster_name"], "Community Catalyst");
	assert_eq!(body["matching_clusters"], json!(["Community Catalyst"]));
}

#[tokio::test]
async fn blank_description_is_a_bad_request() {
	let rig = TestRig::new(ScriptedGeneration::new(Vec::new()), InMemoryIndex::new(Vec::new()));
	let response = app(&rig)
		.oneshot(post_json(
			"/api/generate-essay",
			json!({ "scholarshipDescription": "   ", "studentProfile": profile() }),
		))
		.await
		.expect("Failed to call essay endpoint.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = read_json(response).await;

	let message = body["error"].as_str().expect("Error body must carry a message.");

	assert!(message.contains("scholarshipDescription"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request_with_error_body() {
	let rig = TestRig::new(ScriptedGeneration::new(Vec::new()), InMemoryIndex::new(Vec::new()));
	let response = app(&rig)
		.oneshot(post_json("/api/match-scholarships", json!({ "profile": "missing key" })))
		.await
		.expect("Failed to call match endpoint.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(read_json(response).await["error"].is_string());
}

#[tokio::test]
async fn pipeline_failure_is_reported_as_error_json() {
	let rig = TestRig::new(
		ScriptedGeneration::new(vec![Err("generation down".to_string())]),
		InMemoryIndex::new(Vec::new()),
	);
	let response = app(&rig)
		.oneshot(post_json(
			"/api/generate-essay",
			json!({ "scholarshipDescription": "Award.", "studentProfile": profile() }),
		))
		.await
		.expect("Failed to call essay endpoint.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

	let body = read_json(response).await;

	assert!(body["error"].as_str().is_some_and(|message| message.contains("generation down")));
}
