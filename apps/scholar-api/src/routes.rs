use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tracing::Instrument;
use uuid::Uuid;

use scholar_domain::EssayResult;
use scholar_service::{EssayRequest, Error, ErrorResponse, MatchRequest, MatchResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/match-scholarships", post(match_scholarships))
		.route("/api/generate-essay", post(generate_essay))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn match_scholarships(
	State(state): State<AppState>,
	payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
	let Json(payload) = payload?;
	let span = tracing::info_span!("match_scholarships", request_id = %Uuid::new_v4());
	let response = state.service.match_scholarships(payload).instrument(span).await?;

	Ok(Json(response))
}

async fn generate_essay(
	State(state): State<AppState>,
	payload: Result<Json<EssayRequest>, JsonRejection>,
) -> Result<Json<EssayResult>, ApiError> {
	let Json(payload) = payload?;
	let span = tracing::info_span!("generate_essay", request_id = %Uuid::new_v4());
	let response = state.service.generate_essay(payload).instrument(span).await?;

	Ok(Json(response))
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let status = match &err {
			Error::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
			Error::Provider { .. }
			| Error::MalformedResponse { .. }
			| Error::Storage { .. }
			| Error::NoStrategy { .. } => {
				tracing::error!(error = %err, "Pipeline failed.");

				StatusCode::INTERNAL_SERVER_ERROR
			},
		};

		Self::new(status, err.to_string())
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, format!("Invalid request: {}", rejection.body_text()))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorResponse { error: self.message })).into_response()
	}
}
