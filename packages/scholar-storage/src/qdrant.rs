use qdrant_client::qdrant::{CountPointsBuilder, Query, QueryPointsBuilder};

use scholar_domain::ScholarshipRecord;

use crate::{Error, Result, payload};

/// How the collection's similarity scores map onto a dissimilarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
	Cosine,
	Dot,
	Euclid,
}
impl DistanceMetric {
	pub fn parse(raw: &str) -> Result<Self> {
		match raw {
			"cosine" => Ok(Self::Cosine),
			"dot" => Ok(Self::Dot),
			"euclid" => Ok(Self::Euclid),
			other => Err(Error::UnknownMetric(other.to_string())),
		}
	}

	/// Squared L2 distance between unit vectors, lower is closer.
	///
	/// Similarity scores map through `|a - b|^2 = 2 * (1 - cos)`, so `matching.distance_threshold`
	/// keeps the same meaning across metrics: 0.0 is identical, 2.0 is orthogonal.
	pub fn to_distance(self, score: f32) -> f64 {
		let score = f64::from(score);

		match self {
			Self::Cosine | Self::Dot => (2.0 * (1.0 - score)).max(0.0),
			Self::Euclid => score.max(0.0).powi(2),
		}
	}
}

/// Read-only handle on the pre-populated scholarship collection.
pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_name: Option<String>,
	pub metric: DistanceMetric,
}
impl QdrantStore {
	pub fn new(cfg: &scholar_config::Qdrant) -> Result<Self> {
		let metric = DistanceMetric::parse(&cfg.distance)?;
		// The server version check prints to stdout on failure; the CLI owns stdout.
		let client = qdrant_client::Qdrant::from_url(&cfg.url).skip_compatibility_check().build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_name: cfg.vector_name.clone(),
			metric,
		})
	}

	pub async fn count(&self) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(self.collection.clone()).exact(true)).await?;

		response.result.map(|result| result.count).ok_or_else(|| {
			Error::Unavailable(format!("Count on {} returned no result.", self.collection))
		})
	}

	/// Nearest records to `vector`, closest first. Points whose payload cannot be decoded are
	/// an error rather than being skipped.
	pub async fn nearest(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<ScholarshipRecord>> {
		if limit == 0 {
			return Ok(Vec::new());
		}

		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(limit);

		if let Some(name) = self.vector_name.as_deref() {
			query = query.using(name);
		}

		let response = self.client.query(query).await?;
		let mut records = Vec::with_capacity(response.result.len());

		for point in response.result {
			let distance = self.metric.to_distance(point.score);

			records.push(payload::record_from_payload(point.id.as_ref(), point.payload, distance)?);
		}

		Ok(records)
	}
}
