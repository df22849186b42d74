use std::sync::Arc;

use scholar_domain::StrategyCatalog;
use scholar_service::ScholarService;
use scholar_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScholarService>,
}
impl AppState {
	/// Connects the vector store and loads the strategy catalog; either failing stops startup.
	pub fn new(config: scholar_config::Config) -> color_eyre::Result<Self> {
		let store = QdrantStore::new(&config.storage.qdrant)?;
		let catalog = StrategyCatalog::load(&config.essay.strategy_map_path)?;
		let service = ScholarService::new(config, Arc::new(store), catalog);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ScholarService) -> Self {
		Self { service: Arc::new(service) }
	}
}
