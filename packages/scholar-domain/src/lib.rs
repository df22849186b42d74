pub mod eligibility;
pub mod essay;
pub mod payload;
pub mod profile;
pub mod ranking;
pub mod scholarship;
pub mod staged;
pub mod strategy;

pub use eligibility::{DegreeLevel, Rejection, StructuredEligibility};
pub use essay::EssayResult;
pub use payload::PayloadError;
pub use profile::StudentProfile;
pub use ranking::{RankedMatch, RankingDraft};
pub use scholarship::{ScholarshipMetadata, ScholarshipRecord};
pub use staged::{Fallback, FallbackReason, Staged, StagedExt};
pub use strategy::{CatalogError, StrategyCatalog, StrategyCluster, WritingStrategy};
