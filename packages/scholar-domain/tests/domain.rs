use std::{env, fs};

use serde_json::json;

use scholar_domain::{
	CatalogError, DegreeLevel, RankedMatch, ScholarshipMetadata, ScholarshipRecord,
	StrategyCatalog, StructuredEligibility, StudentProfile,
};

fn catalog_json(ids: &[i64]) -> String {
	let clusters = ids
		.iter()
		.map(|id| {
			json!({
				"cluster_id": id,
				"description_archetype": format!("Archetype {id}"),
				"writing_strategy": {
					"broad_instructions": "Tell one story.",
					"structural_template": "Hook, story, future."
				}
			})
		})
		.collect::<Vec<_>>();

	serde_json::to_string(&clusters).expect("Catalog must encode.")
}

#[test]
fn catalog_rejects_duplicates_and_empty_maps() {
	let duplicated = StrategyCatalog::from_json(&catalog_json(&[1, 2, 1]));

	assert!(matches!(duplicated, Err(CatalogError::DuplicateId(1))));
	assert!(matches!(StrategyCatalog::from_json("[]"), Err(CatalogError::Empty)));
	assert!(matches!(StrategyCatalog::from_json("{}"), Err(CatalogError::Parse(_))));
}

#[test]
fn catalog_loads_from_file_and_names_unnamed_clusters() {
	let path = env::temp_dir().join(format!("scholar_catalog_{}.json", std::process::id()));

	fs::write(&path, catalog_json(&[7, 3])).expect("Failed to write catalog.");

	let catalog = StrategyCatalog::load(&path).expect("Catalog must load.");

	fs::remove_file(&path).expect("Failed to remove catalog.");

	assert_eq!(catalog.len(), 2);
	assert_eq!(catalog.get(3).map(|cluster| cluster.display_name()), Some("Cluster 3".to_string()));
	assert!(catalog.get(4).is_none());
}

#[test]
fn missing_catalog_file_is_a_read_error() {
	let path = env::temp_dir().join("scholar_catalog_missing.json");

	assert!(matches!(StrategyCatalog::load(&path), Err(CatalogError::Read { .. })));
}

#[test]
fn undergraduate_awards_are_not_read_as_graduate() {
	let metadata: ScholarshipMetadata =
		serde_json::from_value(json!({ "degree_levels": "Undergraduate students only" }))
			.expect("Metadata must decode.");
	let undergraduate =
		StructuredEligibility { degree_level: DegreeLevel::Undergraduate, ..Default::default() };
	let high_school =
		StructuredEligibility { degree_level: DegreeLevel::HighSchool, ..Default::default() };

	assert_eq!(metadata.degree_level_set(), vec![DegreeLevel::Undergraduate]);
	assert!(undergraduate.degree_level_compatible(&metadata));
	assert!(high_school.degree_level_compatible(&metadata));
}

#[test]
fn profile_renders_missing_values_as_not_available() {
	let profile: StudentProfile = serde_json::from_value(json!({
		"name": "Ada",
		"degreeLevel": "high_school",
		"careerGoals": "Build bridges."
	}))
	.expect("Profile must decode.");
	let rendered = profile.render();

	assert_eq!(profile.degree_level, DegreeLevel::HighSchool);
	assert!(rendered.starts_with("Name: Ada\nGPA: N/A\nDegree Level: high school\n"));
	assert!(rendered.contains("Career Goals:\nBuild bridges."));
	assert!(rendered.contains("Challenges Overcome:\nN/A"));
}

#[test]
fn record_round_trips_through_the_output_shape() {
	let record: ScholarshipRecord = serde_json::from_value(json!({
		"id": "Coastal Award",
		"distance": 0.42,
		"url": "https://example.org/coastal",
		"full_text": "For marine science students.",
		"metadata": { "award_amount": 1500, "deadline": "March 1" }
	}))
	.expect("Record must decode.");
	let ranked = RankedMatch::rank_by_distance(&[record], 5);
	let value = serde_json::to_value(&ranked[0]).expect("Match must encode.");

	assert_eq!(value["scholarship"], "Coastal Award");
	assert_eq!(value["match_score"], 58);
	assert_eq!(value["metadata"]["award_amount"], "1500");
	assert_eq!(value["metadata"]["deadline"], "March 1");
}
