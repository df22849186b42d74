use std::collections::HashMap;

use qdrant_client::qdrant::{PointId, Value, point_id::PointIdOptions, value::Kind};
use serde_json::{Map, Number};

use scholar_domain::{ScholarshipMetadata, ScholarshipRecord};

use crate::{Error, Result};

const ID_KEYS: [&str; 2] = ["scholarship", "name"];
const TEXT_KEYS: [&str; 2] = ["full_text", "document"];
const METADATA_KEY: &str = "metadata";
const URL_KEY: &str = "url";
const MISSING_URL: &str = "N/A";

/// Builds a record from a point's payload.
///
/// The payload either nests metadata under `metadata` or keeps it flat next to the id and text
/// keys; both layouts are read.
pub fn record_from_payload(
	point_id: Option<&PointId>,
	payload: HashMap<String, Value>,
	distance: f64,
) -> Result<ScholarshipRecord> {
	let mut fields = payload
		.into_iter()
		.map(|(key, value)| (key, value_to_json(value)))
		.collect::<Map<String, serde_json::Value>>();
	let id = take_text(&mut fields, &ID_KEYS)
		.or_else(|| point_id.and_then(point_id_text))
		.ok_or_else(|| {
			Error::InvalidPayload("Point has no scholarship name or id.".to_string())
		})?;
	let full_text = take_text(&mut fields, &TEXT_KEYS).unwrap_or_default();
	let metadata_json = match fields.remove(METADATA_KEY) {
		Some(serde_json::Value::Object(mut nested)) => {
			if let Some(url) = fields.remove(URL_KEY) {
				nested.entry(URL_KEY).or_insert(url);
			}

			nested
		},
		_ => fields,
	};
	let metadata: ScholarshipMetadata =
		serde_json::from_value(serde_json::Value::Object(metadata_json))
			.map_err(|err| Error::InvalidPayload(format!("Metadata is not decodable: {err}")))?;
	let url = metadata.url.clone().unwrap_or_else(|| MISSING_URL.to_string());

	Ok(ScholarshipRecord { id, distance, url, full_text, metadata })
}

pub fn value_to_json(value: Value) -> serde_json::Value {
	match value.kind {
		None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
		Some(Kind::BoolValue(flag)) => serde_json::Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => serde_json::Value::from(number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
		Some(Kind::StringValue(text)) => serde_json::Value::String(text),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object.fields.into_iter().map(|(key, value)| (key, value_to_json(value))).collect(),
		),
	}
}

fn take_text(fields: &mut Map<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
	for key in keys {
		if let Some(serde_json::Value::String(text)) = fields.get(*key)
			&& !text.trim().is_empty()
		{
			let text = text.clone();

			fields.remove(*key);

			return Some(text);
		}
	}

	None
}

fn point_id_text(point_id: &PointId) -> Option<String> {
	match point_id.point_id_options.as_ref()? {
		PointIdOptions::Num(number) => Some(number.to_string()),
		PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
	}
}
