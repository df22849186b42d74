use std::{
	error::Error as StdError,
	io::{self, Read, Write},
	path::PathBuf,
	sync::Arc,
};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scholar_config::Config;
use scholar_domain::{CatalogError, StrategyCatalog};
use scholar_service::{EssayRequest, Error, MatchRequest, ScholarService, SeededSelector};
use scholar_storage::qdrant::QdrantStore;

/// Reads one JSON request from stdin and writes one JSON response to stdout.
#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Seed for strategy selection; omit for a fresh random choice per run.
	#[arg(long, value_name = "SEED")]
	pub seed: Option<u64>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
	/// Rank scholarships for a student profile.
	Match,
	/// Draft an essay for one scholarship.
	Essay,
}

/// Failures while wiring the service, before any request is handled.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("Failed to open the scholarship index.")]
	Storage(#[from] scholar_storage::Error),
	#[error("Failed to load the strategy map.")]
	Catalog(#[from] CatalogError),
}

/// Only a failed write to stdout is returned as an error; everything else ends up in the
/// response object.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scholar_config::load(&args.config);

	init_tracing(config.as_ref().map_or("info", |cfg| cfg.service.log_level.as_str()));

	let output = match config {
		Ok(config) => {
			let mut input = Vec::new();

			match io::stdin().lock().read_to_end(&mut input) {
				Ok(_) => execute(config, args.command, args.seed, &input).await,
				Err(err) => failure(&err),
			}
		},
		Err(err) => failure(&err),
	};

	write_response(&mut io::stdout().lock(), &output)?;

	Ok(())
}

/// Wires the service `command` needs and runs it on `input`.
pub async fn execute(config: Config, command: Command, seed: Option<u64>, input: &[u8]) -> Value {
	match build_service(config, command, seed) {
		Ok(service) => respond(&service, command, input).await,
		Err(err) => failure(&err),
	}
}

/// The strategy map is read only for `essay`; matching runs with an empty catalog.
pub fn build_service(
	config: Config,
	command: Command,
	seed: Option<u64>,
) -> Result<ScholarService, StartupError> {
	let catalog = match command {
		Command::Essay => StrategyCatalog::load(&config.essay.strategy_map_path)?,
		Command::Match => StrategyCatalog::default(),
	};
	let store = QdrantStore::new(&config.storage.qdrant)?;
	let service = ScholarService::new(config, Arc::new(store), catalog);

	Ok(match seed {
		Some(seed) => service.with_selector(Arc::new(SeededSelector::new(seed))),
		None => service,
	})
}

/// Runs `command` on the raw request bytes. Every failure, including input that is not UTF-8 or
/// not JSON, becomes an `{"error": ...}` object.
pub async fn respond(service: &ScholarService, command: Command, input: &[u8]) -> Value {
	let request_id = Uuid::new_v4();
	let result = match command {
		Command::Match => match parse_request::<MatchRequest>(input) {
			Ok(req) => service
				.match_scholarships(req)
				.instrument(tracing::info_span!("match_scholarships", %request_id))
				.await
				.and_then(|response| to_value(&response)),
			Err(err) => Err(err),
		},
		Command::Essay => match parse_request::<EssayRequest>(input) {
			Ok(req) => service
				.generate_essay(req)
				.instrument(tracing::info_span!("generate_essay", %request_id))
				.await
				.and_then(|result| to_value(&result)),
			Err(err) => Err(err),
		},
	};

	result.unwrap_or_else(|err| {
		tracing::error!(%request_id, error = %err, "Pipeline failed.");

		json!({ "error": err.to_string() })
	})
}

/// Writes `output` as a single line of JSON.
pub fn write_response<W>(writer: &mut W, output: &Value) -> io::Result<()>
where
	W: Write,
{
	serde_json::to_writer(&mut *writer, output)?;
	writeln!(writer)?;

	writer.flush()
}

fn parse_request<T>(input: &[u8]) -> Result<T, Error>
where
	T: DeserializeOwned,
{
	serde_json::from_slice(input).map_err(|err| Error::InvalidRequest {
		message: format!("Input is not a valid request: {err}"),
	})
}

fn to_value<T>(value: &T) -> Result<Value, Error>
where
	T: serde::Serialize,
{
	serde_json::to_value(value).map_err(|err| Error::MalformedResponse {
		message: format!("Result is not encodable: {err}"),
	})
}

/// `{"error": ...}` carrying the whole cause chain of `err`.
fn failure(err: &dyn StdError) -> Value {
	let mut message = err.to_string();
	let mut source = err.source();

	while let Some(cause) = source {
		message.push(' ');
		message.push_str(&cause.to_string());
		source = cause.source();
	}

	tracing::error!(error = %message, "Run failed before producing a result.");

	json!({ "error": message })
}

/// Logs go to stderr so stdout carries only the response.
fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
