use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scholar_api::Args::parse();

	scholar_api::run(args).await
}
