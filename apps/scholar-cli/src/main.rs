use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scholar_cli::Args::parse();

	scholar_cli::run(args).await
}
