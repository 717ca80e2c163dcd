use clap::Parser;
use tracing::error;
use wa_gateway::cli::Cli;
use wa_gateway::logging;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = wa_gateway::run(cli).await {
		error!(target = "wa.gateway", error = %format!("{err:#}"), "gateway failed");
		std::process::exit(1);
	}
}
