use crate::demo::{run_classify, run_demo, run_route, ClassifyArgs, RouteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use streetcheck::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "StreetCheck",
    about = "Route rough-sleeper reports to street outreach organisations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify weather conditions into a risk tier
    Classify(ClassifyArgs),
    /// Resolve the owning organisation for a single report location
    Route(RouteArgs),
    /// Run the reference routing scenarios through the intake service
    Demo,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Route(args) => run_route(args),
        Command::Demo => run_demo().await,
    }
}
