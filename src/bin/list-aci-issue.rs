use clap::Parser;
use list_aci_issue::cli::{commands, Cli, Commands};
use list_aci_issue::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        None => commands::execute_run(cli.azure, Default::default()).await,
        Some(Commands::Run(args)) => commands::execute_run(cli.azure, args).await,
        Some(Commands::List(args)) => commands::execute_list(cli.azure, args).await,
        Some(Commands::DeleteGroup(args)) => commands::execute_delete_group(cli.azure, args).await,
        Some(Commands::Cleanup(args)) => commands::execute_cleanup(cli.azure, args).await,
        Some(Commands::Init(args)) => commands::execute_init(cli.azure, args),
    }
}
