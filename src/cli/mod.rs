pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "service-catalog")]
#[command(about = "Service Catalog API server and maintenance commands")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Override the configured port")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Mint a development JWT signed with the configured secret")]
    Token {
        #[arg(long, help = "Tenant id the token grants access to")]
        tenant: uuid::Uuid,
        #[arg(long, help = "User id (random when omitted)")]
        user: Option<uuid::Uuid>,
        #[arg(long, help = "Lifetime in hours (defaults to the configured expiry)")]
        hours: Option<u64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::config().clone();

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::Token { tenant, user, hours, output } => {
            commands::token::handle(&config, tenant, user, hours, output)
        }
    }
}
