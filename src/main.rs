//! Guildhall CLI - serve and inspect per-guild message archives

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use guildhall::config::{self, GuildhallConfig};
use guildhall::guild;
use guildhall::storage::GuildStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "guildhall")]
#[command(version = "0.1.0")]
#[command(about = "Read-only HTTP API over per-guild SQLite message archives")]
#[command(long_about = r#"
Guildhall serves the message archives written by the ingestion bot:
  • Guild discovery from a directory of .db files
  • Channel listing and recent messages per channel
  • User summaries and per-user profiles

Example usage:
  guildhall serve --databases ./databases --port 5001
  guildhall guilds
  guildhall channels myserver.db
  guildhall users myserver.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the guild database files
        #[arg(short, long)]
        databases: Option<PathBuf>,

        /// Directory with the built web frontend
        #[arg(short, long)]
        frontend: Option<PathBuf>,
    },

    /// List the guild databases in the archive directory
    Guilds {
        /// Directory holding the guild database files
        #[arg(short, long)]
        databases: Option<PathBuf>,
    },

    /// List the channels (tables) in one guild database
    Channels {
        /// Guild database filename, e.g. myserver.db
        guild_db: String,

        /// Directory holding the guild database files
        #[arg(short, long)]
        databases: Option<PathBuf>,
    },

    /// List users in one guild database with message totals
    Users {
        /// Guild database filename, e.g. myserver.db
        guild_db: String,

        /// Directory holding the guild database files
        #[arg(short, long)]
        databases: Option<PathBuf>,
    },

    /// Write a starter guildhall.toml config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn database_dir(flag: Option<PathBuf>, file_config: &GuildhallConfig) -> PathBuf {
    flag.or_else(|| file_config.databases.as_deref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_dir)
}

fn open_guild(dir: &PathBuf, guild_db: &str) -> anyhow::Result<GuildStore> {
    let db_path = dir.join(guild_db);
    if !db_path.exists() {
        anyhow::bail!("guild database not found: {}", db_path.display());
    }
    Ok(GuildStore::open(&db_path)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Serve { port, databases, frontend } => {
            let port = port.or(file_config.port).unwrap_or(config::DEFAULT_PORT);
            let databases = database_dir(databases, &file_config);
            let frontend = frontend
                .or_else(|| file_config.frontend.as_deref().map(PathBuf::from))
                .unwrap_or_else(config::default_frontend_dir);

            println!("🏰 Serving guild archives from {:?}", databases);
            guildhall::server::start_server(port, databases, frontend).await?;
        }

        Commands::Guilds { databases } => {
            let dir = database_dir(databases, &file_config);
            let guilds = guild::list_guilds(&dir)?;

            println!("📂 Guild databases in {:?}:", dir);
            for g in &guilds {
                println!("   {} ({})", g.name, g.db_file);
            }
            println!("\n{} guild database(s)", guilds.len());
        }

        Commands::Channels { guild_db, databases } => {
            let dir = database_dir(databases, &file_config);
            let store = open_guild(&dir, &guild_db)?;
            let tables = store.table_names()?;

            println!("📜 Channels in {}:", guild_db);
            for name in &tables {
                println!("   {}", name);
            }
            println!("\n{} channel(s)", tables.len());
        }

        Commands::Users { guild_db, databases } => {
            let dir = database_dir(databases, &file_config);
            let store = open_guild(&dir, &guild_db)?;
            let users = store.guild_users()?;

            println!("👥 Users in {}:", guild_db);
            for user in &users {
                println!("   {} ({}): {} message(s)", user.user_name, user.user_id, user.total_messages);
            }
            println!("\n{} user(s)", users.len());
        }

        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let starter = GuildhallConfig {
                databases: Some(config::default_database_dir().display().to_string()),
                port: Some(config::DEFAULT_PORT),
                frontend: Some(config::default_frontend_dir().display().to_string()),
            };
            config::write_config(&path, &starter, force)?;
            println!("📝 Wrote config to {}", path.display());
        }
    }

    Ok(())
}
