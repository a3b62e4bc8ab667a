//! Folio CLI
//!
//! Command-line front end for Folio: browse the portfolio, manage content as
//! the admin, and use the AI assists.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_core::{Config, Folio};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - a live developer portfolio backed by a hosted store")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a view: portfolio (default), admin, privacy or terms
    View {
        /// Address fragment such as "#admin"
        fragment: Option<String>,
    },
    /// Print the full synchronized snapshot
    Snapshot,
    /// Follow the snapshot as the store changes
    Watch,
    /// Sign in as the admin
    Login {
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an admin account
    Signup {
        email: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show connection, session and AI status
    Status,
    /// Send a message through the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Message (prefilled when --service is given)
        #[arg(short, long)]
        message: Option<String>,
        /// Ask about a service by title
        #[arg(long)]
        service: Option<String>,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage the lead inbox
    Lead {
        #[command(subcommand)]
        command: LeadCommands,
    },
    /// Blog tools
    Blog {
        #[command(subcommand)]
        command: BlogCommands,
    },
    /// Rewrite experience bullet points to read more impactfully
    Improve {
        /// Bullet points, one per line
        text: String,
    },
    /// Show or change site settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Import experience, projects and achievements from a resume
    ImportResume {
        /// PDF or image of the resume
        path: PathBuf,
    },
    /// Ask the portfolio assistant (interactive when no question is given)
    Chat { question: Option<String> },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects (public ones unless --all)
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        all: bool,
    },
    /// Hide a project from the public site
    Hide { id: String },
    /// Make a project visible
    Show { id: String },
    /// Mark a project as featured
    Feature { id: String },
    /// Remove the featured mark
    Unfeature { id: String },
    /// Delete a project
    #[command(alias = "rm")]
    Delete { id: String },
    /// Suggest a tech stack for a description
    SuggestStack { description: String },
}

#[derive(Subcommand)]
enum LeadCommands {
    /// List leads, newest first
    #[command(alias = "ls")]
    List,
    /// Toggle a lead between new and read
    Toggle { id: String },
    /// Delete a lead
    #[command(alias = "rm")]
    Delete { id: String },
    /// Draft a reply to a lead
    DraftReply {
        id: String,
        /// Name to sign the reply with
        #[arg(long)]
        signer: Option<String>,
    },
}

#[derive(Subcommand)]
enum BlogCommands {
    /// Draft a post body for a title
    Generate {
        title: String,
        #[arg(short, long)]
        tag: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
enum SettingsCommands {
    /// Show site settings
    Show,
    /// Set one site setting
    Set { key: String, value: String },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, store_url, store_key, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Blog {
            command: BlogCommands::Generate { title, tag },
        } => return commands::assist::blog(&config, title, tag, &output).await,
        Commands::Project {
            command: ProjectCommands::SuggestStack { description },
        } => return commands::assist::suggest_stack(&config, description, &output).await,
        Commands::Improve { text } => {
            return commands::assist::improve(&config, text, &output).await
        }
        _ => {}
    }

    if !config.is_store_configured() {
        anyhow::bail!(
            "Store not configured. Set it with:\n  \
             folio config set store_url https://<project>.supabase.co\n  \
             folio config set store_key <anon key>"
        );
    }

    let live = matches!(cli.command, Commands::Watch);
    let app = Folio::connect(&config, live)?;

    let result = match cli.command {
        Commands::View { fragment } => commands::view::render(&app, fragment, &output).await,
        Commands::Snapshot => commands::view::snapshot(&app, &output).await,
        Commands::Watch => commands::view::watch(&app, &output).await,
        Commands::Login { email, password } => {
            commands::account::login(&app, email, password, &output).await
        }
        Commands::Signup { email, password } => {
            commands::account::signup(&app, email, password, &output).await
        }
        Commands::Logout => commands::account::logout(&app, &output).await,
        Commands::Status => commands::status::show(&app, &output).await,
        Commands::Contact {
            name,
            email,
            message,
            service,
        } => commands::contact::send(&app, name, email, message, service, &output).await,
        Commands::Project { command } => handle_project_command(command, &app, &output).await,
        Commands::Lead { command } => handle_lead_command(command, &app, &output).await,
        Commands::Settings { command } => match command {
            Some(SettingsCommands::Show) | None => commands::settings::show(&app, &output).await,
            Some(SettingsCommands::Set { key, value }) => {
                commands::settings::set(&app, key, value, &output).await
            }
        },
        Commands::ImportResume { path } => {
            commands::assist::import_resume(&app, path, &output).await
        }
        Commands::Chat { question } => commands::chat::run(&app, question, &output).await,
        // Handled above
        Commands::Blog { .. } | Commands::Improve { .. } | Commands::Config { .. } => Ok(()),
    };

    app.shutdown();
    result
}

async fn handle_project_command(
    command: ProjectCommands,
    app: &Folio,
    output: &Output,
) -> Result<()> {
    use commands::project;

    match command {
        ProjectCommands::List { all } => project::list(app, all, output).await,
        ProjectCommands::Hide { id } => project::set_visible(app, id, false, output).await,
        ProjectCommands::Show { id } => project::set_visible(app, id, true, output).await,
        ProjectCommands::Feature { id } => project::set_featured(app, id, true, output).await,
        ProjectCommands::Unfeature { id } => project::set_featured(app, id, false, output).await,
        ProjectCommands::Delete { id } => project::delete(app, id, output).await,
        // Handled before connecting
        ProjectCommands::SuggestStack { .. } => Ok(()),
    }
}

async fn handle_lead_command(command: LeadCommands, app: &Folio, output: &Output) -> Result<()> {
    use commands::lead;

    match command {
        LeadCommands::List => lead::list(app, output).await,
        LeadCommands::Toggle { id } => lead::toggle(app, id, output).await,
        LeadCommands::Delete { id } => lead::delete(app, id, output).await,
        LeadCommands::DraftReply { id, signer } => {
            commands::assist::draft_reply(app, id, signer, output).await
        }
    }
}

/// Install the tracing subscriber when FOLIO_LOG is set
///
/// Logs go to `log_file` when configured, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("FOLIO_LOG") else {
        return;
    };
    // A bare level applies to our crates only
    let directives = if log_level.contains('=') {
        log_level.clone()
    } else {
        format!("folio_core={},folio={}", log_level, log_level)
    };
    let env_filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new("folio_core=info,folio=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match config.log_file {
        Some(ref path) => match File::create(path) {
            Ok(file) => {
                let _ = builder.with_ansi(false).with_writer(file).try_init();
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }

    info!("Logging initialized at level {}", log_level);
}
