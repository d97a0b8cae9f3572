use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bindery::config::AppConfig;
use bindery::logging;
use bindery::models::NewCustomer;
use bindery::registry::{ChemicalPatch, NewChemical};

mod cmd;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version, about = "GHS safety binder publisher: customer configs, GitHub Pages deploys, local dashboard")]
pub struct Cli {
    /// Path to bindery.toml (defaults to ./bindery.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for local state (customer configs, PDFs, uploads)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish one customer's binder site from an explicit config file
    Deploy {
        /// Path to the customer's JSON config
        config_file: PathBuf,
    },
    /// List registered customers with chemical counts and deploy status
    List,
    /// Register a new customer
    New {
        /// Company name; the slug and repository name derive from it
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        emergency: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Logo filename under the customer's asset directory
        #[arg(long)]
        logo: Option<String>,
        #[arg(long)]
        primary_color: Option<String>,
        #[arg(long)]
        secondary_color: Option<String>,
        /// Serve the site from this domain instead of *.github.io
        #[arg(long)]
        custom_domain: Option<String>,
    },
    /// Delete a customer: the GitHub repository, then the local config
    Delete {
        slug: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Manage a customer's chemical list
    Chem {
        #[command(subcommand)]
        command: ChemCommands,
    },
    /// Report missing and orphaned PDFs, per customer
    Files {
        /// Limit the report to one customer
        slug: Option<String>,
    },
    /// Run the local dashboard server
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "4170")]
        port: u16,

        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,

        /// Dev mode: permissive CORS and bind on all interfaces
        #[arg(long)]
        dev: bool,
    },
}

#[derive(Subcommand)]
pub enum ChemCommands {
    /// Add a chemical (re-adding the same name updates it in place)
    Add {
        slug: String,
        #[arg(long)]
        name: String,
        /// Product literature PDF filename
        #[arg(long)]
        literature: String,
        /// Safety Data Sheet PDF filename
        #[arg(long)]
        sds: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        hazards: String,
        #[arg(long, default_value = "")]
        supplier: String,
        /// Save without republishing the site
        #[arg(long)]
        no_deploy: bool,
    },
    /// Deactivate a chemical; the record stays in the config
    Remove {
        slug: String,
        id: String,
        #[arg(long)]
        no_deploy: bool,
    },
    /// Update fields of an existing chemical
    Update {
        slug: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hazards: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        literature: Option<String>,
        #[arg(long)]
        sds: Option<String>,
        #[arg(long)]
        no_deploy: bool,
    },
    /// List chemicals (active only by default)
    List {
        slug: String,
        /// Include deactivated chemicals
        #[arg(long)]
        all: bool,
    },
    /// Markdown checklist of the PDFs every active chemical needs
    Checklist {
        slug: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), cli.data_dir.clone())?;

    // serve mode also logs to a rolling file under the data directory
    let _log_guard = if matches!(cli.command, Commands::Serve { .. }) {
        Some(logging::init_with_file(cli.verbose, &config.logs_dir())?)
    } else {
        logging::init(cli.verbose);
        None
    };

    match cli.command {
        Commands::Deploy { config_file } => cmd::cmd_deploy(&config, &config_file).await?,
        Commands::List => cmd::cmd_list(&config)?,
        Commands::New {
            name,
            phone,
            email,
            emergency,
            address,
            logo,
            primary_color,
            secondary_color,
            custom_domain,
        } => cmd::cmd_new(
            &config,
            NewCustomer {
                name,
                phone,
                email,
                emergency_phone: emergency,
                address,
                logo,
                primary_color,
                secondary_color,
                custom_domain,
            },
        )?,
        Commands::Delete { slug, force } => cmd::cmd_delete(&config, &slug, force).await?,
        Commands::Chem { command } => match command {
            ChemCommands::Add {
                slug,
                name,
                literature,
                sds,
                description,
                hazards,
                supplier,
                no_deploy,
            } => {
                cmd::cmd_chem_add(
                    &config,
                    &slug,
                    NewChemical {
                        name,
                        description,
                        hazards,
                        supplier,
                        literature_file: literature,
                        sds_file: sds,
                    },
                    no_deploy,
                )
                .await?
            }
            ChemCommands::Remove {
                slug,
                id,
                no_deploy,
            } => cmd::cmd_chem_remove(&config, &slug, &id, no_deploy).await?,
            ChemCommands::Update {
                slug,
                id,
                name,
                description,
                hazards,
                supplier,
                literature,
                sds,
                no_deploy,
            } => {
                cmd::cmd_chem_update(
                    &config,
                    &slug,
                    &id,
                    ChemicalPatch {
                        name,
                        description,
                        hazards,
                        supplier,
                        literature_file: literature,
                        sds_file: sds,
                    },
                    no_deploy,
                )
                .await?
            }
            ChemCommands::List { slug, all } => cmd::cmd_chem_list(&config, &slug, all)?,
            ChemCommands::Checklist { slug, output } => {
                cmd::cmd_chem_checklist(&config, &slug, output.as_deref())?
            }
        },
        Commands::Files { slug } => cmd::cmd_files(&config, slug.as_deref())?,
        Commands::Serve { port, open, dev } => cmd::cmd_serve(config, port, open, dev).await?,
    }

    Ok(())
}
