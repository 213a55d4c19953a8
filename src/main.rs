use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use text_blast::{ApiClient, AppConfig, BlastForm};

#[derive(Debug, Parser)]
#[command(
    name = "text-blast",
    version,
    about = "Send a group text to a roster reconciled from the server and CSV imports"
)]
struct Cli {
    /// Config file to use instead of the discovered one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "TEXT_BLAST_ENDPOINT", global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List recipients known to the server.
    Recipients,
    /// Normalize a roster file and print the rows that would be imported.
    Preview { file: PathBuf },
    /// Import a roster file and upload it.
    Upload { file: PathBuf },
    /// Send a message to selected recipients.
    Send {
        #[arg(long, short)]
        message: String,
        /// Send to every recipient.
        #[arg(long)]
        all: bool,
        /// Recipient id to include; repeatable.
        #[arg(long = "to")]
        to: Vec<String>,
        /// Roster file to send along with the message.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Write a config file with the default header table.
    InitConfig,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load()?,
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    Ok(config)
}

fn build_form(config: &AppConfig) -> Result<BlastForm<ApiClient>> {
    let client = ApiClient::new(config.endpoint_url()?);
    Ok(BlastForm::new(client, config.normalizer(), config.form_settings()?))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::InitConfig => {
            let path = match &cli.config {
                Some(path) => {
                    config.save_to(path)?;
                    path.clone()
                }
                None => config.save()?,
            };
            println!("{}", path.display());
        }
        Command::Preview { file } => {
            let rows = config
                .normalizer()
                .read_file(&file, config.delimiter_byte()?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Recipients => {
            let form = build_form(&config)?;
            form.refresh().await?;
            for recipient in form.state().recipients.recipients() {
                println!(
                    "{}\t{}\t{}",
                    recipient.id,
                    recipient.label(),
                    recipient.phone_number()
                );
            }
        }
        Command::Upload { file } => {
            let form = build_form(&config)?;
            let count = form.import_file(&file).await?;
            println!("imported {} rows", count);
            println!("{}", form.upload_roster().await?);
        }
        Command::Send {
            message,
            all,
            to,
            csv,
        } => {
            let form = build_form(&config)?;
            if let Some(file) = csv {
                form.import_file(&file).await?;
            }
            form.refresh().await?;
            if all {
                form.select_all();
            } else {
                for id in &to {
                    if form.state().selection.is_selected(id) {
                        continue;
                    }
                    if !form.toggle(id) {
                        bail!("unknown recipient id {}", id);
                    }
                }
            }
            form.set_message(message);
            println!("{}", form.send().await?);
        }
    }
    Ok(())
}
