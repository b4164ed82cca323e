use budget_tree::args::{Args, Command};
use budget_tree::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::New(new_args) => {
            let config = Config::load(home).await?;
            commands::new_budget(config, new_args.clone())
                .await?
                .print()
        }

        Command::Load(load_args) => {
            let config = Config::load(home).await?;
            commands::load(config, load_args.clone()).await?.print()
        }

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            let out = commands::add(config, add_args.clone()).await?;
            out.print();
            // The new id goes to stdout so scripts can capture it.
            if let Some(id) = out.structure() {
                println!("{id}");
            }
        }

        Command::Set(set_args) => {
            let config = Config::load(home).await?;
            commands::set(config, set_args.clone()).await?.print()
        }

        Command::Remove(id_args) => {
            let config = Config::load(home).await?;
            commands::remove(config, id_args.clone()).await?.print()
        }

        Command::Move(move_args) => {
            let config = Config::load(home).await?;
            commands::move_node(config, move_args.clone())
                .await?
                .print()
        }

        Command::Drop(drop_args) => {
            let config = Config::load(home).await?;
            commands::drop_node(config, drop_args.clone())
                .await?
                .print()
        }

        Command::Undo => commands::undo(Config::load(home).await?).await?.print(),

        Command::Show => {
            let out = commands::show(Config::load(home).await?).await?;
            out.print();
            if let Some(text) = out.structure() {
                print!("{text}");
            }
        }

        Command::Payload(payload_args) => {
            let config = Config::load(home).await?;
            commands::payload(config, payload_args.clone())
                .await?
                .print_json()?
        }

        Command::Saved => commands::saved(Config::load(home).await?).await?.print(),

        Command::Schema => commands::schema()?.print_json()?,
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "budget_tree={level},{}={level}",
                env!("CARGO_BIN_NAME")
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
