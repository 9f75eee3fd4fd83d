// Entrypoint for the CLI application.
// - Parses the command line, then hands off to the run flow.
// - Exit codes: 0 on completion, sample generation or user interrupt;
//   1 on fatal errors (missing file, bad board URL, denied access).

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use cardfile_cli::{
    api::ApiClient,
    credentials::FileCredentialStore,
    document,
    error::CardfileError,
    parser,
    submit::{self, ListCache},
    ui,
};

#[derive(Parser)]
#[command(
    name = "cardfile",
    version,
    about = "Create Trello cards from a structured text document"
)]
struct Cli {
    /// Path to the document file (interactive selection when omitted)
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        if user_interrupted(&err) {
            info!("Interrupted by user.");
            return;
        }
        error!("{:#}", err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    println!("Welcome to cardfile!");
    println!("--------------------\n");

    // Fail fast on a bad --file before any prompting happens.
    if let Some(path) = &cli.file {
        if !path.is_file() {
            return Err(CardfileError::MissingInputFile(path.clone()).into());
        }
    }

    let store = FileCredentialStore::default_location();
    let credentials = ui::resolve_credentials(&store)?;
    let api = ApiClient::new(&credentials.api_key, &credentials.api_token)?;

    let file = match &cli.file {
        Some(path) => path.clone(),
        None => match ui::select_document()? {
            Some(path) => path,
            // the user asked for a sample template instead
            None => return Ok(()),
        },
    };

    let paragraphs = document::read_document(&file)?;
    let cards = parser::parse_cards(&paragraphs);
    if cards.is_empty() {
        return Err(CardfileError::NoCards(file).into());
    }

    println!("\nCreating Trello cards...");
    let bar = ProgressBar::new(cards.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap());

    let mut cache = ListCache::new();
    let mut created = 0usize;
    let mut failed = 0usize;
    for card in &cards {
        bar.set_message(card.title.clone());
        if submit::submit_card(&api, &mut cache, &credentials.board_id, card) {
            created += 1;
        } else {
            failed += 1;
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        "Processing complete. {} out of {} cards were created successfully.",
        created,
        cards.len()
    );
    if failed > 0 {
        warn!(
            "{} cards could not be created. Please review the error messages above.",
            failed
        );
    }
    Ok(())
}

/// Ctrl-C inside a prompt surfaces as an interrupted I/O error; treat
/// it as a clean, user-requested exit.
fn user_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .map(|io_err| io_err.kind() == io::ErrorKind::Interrupted)
            .unwrap_or(false)
    })
}
