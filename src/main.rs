use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use poemview::api::{ApiClient, PoemSource};
use poemview::config::{self, Config};
use poemview::controller::Controller;
use poemview::location::Location;
use poemview::view::PoemView;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("POEMVIEW_BUILD_GIT_HASH"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "poemview",
    about = "Terminal reader for a poetry retrieval service",
    version,
    long_version = LONG_VERSION
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Poem to open: an id, `?poem=<id>`, or a URL carrying it (random when omitted)
    #[arg(global = true)]
    poem: Option<String>,

    /// Base URL of the poem API (overrides config and POEMVIEW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Page URL used to open poems in the browser
    #[arg(long, global = true)]
    web_url: Option<String>,

    /// Log output file path (enables logging in the viewer when specified)
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a poem and its similar poems to stdout
    Show {
        /// Show the best match for this text instead of a poem id
        #[arg(long)]
        search: Option<String>,

        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    location: String,
    #[serde(flatten)]
    view: &'a PoemView,
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        let file = match std::fs::File::create(log_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    } else if cli.command.is_some() {
        env_logger::init();
    }
    // viewer mode + no --log → logger not initialized (stdout is the screen)

    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_env(|key| std::env::var(key).ok());
    cfg.merge_cli(cli.api_url, cli.web_url);
    let config = cfg.resolve();

    let client = ApiClient::new(&config.api_url, config.timeout);
    let start = cli
        .poem
        .as_deref()
        .map(Location::parse_arg)
        .unwrap_or_default();

    let result = match cli.command {
        Some(Command::Show { search, json }) => {
            cmd_show(&client, start, search.as_deref(), json, &config)
        }
        None => poemview::viewer::run(&client, start, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_show(
    source: &impl PoemSource,
    start: Location,
    search: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let mut controller = Controller::new(config.controller_settings());
    let jobs = match search {
        Some(query) => {
            let jobs = controller.search_poems_by_text(query);
            if jobs.is_empty() {
                bail!("search text is empty");
            }
            jobs
        }
        None => controller.start(start),
    };
    controller.drive(source, jobs);

    let view = controller.view();
    info!(
        "cmd_show: location={} poem={:?}",
        controller.location(),
        view.poem_id
    );
    if json {
        let output = ShowOutput {
            location: controller.location().to_query(),
            view,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{view}");
    }

    if !view.has_poem() {
        bail!("{}", view.title);
    }
    Ok(())
}
