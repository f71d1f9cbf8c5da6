use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use papersnap::config::{self, CrawlConfig};
use papersnap::crawler::Crawler;
use papersnap::scheduler::Scheduler;
use papersnap::snapshot::SnapshotStore;

mod serve;

#[derive(Parser, Debug)]
#[command(
    name = "papersnap",
    version,
    about = "Scrapes the paperswithcode listing into a JSON snapshot and serves it"
)]
struct Cli {
    #[arg(long, global = true, default_value = "papersnap_config.json")]
    config: PathBuf,
    #[arg(
        long,
        global = true,
        help = "Write the resolved config to disk before running"
    )]
    write_config: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "crawl", about = "Run one crawl tick and replace the snapshot")]
    Crawl,
    #[command(name = "serve", about = "Serve the snapshot, refreshing it in the background")]
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long, default_value_t = 8084, help = "port to serve on")]
    port: u16,
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Serve the existing snapshot without background refresh"
    )]
    no_refresh: bool,
}

fn run_crawl(config: &CrawlConfig) -> Result<(), String> {
    let crawler = Crawler::new(config.clone())?;
    let store = SnapshotStore::new(&config.snapshot_path);
    let count = crawler.tick(&store)?;
    println!(
        "snapshot updated with {count} papers at {}",
        store.path().display()
    );
    Ok(())
}

fn run_serve(args: &ServeArgs, config: &CrawlConfig) -> Result<(), String> {
    let scheduler = if args.no_refresh {
        None
    } else {
        let crawler = Crawler::new(config.clone())?;
        let store = SnapshotStore::new(&config.snapshot_path);
        let interval = Duration::from_secs(config.interval_secs);
        Some(Scheduler::start(interval, move || {
            match crawler.tick(&store) {
                Ok(count) => println!("snapshot updated with {count} papers"),
                Err(err) => eprintln!("sync failed, keeping previous snapshot: {err}"),
            }
        }))
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|err| format!("Failed to create runtime: {err}"))?;
    let result = rt
        .block_on(serve::run(config.clone(), args.port))
        .map_err(|err| format!("serve failed: {err}"));

    if let Some(scheduler) = scheduler {
        scheduler.stop();
    }
    result
}

fn dispatch_command(command: Commands, config: &CrawlConfig) -> Result<(), String> {
    match command {
        Commands::Crawl => run_crawl(config),
        Commands::Serve(args) => run_serve(&args, config),
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if cli.write_config {
        if let Err(err) = config::write_config(&cli.config, &config) {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }

    let Some(command) = cli.command else {
        if !cli.write_config {
            eprintln!("No subcommand supplied. Use --help for usage details.");
            std::process::exit(2);
        }
        return;
    };

    if let Err(err) = dispatch_command(command, &config) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
