mod app;
mod clock;
mod command;
mod config;
mod console;
mod domain;
mod error;
mod navigator;
mod report;
mod session;
mod storage;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::Tracker;
use crate::clock::SystemClock;
use crate::config::{Settings, load_settings, resolve_config_path, resolve_data_path};
use crate::console::Console;
use crate::report::{render_top, top_activities};
use crate::storage::Store;

#[derive(Debug, Parser)]
#[command(name = "timeledger", about = "Line-oriented activity time tracker")]
struct Cli {
	/// Activity document, defaults to data/data.json
	#[arg(long)]
	data: Option<PathBuf>,
	#[arg(long)]
	config: Option<PathBuf>,
	/// Raise log verbosity (-v info, -vv debug)
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Interactive activity loop (default)
	Track,
	Init,
	List,
	Top {
		#[arg(long)]
		limit: Option<usize>,
		#[arg(long)]
		all: bool,
	},
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(err) = run(cli) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_logging(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
	let config_path = resolve_config_path(cli.config);
	let settings = load_settings(config_path.as_deref())?;
	let store = Store::new(resolve_data_path(cli.data, &settings));

	match cli.command.unwrap_or(Command::Track) {
		Command::Track => {
			if let Err(err) = store.ensure_initialized() {
				tracing::error!(error = %err, "failed to create activity document");
			}
			run_tracker(store, settings)?;
		}
		Command::Init => {
			let created = store.ensure_initialized()?;
			let verb = if created { "initialized" } else { "already initialized" };
			println!("{verb} activity document at {}", store.path().display());
		}
		Command::List => {
			print_activities(&store)?;
		}
		Command::Top { limit, all } => {
			let limit = if all { None } else { limit.or(settings.top_limit()) };
			let entries = top_activities(&store.load()?, limit);
			println!("{}", render_top(&entries)?);
		}
	}

	Ok(())
}

fn run_tracker(store: Store, settings: Settings) -> Result<(), Box<dyn Error>> {
	let stdin = io::stdin();
	let console = Console::new(stdin.lock(), io::stdout(), settings.console_style());
	let mut tracker = Tracker::new(store, console, Box::new(SystemClock), settings);
	tracker.run()?;
	Ok(())
}

fn print_activities(store: &Store) -> Result<(), Box<dyn Error>> {
	let activities = store.load()?;
	if activities.is_empty() {
		println!("no activities yet");
		return Ok(());
	}

	for activity in &activities {
		let projects = activity
			.projects
			.iter()
			.map(|project| format!("{} ({})", project.name, project.tasks.len()))
			.collect::<Vec<_>>();
		println!(
			"{} | {} | {} | {}h {}m | {}",
			activity.id,
			activity.name,
			activity.short_name,
			activity.hours,
			activity.minutes,
			if projects.is_empty() { "-".to_string() } else { projects.join(", ") }
		);
	}

	Ok(())
}
