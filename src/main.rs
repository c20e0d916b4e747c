mod collect;
mod commands;
mod core;
mod model;
mod order;
mod publish;
mod ui;
mod utils;
mod verify;

use clap::{Parser, Subcommand};
use crate::core::config::{BehaviorSetting, ConfigOverrides};
use crate::core::context::CoherenceContext;
use crate::core::error::{CoherenceError, print_error};
use std::path::PathBuf;
use tracing::Level;

/// Verify cross-repository package coherence and publish in dependency order
#[derive(Parser)]
#[command(name = "coherence-build")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Emit logs as JSON lines on stderr
  #[arg(long, global = true)]
  log_json: bool,

  /// Use this config file instead of searching for coherence.toml
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Override which packages have their dependencies checked
  #[arg(long, global = true, value_enum)]
  behavior: Option<BehaviorSetting>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Check that every package depends on exactly the versions being built
  Verify {
    /// Repository manifests to collect packages from
    #[arg(required = true)]
    manifests: Vec<PathBuf>,
    /// Write verified partner versions to this MSBuild props file
    #[arg(long)]
    props: Option<PathBuf>,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the dependency-ordered publish plan
  Plan {
    /// Repository manifests to collect packages from
    #[arg(required = true)]
    manifests: Vec<PathBuf>,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Verify, then push every package to a feed in dependency order
  Publish {
    /// Repository manifests to collect packages from
    #[arg(required = true)]
    manifests: Vec<PathBuf>,
    /// Feed URL (http/https) or local folder
    #[arg(long)]
    feed: String,
    /// API key sent with each push
    #[arg(long, env = "COHERENCE_FEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Write verified partner versions to this MSBuild props file
    #[arg(long)]
    props: Option<PathBuf>,
    /// Verify and print the plan without pushing anything
    #[arg(long)]
    dry_run: bool,
    /// Show a progress bar while pushing
    #[arg(long)]
    progress: bool,
    /// Output the summary in JSON format
    #[arg(long)]
    json: bool,
    /// Maximum concurrent pushes within a group
    #[arg(long)]
    max_parallel: Option<usize>,
    /// Maximum attempts per package
    #[arg(long)]
    max_attempts: Option<u32>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  ui::logging::init_tracing(cli.log_json, Level::INFO);

  let work_dir = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let mut overrides = ConfigOverrides {
    behavior: cli.behavior,
    ..ConfigOverrides::default()
  };
  if let Commands::Publish {
    max_parallel,
    max_attempts,
    ..
  } = &cli.command
  {
    overrides.max_parallel = *max_parallel;
    overrides.max_attempts = *max_attempts;
  }

  let ctx = match CoherenceContext::build(&work_dir, cli.config.as_deref(), &overrides) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Verify { manifests, props, json } => commands::run_verify(&ctx, &manifests, props.as_deref(), json),
    Commands::Plan { manifests, json } => commands::run_plan(&ctx, &manifests, json),
    Commands::Publish {
      manifests,
      feed,
      api_key,
      props,
      dry_run,
      progress,
      json,
      ..
    } => commands::run_publish(
      &ctx,
      &manifests,
      commands::PublishArgs {
        feed,
        api_key,
        props,
        dry_run,
        progress,
        json,
      },
    ),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: CoherenceError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
