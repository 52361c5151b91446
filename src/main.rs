// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! MCP Directory catalog CLI.
//!
//! Loads the catalog from every configured source and resolves, lists or
//! edits entities. Results go to stdout as JSON; logs go to stderr.

#![allow(clippy::print_stdout, reason = "CLI tool needs to output to stdout")]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use mcp_directory::catalog::{EntityKind, KindHint, RawRecord};
use mcp_directory::cli::{self, ColorConfig, ColumnWidths};
use mcp_directory::config::Config;
use mcp_directory::service::CatalogService;
use mcp_directory::store::Environment;

/// Entity kind as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    /// MCP server.
    Server,
    /// MCP client application.
    Client,
    /// AI agent.
    Agent,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Server => Self::Server,
            KindArg::Client => Self::Client,
            KindArg::Agent => Self::Agent,
        }
    }
}

/// Environment namespace as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum EnvArg {
    /// Production edits.
    Production,
    /// Development edits.
    Development,
}

impl From<EnvArg> for Environment {
    fn from(env: EnvArg) -> Self {
        match env {
            EnvArg::Production => Self::Production,
            EnvArg::Development => Self::Development,
        }
    }
}

/// Command-line arguments for mcpdir.
#[derive(Parser, Debug)]
#[command(name = "mcpdir")]
#[command(about = "Resolve and browse the MCP Directory catalog")]
#[command(version = env!("MCPDIR_VERSION"))]
struct Args {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environment namespace for local edits. Overrides the config file.
    #[arg(long = "env", value_enum, global = true)]
    environment: Option<EnvArg>,

    /// Directory holding local edits. Overrides the config file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skip the remote catalog API.
    #[arg(long, global = true)]
    offline: bool,
}

/// Subcommands supported by mcpdir.
#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a key to exactly one entity.
    Resolve {
        /// The key, typically a URL path segment.
        key: String,

        /// Restrict candidates to one kind.
        #[arg(long, short, value_enum)]
        kind: Option<KindArg>,
    },

    /// List catalog entities.
    List {
        /// Only entities of this kind.
        #[arg(long, short, value_enum)]
        kind: Option<KindArg>,

        /// Only entities in this category slug.
        #[arg(long, short)]
        category: Option<String>,

        /// Only entities whose id or name matches this regex.
        #[arg(long, short)]
        filter: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Disable colored output.
        #[arg(long)]
        nocolor: bool,
    },

    /// List derived categories with their entity counts.
    Categories,

    /// Insert or replace a local edit from a JSON record.
    Put {
        /// Kind of the record.
        #[arg(long, short, value_enum)]
        kind: KindArg,

        /// JSON file with the record, or "-" for stdin.
        file: PathBuf,
    },

    /// Delete a local edit.
    Delete {
        /// Kind of the record.
        #[arg(long, short, value_enum)]
        kind: KindArg,

        /// Id of the record.
        id: String,
    },
}

/// Entry point for the mcpdir binary.
///
/// # Errors
///
/// Returns an error if configuration, the data directory or the subcommand
/// fails.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mcp_directory=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config.clone())?;
    if let Some(env) = args.environment {
        config.environment = env.into();
    }
    if let Some(dir) = args.data_dir.clone() {
        config.data_dir = Some(dir);
    }

    let service = CatalogService::from_config(&config, args.offline)?;
    service.load().await;

    match args.command {
        Command::Resolve { key, kind } => {
            let hint = kind.map_or(KindHint::Unknown, |k| EntityKind::from(k).into());
            print_json(&service.resolve(&key, hint))
        }
        Command::List {
            kind,
            category,
            filter,
            json,
            nocolor,
        } => run_list(
            &service,
            kind.map(EntityKind::from),
            category.as_deref(),
            filter.as_deref(),
            json,
            nocolor,
        ),
        Command::Categories => print_json(&service.categories()),
        Command::Put { kind, file } => {
            let record = read_record(&file)?;
            let entity = service.upsert_local(record, kind.into())?;
            print_json(&entity)
        }
        Command::Delete { kind, id } => {
            let deleted = service.delete_local(kind.into(), &id)?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
    }
}

/// Runs the list command.
///
/// # Errors
///
/// Returns an error if the filter is not a valid regex.
fn run_list(
    service: &CatalogService,
    kind: Option<EntityKind>,
    category: Option<&str>,
    filter: Option<&str>,
    json: bool,
    nocolor: bool,
) -> Result<()> {
    let filter_regex = filter
        .map(Regex::new)
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid filter regex: {e}"))?;

    let mut entities = match category {
        Some(slug) => service.entities_in_category(slug),
        None => service.list(kind),
    };
    entities.retain(|e| {
        kind.is_none_or(|k| e.kind == k)
            && filter_regex
                .as_ref()
                .is_none_or(|re| re.is_match(&e.id) || re.is_match(&e.name))
    });

    if json {
        return print_json(&entities);
    }

    if entities.is_empty() {
        println!("No matching entities");
        return Ok(());
    }

    let colors = ColorConfig::new(nocolor);
    let term_width = cli::terminal_width();
    let widths = ColumnWidths::calculate(term_width);

    println!("{}", widths.header());
    println!("{}", "-".repeat(term_width.min(120)));
    for (idx, entity) in entities.iter().enumerate() {
        println!("{}", widths.row(idx + 1, entity, &colors));
    }

    Ok(())
}

/// Reads a JSON record from a file or stdin.
fn read_record(path: &Path) -> Result<RawRecord> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read record from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&json).context("Record is not a JSON object")
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
