//! CLI interface for the inspector.
//!
//! One-shot commands print a single rendering and exit; `shell` keeps a
//! surface open and drives the navigator interactively.
//!
//! - `inspector inspect <id|url|text>`: resolve and show a record.
//! - `inspector log <file> <variable>`: browse a variable's history in a debug log.
//! - `inspector update <id> --set FIELD=VALUE`: edit and save a record.
//! - `inspector preset list|show`, `inspector cache warm`: stored state.

mod format;
mod shell;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::model::View;
use crate::navigator::{NavigationError, Navigator, PresetScope, SaveTicket};
use crate::service::{PrefixResolver, SfCli};
use crate::storage::Storage;

use format::{format_json, format_report, format_view};

/// Inspect records and debug-log variables from the command line.
#[derive(Debug, Parser)]
#[command(name = "inspector", after_long_help = USAGE_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r#"Examples:
  inspector inspect 001Dn00000AbCdEIAZ
  inspector inspect "https://acme.lightning.force.com/lightning/r/Account/001Dn00000AbCdEIAZ/view"
  inspector log apex-07L.log accountList --ignore-nulls --version 3
  inspector update 001Dn00000AbCdEIAZ --set Rating=Hot --set Description=
  inspector shell --log apex-07L.log

Logging:
  Set INSPECTOR_LOG (e.g. INSPECTOR_LOG=debug) to trace data CLI calls on stderr."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve an identifier (bare, in a URL, or in pasted text) and show the record.
    Inspect {
        /// Identifier, URL, or text containing one.
        input: String,

        /// Print the record's fields as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show every assignment of a variable in a debug log.
    ///
    /// Lists the versions found and the selected version's fields, with
    /// fields changed since the previous shown version marked.
    Log {
        /// Debug log file.
        file: PathBuf,

        /// Variable name, matched literally.
        variable: String,

        /// Hide versions whose value is null.
        #[arg(long)]
        ignore_nulls: bool,

        /// Version number to select (defaults to the first shown).
        #[arg(long)]
        version: Option<usize>,

        /// Print the selected version's fields as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a record.
    ///
    /// Values are checked against the field definitions first. Production
    /// orgs ask for confirmation unless `--yes` is given.
    Update {
        /// Identifier of the record.
        id: String,

        /// Field assignment; an empty value clears the field.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
        assignments: Vec<(String, String)>,

        /// Skip the production confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Inspect saved presets.
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },

    /// Manage the identifier prefix cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Open an interactive inspector surface.
    Shell {
        /// Debug log to scan variables in.
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// List presets saved for a record type.
    List {
        /// Record type, e.g. `Account`.
        object_name: String,
    },

    /// Print a preset's field values as JSON.
    Show { object_name: String, name: String },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Refresh every prefix for the current org.
    Warm,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Run the CLI, returning an error message on failure.
pub async fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { input, json } => cmd_inspect(config, storage, &input, json).await,
        Command::Log {
            file,
            variable,
            ignore_nulls,
            version,
            json,
        } => cmd_log(&file, &variable, ignore_nulls, version, json),
        Command::Update {
            id,
            assignments,
            yes,
        } => cmd_update(config, storage, &id, &assignments, yes).await,
        Command::Preset { command } => match command {
            PresetCommand::List { object_name } => cmd_preset_list(storage, &object_name),
            PresetCommand::Show { object_name, name } => {
                cmd_preset_show(storage, &object_name, &name)
            }
        },
        Command::Cache {
            command: CacheCommand::Warm,
        } => cmd_cache_warm(config, storage).await,
        Command::Shell { log } => shell::run(config, storage, log.as_deref()).await,
    }
}

pub(crate) fn data_cli(config: &Config) -> SfCli {
    SfCli::new(&config.cli, config.target_org.clone())
}

/// Load a record into `navigator`, failing if it ends on an error page.
async fn load(
    navigator: &mut Navigator,
    sf: &SfCli,
    storage: &Storage,
    program: &str,
    input: &str,
) -> Result<(), String> {
    let resolver = PrefixResolver::new(sf, storage, program);
    navigator
        .inspect(input, &resolver, sf)
        .await
        .map_err(|e| e.to_string())?;

    match navigator.current() {
        View::Error(error) => Err(error.message.clone()),
        _ => Ok(()),
    }
}

async fn cmd_inspect(
    config: &Config,
    storage: &Storage,
    input: &str,
    json: bool,
) -> Result<(), String> {
    let sf = data_cli(config);
    let mut navigator = Navigator::new();
    load(&mut navigator, &sf, storage, &config.cli, input).await?;

    print_view(&navigator, json)
}

fn print_view(navigator: &Navigator, json: bool) -> Result<(), String> {
    if json {
        println!("{}", format_json(navigator.current())?);
    } else {
        print!("{}", format_view(navigator));
    }
    Ok(())
}

fn read_log(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("failed to read {}: {e}", file.display()))
}

fn cmd_log(
    file: &Path,
    variable: &str,
    ignore_nulls: bool,
    version: Option<usize>,
    json: bool,
) -> Result<(), String> {
    let log = read_log(file)?;
    let mut navigator = Navigator::new();
    navigator.set_ignore_nulls(ignore_nulls);
    navigator
        .open_log(variable, &log)
        .map_err(|e| e.to_string())?;

    if let Some(version) = version {
        select_version(&mut navigator, version)?;
    }

    print_view(&navigator, json)
}

/// Select by 1-based version number, as versions are displayed.
pub(crate) fn select_version(navigator: &mut Navigator, version: usize) -> Result<(), String> {
    let index = version
        .checked_sub(1)
        .ok_or("versions are numbered from 1")?;
    navigator.select_version(index).map_err(|e| e.to_string())
}

async fn cmd_update(
    config: &Config,
    storage: &Storage,
    id: &str,
    assignments: &[(String, String)],
    yes: bool,
) -> Result<(), String> {
    let sf = data_cli(config);
    let mut navigator = Navigator::new();
    load(&mut navigator, &sf, storage, &config.cli, id).await?;

    navigator.toggle_edit().map_err(|e| e.to_string())?;
    for (field, value) in assignments {
        navigator
            .set_field(field, value)
            .map_err(|e| e.to_string())?;
    }
    let updates = navigator
        .preset_payload(PresetScope::Modified)
        .map_err(|e| match e {
            NavigationError::NothingModified => "values already match the record".to_string(),
            other => other.to_string(),
        })?;

    let report = navigator
        .save(updates, &sf, |ticket| yes || confirm_production(ticket))
        .await
        .map_err(|e| e.to_string())?;

    print!("{}", format_report(&report));
    Ok(())
}

/// Ask on the terminal before writing to a production org.
pub(crate) fn confirm_production(ticket: &SaveTicket) -> bool {
    eprint!(
        "{} {} is in a PRODUCTION org. Update {} field(s)? [y/N] ",
        ticket.object_name,
        ticket.id,
        ticket.updates.len()
    );
    io::stderr().flush().ok();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn cmd_preset_list(storage: &Storage, object_name: &str) -> Result<(), String> {
    let presets = storage
        .load_presets(object_name)
        .map_err(|e| format!("failed to load presets: {e}"))?;

    if presets.is_empty() {
        println!(
            "No presets for {object_name} in {}",
            storage.root().join("presets").display()
        );
        return Ok(());
    }

    for (name, preset) in &presets {
        println!(
            "{name}  ({} fields, saved {})",
            preset.fields.len(),
            preset.saved_at.strftime("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn cmd_preset_show(storage: &Storage, object_name: &str, name: &str) -> Result<(), String> {
    let fields = storage
        .load_preset(object_name, name)
        .map_err(|e| format!("failed to load preset: {e}"))?;
    let json = serde_json::to_string_pretty(&fields)
        .map_err(|e| format!("failed to serialize preset: {e}"))?;
    println!("{json}");
    Ok(())
}

async fn cmd_cache_warm(config: &Config, storage: &Storage) -> Result<(), String> {
    let sf = data_cli(config);
    let resolver = PrefixResolver::new(&sf, storage, &config.cli);
    let count = resolver
        .warm()
        .await
        .map_err(|e| format!("failed to warm prefix cache: {e}"))?;

    if count == 0 {
        println!("No prefixes cached (is a default org set?)");
    } else {
        println!("Cached {count} prefixes");
    }
    Ok(())
}
