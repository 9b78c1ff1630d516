//! Interactive shell: one inspector surface driven line by line.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::identifier;
use crate::model::View;
use crate::navigator::{NavigationError, Navigator, PresetScope};
use crate::service::{PrefixResolver, SfCli};
use crate::storage::Storage;
use crate::surface::SurfaceRegistry;

use super::format::{format_report, format_view};
use super::{confirm_production, data_cli, read_log, select_version};

const HELP: &str = "\
Commands:
  open                         open (or reveal) the surface
  inspect <id|url|text>        show a record, starting a fresh history
  drill <value>                follow an identifier shown in the record
  scan <variable> [file]       browse a variable's assignments in the log
  version <n>                  select version n of the browse session
  nulls [on|off]               hide or show null versions
  edit                         enter or leave edit mode
  set <field> <value>          change a field while editing (empty clears)
  save                         save modified fields
  preset-save <name> [all|modified]
  preset-load [name]           list presets, or apply one to the form
  back                         return to the previous view
  home [fresh]                 go home; 'fresh' also forgets history
  browser                      open the record in the browser
  show                         render the current view
  close                        close the surface
  quit                         leave the shell";

/// What the loop does after a command.
#[derive(Debug, PartialEq)]
enum Reply {
    Render,
    Text(String),
    Silent,
    Quit,
}

struct Shell<'a> {
    config: &'a Config,
    storage: &'a Storage,
    sf: SfCli,
    registry: SurfaceRegistry,
    log: Option<String>,
}

/// Run the shell until `quit` or end of input.
pub(super) async fn run(
    config: &Config,
    storage: &Storage,
    log_path: Option<&Path>,
) -> Result<(), String> {
    let mut shell = Shell::new(config, storage);
    if let Some(path) = log_path {
        shell.load_log(path)?;
    }

    let resolver = PrefixResolver::new(&shell.sf, storage, config.cli.as_str());
    if let Err(e) = resolver.warm().await {
        tracing::warn!(error = %e, "prefix cache warm-up failed");
    }

    println!("Inspector shell. Type 'help' for commands.");

    let stdin = io::stdin();
    loop {
        print!("\ninspector> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("failed to read input: {e}")),
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let (command, args) = input
            .split_once(char::is_whitespace)
            .map_or((input, ""), |(c, a)| (c, a.trim()));

        match shell.execute(&command.to_lowercase(), args).await {
            Ok(Reply::Render) => print!("{}", shell.render()),
            Ok(Reply::Text(text)) => print!("{text}"),
            Ok(Reply::Silent) => {}
            Ok(Reply::Quit) => break,
            Err(e) => eprintln!("  Error: {e}"),
        }
    }
    Ok(())
}

/// The navigator of the open surface.
fn active(registry: &mut SurfaceRegistry) -> Result<&mut Navigator, String> {
    let handle = registry
        .active()
        .ok_or("no surface open; use open, inspect or scan")?;
    registry
        .get_mut(handle)
        .map(|surface| &mut surface.navigator)
        .ok_or_else(|| "surface was closed".to_string())
}

fn record_type(navigator: &Navigator) -> Result<String, String> {
    match navigator.current() {
        View::Record(record) => Ok(record.object_name.clone()),
        other => Err(format!("presets need a record, not the {} view", other.kind())),
    }
}

fn message(text: impl std::fmt::Display) -> Reply {
    Reply::Text(format!("{text}\n"))
}

impl<'a> Shell<'a> {
    fn new(config: &'a Config, storage: &'a Storage) -> Self {
        Self {
            config,
            storage,
            sf: data_cli(config),
            registry: SurfaceRegistry::new(),
            log: None,
        }
    }

    fn load_log(&mut self, path: &Path) -> Result<(), String> {
        if !self.config.is_log_file(path) {
            tracing::warn!(
                path = %path.display(),
                expected = %self.config.log_extension,
                "file does not have the log extension"
            );
        }
        self.log = Some(read_log(path)?);
        Ok(())
    }

    fn render(&self) -> String {
        match self.registry.active().and_then(|h| self.registry.get(h)) {
            Some(surface) => format_view(&surface.navigator),
            None => "No surface open.\n".to_string(),
        }
    }

    async fn execute(&mut self, command: &str, args: &str) -> Result<Reply, String> {
        let resolver = PrefixResolver::new(&self.sf, self.storage, self.config.cli.as_str());

        match command {
            "help" | "?" => Ok(message(HELP)),
            "quit" | "exit" => Ok(Reply::Quit),
            "open" => {
                self.registry.open_or_reveal();
                Ok(Reply::Render)
            }
            "inspect" => {
                if args.is_empty() {
                    return Err("usage: inspect <id|url|text>".to_string());
                }
                let id = identifier::parse(args).ok_or_else(|| {
                    NavigationError::InvalidIdentifier(args.to_string()).to_string()
                })?;
                self.registry
                    .open_for_subject(&id)
                    .map_err(|e| e.to_string())?;
                active(&mut self.registry)?
                    .inspect(&id, &resolver, &self.sf)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Reply::Render)
            }
            "drill" => {
                let navigator = active(&mut self.registry)?;
                navigator
                    .drill(args, &resolver, &self.sf)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Reply::Render)
            }
            "scan" => self.scan(args),
            "version" => {
                let version = args
                    .parse::<usize>()
                    .map_err(|_| "usage: version <n>".to_string())?;
                select_version(active(&mut self.registry)?, version)?;
                Ok(Reply::Render)
            }
            "nulls" => {
                let navigator = active(&mut self.registry)?;
                let ignore = match args {
                    "" => !navigator.ignore_nulls(),
                    "on" => true,
                    "off" => false,
                    _ => return Err("usage: nulls [on|off]".to_string()),
                };
                navigator.set_ignore_nulls(ignore);
                Ok(Reply::Render)
            }
            "edit" => {
                active(&mut self.registry)?
                    .toggle_edit()
                    .map_err(|e| e.to_string())?;
                Ok(Reply::Render)
            }
            "set" => {
                let (field, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                if field.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                active(&mut self.registry)?
                    .set_field(field, value.trim())
                    .map_err(|e| e.to_string())?;
                Ok(Reply::Render)
            }
            "save" => {
                let navigator = active(&mut self.registry)?;
                let updates = navigator
                    .preset_payload(PresetScope::Modified)
                    .map_err(|e| e.to_string())?;
                let report = navigator
                    .save(updates, &self.sf, confirm_production)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Reply::Text(format!(
                    "{}{}",
                    format_report(&report),
                    format_view(navigator)
                )))
            }
            "preset-save" => self.preset_save(args),
            "preset-load" => self.preset_load(args),
            "back" => {
                active(&mut self.registry)?.back();
                Ok(Reply::Render)
            }
            "home" => {
                let navigator = active(&mut self.registry)?;
                match args {
                    "" => navigator.go_home(),
                    "fresh" => navigator.start_fresh(),
                    _ => return Err("usage: home [fresh]".to_string()),
                }
                Ok(Reply::Render)
            }
            "browser" => {
                let id = match active(&mut self.registry)?.current() {
                    View::Record(record) => record.id.clone(),
                    other => return Err(format!("nothing to open from the {} view", other.kind())),
                };
                self.sf.open_in_browser(&id).await.map_err(|e| e.to_string())?;
                Ok(Reply::Silent)
            }
            "show" => Ok(Reply::Render),
            "close" => {
                let handle = self.registry.active().ok_or("no surface open")?;
                self.registry.close(handle);
                Ok(message("Closed."))
            }
            other => Err(format!("unknown command '{other}' (try 'help')")),
        }
    }

    fn scan(&mut self, args: &str) -> Result<Reply, String> {
        let (variable, file) = match args.split_once(char::is_whitespace) {
            Some((variable, file)) => (variable, Some(PathBuf::from(file.trim()))),
            None => (args, None),
        };
        if let Some(file) = file {
            self.load_log(&file)?;
        }
        let log = self
            .log
            .as_deref()
            .ok_or("no log loaded; use scan <variable> <file> or start with --log")?;

        self.registry.open_or_reveal();
        let navigator = active(&mut self.registry)?;
        let count = navigator
            .open_log(variable, log)
            .map_err(|e| e.to_string())?;
        tracing::debug!(variable, count, "scanned log");
        Ok(Reply::Render)
    }

    fn preset_save(&mut self, args: &str) -> Result<Reply, String> {
        let (name, scope) = match args.rsplit_once(char::is_whitespace) {
            Some((name, "all")) => (name.trim(), PresetScope::All),
            Some((name, "modified")) => (name.trim(), PresetScope::Modified),
            _ => (args, PresetScope::All),
        };
        if name.is_empty() {
            return Err("usage: preset-save <name> [all|modified]".to_string());
        }

        let navigator = active(&mut self.registry)?;
        let object_name = record_type(navigator)?;
        let fields = navigator.preset_payload(scope).map_err(|e| match e {
            NavigationError::NotEditing => "enter edit mode to save a preset".to_string(),
            other => other.to_string(),
        })?;

        self.storage
            .save_preset(&object_name, name, &fields)
            .map_err(|e| format!("failed to save preset: {e}"))?;
        Ok(message(format!(
            "Saved preset '{name}' for {object_name} ({} fields)",
            fields.len()
        )))
    }

    fn preset_load(&mut self, name: &str) -> Result<Reply, String> {
        let navigator = active(&mut self.registry)?;
        let object_name = record_type(navigator)?;

        if name.is_empty() {
            let names = self
                .storage
                .list_presets(&object_name)
                .map_err(|e| format!("failed to list presets: {e}"))?;
            if names.is_empty() {
                return Ok(message(format!("No presets for {object_name}")));
            }
            return Ok(message(names.join("\n")));
        }

        let preset = self
            .storage
            .load_preset(&object_name, name)
            .map_err(|e| format!("failed to load preset: {e}"))?;
        let applied = navigator
            .apply_preset(&preset)
            .map_err(|e| e.to_string())?;
        tracing::debug!(preset = name, applied = applied.len(), "applied preset");
        Ok(Reply::Render)
    }
}
