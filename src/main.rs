//! workbench-replay: applies a JSON-lines command log to a fresh store and
//! prints the resulting file tree and tab groups.
//!
//! Usage: workbench-replay [--settings=PATH] [--log-dir=PATH] COMMANDS.jsonl

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use zcode_workbench::kernel::services::adapters::{
    get_settings_path, load_settings, ExtensionModeResolver, HeadlessSurfaceFactory,
};
use zcode_workbench::kernel::{Action, Effect, Store};
use zcode_workbench::logging;

fn main() -> ExitCode {
    let mut settings_path: Option<PathBuf> = None;
    let mut log_dir: Option<PathBuf> = None;
    let mut commands_path: Option<PathBuf> = None;

    for arg in std::env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--settings=") {
            settings_path = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--log-dir=") {
            log_dir = Some(PathBuf::from(value));
        } else {
            commands_path = Some(PathBuf::from(arg));
        }
    }

    let guard = logging::init(log_dir.as_deref());
    if let Some(dir) = guard.as_ref().and_then(|guard| guard.log_dir()) {
        eprintln!("workbench-replay: logging to {}", dir.display());
    }

    let Some(commands_path) = commands_path else {
        eprintln!("usage: workbench-replay [--settings=PATH] [--log-dir=PATH] COMMANDS.jsonl");
        return ExitCode::from(2);
    };

    match run(settings_path, &commands_path) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("workbench-replay: {err}");
            ExitCode::from(1)
        }
    }
}

/// Returns `Ok(false)` when a consistency failure stopped the replay.
fn run(settings_path: Option<PathBuf>, commands_path: &Path) -> io::Result<bool> {
    let settings = match settings_path.or_else(get_settings_path) {
        Some(path) => {
            load_settings(&path).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        }
        None => Default::default(),
    };

    let surfaces = HeadlessSurfaceFactory::new();
    let surface_log = surfaces.log();
    let mut store = Store::new(&settings, Box::new(surfaces), Box::new(ExtensionModeResolver));

    let file = std::fs::File::open(commands_path)?;
    let mut clean = true;
    for (line_no, line) in io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let action: Action = match serde_json::from_str(line) {
            Ok(action) => action,
            Err(err) => {
                eprintln!("line {}: bad command: {err}", line_no + 1);
                continue;
            }
        };

        let mut pending = vec![action];
        while let Some(action) = pending.pop() {
            match store.dispatch(action) {
                Ok(result) => {
                    // Modes are "loaded" immediately in headless mode.
                    for effect in result.effects {
                        match effect {
                            Effect::LoadMode {
                                editor_id,
                                descriptor,
                            } => pending.push(Action::ModeLoaded {
                                editor_id,
                                mime: descriptor.mime,
                            }),
                        }
                    }
                }
                Err(err) if err.is_fatal() => {
                    eprintln!("line {}: {err}", line_no + 1);
                    clean = false;
                    break;
                }
                Err(err) => eprintln!("line {}: {err}", line_no + 1),
            }
        }
        if !clean {
            break;
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_tree(&store, &mut out)?;
    print_groups(&store, &mut out)?;
    writeln!(
        out,
        "surfaces: {} created, {} disposed",
        surface_log.borrow().created(),
        surface_log.borrow().disposed()
    )?;
    Ok(clean)
}

fn print_tree(store: &Store, out: &mut impl Write) -> io::Result<()> {
    let files = store.files();
    writeln!(out, "{}/", files.root().name())?;
    for entity in files.descendants("") {
        let marker = if entity.is_directory { "/" } else { "" };
        let dirty = if entity.is_synced { "" } else { " *" };
        writeln!(
            out,
            "{}{}{marker}{dirty}",
            "  ".repeat(entity.depth() + 1),
            entity.name()
        )?;
    }
    Ok(())
}

fn print_groups(store: &Store, out: &mut impl Write) -> io::Result<()> {
    let tabs = store.tabs();
    let mut groups: Vec<_> = tabs.groups().collect();
    groups.sort_by(|a, b| a.id().cmp(b.id()));
    for group in groups {
        let active_group = tabs.active_group() == Some(group.id());
        writeln!(
            out,
            "group {}{}",
            group.id(),
            if active_group { " (active)" } else { "" }
        )?;
        let Ok(ordered) = tabs.ordered_tabs(group.id()) else {
            continue;
        };
        for tab in ordered {
            let title = store
                .tab_title(tab.id())
                .ok()
                .flatten()
                .unwrap_or("untitled");
            let modified = store.is_tab_modified(tab.id()).unwrap_or(false);
            let active = group.active_tab_id() == Some(tab.id());
            writeln!(
                out,
                "  {} {}{} [{}]",
                if active { ">" } else { " " },
                title,
                if modified { " *" } else { "" },
                tab.order_index()
            )?;
        }
    }
    Ok(())
}
