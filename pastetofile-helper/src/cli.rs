use std::path::{Path, PathBuf};

use clap::Parser;
use pastetofile_core::{Action, OperationReport};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "PasteToFileHelper",
    version,
    about = "Saves the current clipboard content as a file in a folder"
)]
pub struct HelperArgs {
    /// auto, text-txt, text-md, html, rtf, png, all, history-all or clear-all
    #[arg(long, default_value = "auto", value_parser = parse_action)]
    pub action: Action,

    /// Folder that receives the new files; required unless clearing
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Print the operation report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl HelperArgs {
    /// Target folder for the requested action. `clear-all` never writes, so it
    /// gets an empty path when none was given.
    pub fn resolve_target(&self) -> Result<PathBuf, String> {
        match (&self.target, self.action.needs_target()) {
            (Some(target), true) => check_target(target).map(|()| target.clone()),
            (Some(target), false) => Ok(target.clone()),
            (None, false) => Ok(PathBuf::new()),
            (None, true) => Err(format!("--target is required for --action {}", self.action)),
        }
    }
}

fn check_target(target: &Path) -> Result<(), String> {
    if target.as_os_str().is_empty() {
        return Err("--target must not be empty".to_owned());
    }
    if !target.is_dir() {
        return Err(format!("target {} is not a directory", target.display()));
    }
    Ok(())
}

fn parse_action(value: &str) -> Result<Action, String> {
    value.parse::<Action>().map_err(|err| {
        let expected: Vec<&str> = Action::VALUES.iter().map(|a| a.as_str()).collect();
        format!("{err}; expected one of: {}", expected.join(", "))
    })
}

pub fn exit_code(report: &OperationReport) -> i32 {
    if report.success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// Plain-text rendering: one saved path per line on stdout, one failure per
/// line on stderr.
pub fn render_text(report: &OperationReport) -> (String, String) {
    let mut out = String::new();
    for saved in &report.saved {
        out.push_str(&saved.path.display().to_string());
        out.push('\n');
    }
    if let Some(cleared) = report.cleared {
        out.push_str(&format!(
            "cleared clipboard: {}, cleared history: {}\n",
            cleared.clipboard, cleared.history
        ));
    }

    let mut err = String::new();
    for failure in &report.failures {
        match (failure.kind, failure.history_index) {
            (Some(kind), Some(index)) => {
                err.push_str(&format!("history #{index} {kind}: {}\n", failure.reason));
            }
            (Some(kind), None) => err.push_str(&format!("{kind}: {}\n", failure.reason)),
            _ => err.push_str(&format!("{}\n", failure.reason)),
        }
    }
    (out, err)
}

pub fn render_json(report: &OperationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
