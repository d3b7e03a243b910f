//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::app::App;
use crate::cli::{CacheCommand, Command, ProjectCommand, SettingsCommand, TaskCommand};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::models::{DarkMode, ViewMode, WorkflowStatus};
use crate::nav::Screen;
use crate::offline::{FetchOutcome, Request, Response, WorkerMessage};
use crate::paths;
use crate::projects::{NewProject, ProjectPatch};
use crate::render::text;
use crate::tasks::{NewTask, TaskPatch};
use crate::view::View;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Run a CLI command against the data directory.
pub fn run(command: Command, data_dir: &Path) -> CliOutput {
    if matches!(command, Command::Version) {
        return run_version();
    }
    match App::open(data_dir) {
        Ok(app) => run_with(command, &app),
        Err(e) => error_output(e.to_string()),
    }
}

/// Run a CLI command against an already opened app.
pub(crate) fn run_with(command: Command, app: &App) -> CliOutput {
    let result = match command {
        Command::Version => Ok(run_version()),
        Command::Task(cmd) => run_task_cmd(app, cmd),
        Command::Project(cmd) => run_project_cmd(app, cmd),
        Command::View { name, project, html } => run_view(app, &name, project.as_deref(), html),
        Command::Search { query, html } => {
            render_screen(app, app.navigator().search(&query), html).map(success_output)
        }
        Command::Counts => Ok(json_output(&app.navigator().counts())),
        Command::Export { format, out } => run_export(app, &format, out.as_deref()),
        Command::Settings(cmd) => run_settings_cmd(app, cmd),
        Command::Cache(cmd) => run_cache_cmd(app, cmd),
        Command::Doctor => Ok(run_doctor(app)),
    };
    result.unwrap_or_else(|e| error_output(e.to_string()))
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    success_output(format!("taskdeck v{}", crate::VERSION))
}

fn run_doctor(app: &App) -> CliOutput {
    let gateway = app.gateway();
    let mut lines = vec![
        format!("data dir: {}", app.data_dir().display()),
        format!("config: {}", AppConfig::config_path(app.data_dir()).display()),
        format!(
            "storage: {}{}",
            gateway.backend_name(),
            if gateway.using_fallback() { " (fallback)" } else { "" }
        ),
    ];
    let mut healthy = true;
    match gateway.try_load() {
        Ok(Some(doc)) => lines.push(format!(
            "document: {} tasks, {} projects",
            doc.tasks.len(),
            doc.projects.len()
        )),
        Ok(None) => lines.push("document: none saved yet".to_string()),
        Err(e) => {
            healthy = false;
            lines.push(format!("document: unreadable ({e})"));
        }
    }
    let worker = app.cache_worker();
    match worker.bucket_names() {
        Ok(names) => lines.push(format!(
            "cache: {} ({} bucket{})",
            worker.bucket(),
            names.len(),
            if names.len() == 1 { "" } else { "s" }
        )),
        Err(e) => lines.push(format!("cache: unreadable ({e})")),
    }
    lines.push(format!("exports: {}", paths::export_dir(app.data_dir()).display()));

    let mut output = success_output(lines.join("\n"));
    if !healthy {
        output.exit_code = ExitCode::from(1);
    }
    output
}

// === Task Commands ===

fn run_task_cmd(app: &App, cmd: TaskCommand) -> Result<CliOutput> {
    let tasks = app.tasks();
    let today = tasks.clock().today();
    let task = match cmd {
        TaskCommand::Add {
            title,
            description,
            project,
            due,
            tags,
            subtasks,
            status,
            recurring,
        } => tasks.create(NewTask {
            title,
            description,
            project_id: project.map(|p| resolve_project(app, &p)).transpose()?,
            due_date: due.map(|d| parse_due(&d, today)).transpose()?,
            tags,
            subtasks,
            recurring,
            status: status.map(|s| parse_status(&s)).transpose()?,
        })?,
        TaskCommand::Get { id } => tasks.get(&id).ok_or(Error::TaskNotFound(id))?,
        TaskCommand::Edit { id, title, description, project, no_project, due, no_due, recurring } => {
            let project_id = if no_project {
                Some(None)
            } else {
                project.map(|p| resolve_project(app, &p).map(Some)).transpose()?
            };
            let due_date = if no_due {
                Some(None)
            } else {
                due.map(|d| parse_due(&d, today).map(Some)).transpose()?
            };
            let patch = TaskPatch {
                title,
                description,
                project_id,
                due_date,
                recurring,
                ..TaskPatch::default()
            };
            if patch.is_empty() {
                return Err(Error::Validation("nothing to change".to_string()));
            }
            tasks.update(&id, patch)?
        }
        TaskCommand::Done { id } => tasks.toggle_done(&id)?,
        TaskCommand::Move { id, status } => tasks.move_task(&id, parse_status(&status)?)?,
        TaskCommand::Delete { id } => {
            let task = tasks.delete(&id)?;
            return Ok(success_output(format!("Task deleted: {} ({})", task.id, task.title)));
        }
        TaskCommand::Tag { id, tag } => tasks.add_tag(&id, &tag)?,
        TaskCommand::Untag { id, tag } => tasks.remove_tag(&id, &tag)?,
        TaskCommand::SubtaskAdd { id, text } => tasks.add_subtask(&id, &text)?,
        TaskCommand::SubtaskDone { id, subtask_id } => tasks.toggle_subtask(&id, &subtask_id)?,
        TaskCommand::SubtaskRemove { id, subtask_id } => tasks.remove_subtask(&id, &subtask_id)?,
    };
    Ok(json_output(&task))
}

fn parse_status(s: &str) -> Result<WorkflowStatus> {
    WorkflowStatus::from_str(s).map_err(|e| Error::Validation(e.to_string()))
}

/// `YYYY-MM-DD`, `today` or `tomorrow`.
fn parse_due(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::Validation("date out of range".to_string())),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| {
            Error::Validation(format!("invalid due date '{s}' (use YYYY-MM-DD, today or tomorrow)"))
        }),
    }
}

fn resolve_project(app: &App, reference: &str) -> Result<String> {
    app.projects()
        .find(reference)
        .map(|p| p.id)
        .ok_or_else(|| Error::ProjectNotFound(reference.to_string()))
}

// === Project Commands ===

fn run_project_cmd(app: &App, cmd: ProjectCommand) -> Result<CliOutput> {
    let projects = app.projects();
    match cmd {
        ProjectCommand::Add { name, color, view } => {
            let view = parse_view_mode(&view)?;
            Ok(json_output(&projects.create(NewProject { name, color, view })?))
        }
        ProjectCommand::List => {
            let screen = app.navigator().navigate(View::Projects, None)?;
            render_screen(app, screen, false).map(success_output)
        }
        ProjectCommand::Edit { project, name, color, view } => {
            let id = resolve_project(app, &project)?;
            let patch = ProjectPatch {
                name,
                color,
                view: view.map(|v| parse_view_mode(&v)).transpose()?,
            };
            if patch.is_empty() {
                return Err(Error::Validation("nothing to change".to_string()));
            }
            Ok(json_output(&projects.update(&id, patch)?))
        }
        ProjectCommand::Delete { project } => {
            let id = resolve_project(app, &project)?;
            let removed = projects.delete(&id)?;
            Ok(success_output(format!("Project deleted: {} ({})", removed.id, removed.name)))
        }
    }
}

fn parse_view_mode(s: &str) -> Result<ViewMode> {
    ViewMode::from_str(s).map_err(Error::Validation)
}

// === Views ===

fn run_view(app: &App, name: &str, project: Option<&str>, html: bool) -> Result<CliOutput> {
    let project_id = project.map(|p| resolve_project(app, p)).transpose()?;
    let screen = app.navigator().navigate(View::parse(name), project_id.as_deref())?;
    render_screen(app, screen, html).map(success_output)
}

fn render_screen(app: &App, screen: Screen, html: bool) -> Result<String> {
    if html {
        let renderer = app.renderer()?;
        return match &screen {
            Screen::TaskList(view) => renderer.task_list(view),
            Screen::Kanban(board) => renderer.kanban(board),
            Screen::Projects(view) => renderer.projects(view),
        };
    }
    Ok(match &screen {
        Screen::TaskList(view) => text::task_list(view),
        Screen::Kanban(board) => text::kanban(board),
        Screen::Projects(view) => text::projects(view),
    })
}

fn run_export(app: &App, format: &str, out: Option<&Path>) -> Result<CliOutput> {
    let format: ExportFormat = format.parse()?;
    let path = app.export(format, out)?;
    Ok(success_output(format!("Exported to {}", path.display())))
}

// === Settings Commands ===

fn run_settings_cmd(app: &App, cmd: SettingsCommand) -> Result<CliOutput> {
    let settings = app.settings();
    let updated = match cmd {
        SettingsCommand::Show => settings.get(),
        SettingsCommand::DarkMode { mode } => {
            settings.set_dark_mode(DarkMode::from_str(&mode).map_err(Error::Validation)?)
        }
        SettingsCommand::Notifications { state } => {
            let enabled = match state.to_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => {
                    return Err(Error::Validation(format!(
                        "invalid notifications state '{other}' (use on or off)"
                    )))
                }
            };
            settings.set_notifications(enabled)
        }
    };
    Ok(json_output(&updated))
}

// === Cache Commands ===

fn run_cache_cmd(app: &App, cmd: CacheCommand) -> Result<CliOutput> {
    let mut worker = app.cache_worker();
    match cmd {
        CacheCommand::Install { skip_waiting } => {
            let report = worker.install()?;
            let mut lines = vec![format!(
                "Cached {} of {} assets into {}",
                report.cached.len(),
                report.cached.len() + report.failed.len(),
                worker.bucket()
            )];
            lines.extend(report.failed.iter().map(|(url, reason)| format!("  failed: {url} ({reason})")));
            if skip_waiting {
                worker.handle_message(WorkerMessage::SkipWaiting)?;
            }
            lines.push(format!("State: {}", worker.state()));
            Ok(success_output(lines.join("\n")))
        }
        CacheCommand::Activate => {
            if !worker.resume()? {
                return Err(not_installed(worker.bucket()));
            }
            let purged = worker.activate()?;
            let mut lines = vec![format!("Activated {}", worker.bucket())];
            lines.extend(purged.iter().map(|name| format!("  purged: {name}")));
            Ok(success_output(lines.join("\n")))
        }
        CacheCommand::Status => {
            let current = worker.bucket().to_string();
            let names = worker.bucket_names()?;
            if names.is_empty() {
                return Ok(success_output("No cache buckets".to_string()));
            }
            let lines: Vec<String> = names
                .iter()
                .map(|n| format!("{} {n}", if *n == current { '*' } else { ' ' }))
                .collect();
            Ok(success_output(lines.join("\n")))
        }
        CacheCommand::Fetch { url } => {
            if worker.resume()? {
                worker.activate()?;
            }
            match worker.fetch(&Request::get(url)) {
                FetchOutcome::Passthrough => {
                    Ok(success_output("passthrough (not intercepted)".to_string()))
                }
                FetchOutcome::Cached(response) => Ok(success_output(describe("cache", &response))),
                FetchOutcome::Network(response) => {
                    Ok(success_output(describe("network", &response)))
                }
                FetchOutcome::Failed(message) => Ok(error_output(message)),
            }
        }
    }
}

fn not_installed(bucket: &str) -> Error {
    Error::Validation(format!("cache {bucket} is not installed; run `taskdeck cache install` first"))
}

fn describe(source: &str, response: &Response) -> String {
    format!(
        "{source}: {} {} ({} bytes)",
        response.status,
        response.content_type.as_deref().unwrap_or("-"),
        response.body.len()
    )
}

// === Output Helpers ===

fn json_output<T: Serialize>(value: &T) -> CliOutput {
    match serde_json::to_string_pretty(value) {
        Ok(json) => success_output(json),
        Err(e) => error_output(format!("Failed to serialize output: {e}")),
    }
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![format!("Error: {message}")] }
}
