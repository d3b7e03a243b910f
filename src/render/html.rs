//! HTML adapter for the view-models, using Tera.
//!
//! Templates ship embedded in the binary. A theme directory can override any
//! of them by name. Every template name ends in `.html`, so Tera
//! autoescapes every interpolated value; user text never reaches the markup
//! unescaped.

use super::{KanbanBoard, ProjectListView, TaskListView};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};

/// Template for [`TaskListView`].
pub const TASK_LIST: &str = "task_list.html";
/// Template for [`KanbanBoard`].
pub const KANBAN: &str = "kanban.html";
/// Template for [`ProjectListView`].
pub const PROJECTS: &str = "projects.html";

/// Embedded default templates for fallback when files don't exist.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(TASK_LIST, include_str!("../../templates/task_list.html"));
    m.insert(KANBAN, include_str!("../../templates/kanban.html"));
    m.insert(PROJECTS, include_str!("../../templates/projects.html"));
    m
});

/// Renders view-models to HTML fragments.
#[derive(Debug)]
pub struct HtmlRenderer {
    tera: Tera,
}

impl HtmlRenderer {
    /// A renderer using only the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded template fails to parse.
    pub fn new() -> Result<Self> {
        Self::with_theme_dir(None)
    }

    /// A renderer that prefers `*.html` templates found in `theme_dir`.
    ///
    /// A missing directory is not an error; the embedded templates are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but contains invalid templates.
    pub fn with_theme_dir(theme_dir: Option<&Path>) -> Result<Self> {
        let mut tera = Tera::default();

        if let Some(dir) = theme_dir.filter(|d| d.is_dir()) {
            let glob_pattern = format!("{}/**/*.html", dir.display());
            tera = Tera::new(&glob_pattern).map_err(|e| {
                Error::Template(format!("Failed to load templates from {}: {e}", dir.display()))
            })?;
        }

        for (name, content) in EMBEDDED_TEMPLATES.iter() {
            if tera.get_template(name).is_err() {
                tera.add_raw_template(name, content)?;
            }
        }

        Ok(Self { tera })
    }

    /// Render a template by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the template doesn't exist or rendering fails.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))
    }

    /// Render a flat task list.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn task_list(&self, view: &TaskListView) -> Result<String> {
        let mut context = Context::new();
        context.insert("view", view);
        self.render(TASK_LIST, &context)
    }

    /// Render a kanban board.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn kanban(&self, board: &KanbanBoard) -> Result<String> {
        let mut context = Context::new();
        context.insert("board", board);
        self.render(KANBAN, &context)
    }

    /// Render the project overview.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn projects(&self, view: &ProjectListView) -> Result<String> {
        let mut context = Context::new();
        context.insert("view", view);
        self.render(PROJECTS, &context)
    }
}

/// Get the list of all embedded template names.
#[must_use]
pub fn embedded_template_names() -> Vec<&'static str> {
    EMBEDDED_TEMPLATES.keys().copied().collect()
}
