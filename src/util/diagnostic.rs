//! Terminal rendering of generator errors.
//!
//! A [`Diagnostic`] is the user-facing form of an error: a headline, the
//! file it is about, a few notes and the fixes worth trying. Rendering is
//! plain text unless color is requested.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use crate::util::fs::to_slash;

/// Fix-it hints shared by several errors.
pub mod suggestions {
    pub const USE_FORCE: &str = "Re-run with `--force` to overwrite the existing setup";

    pub const UPGRADE_CYPRESS: &str = "Upgrade Cypress with your package manager to 10.0.0 or newer";

    pub const LIST_PROJECTS: &str =
        "Check `workspace.json` or the `project.json` files for valid project names";

    pub const INSTALL_NEXT_PLUGIN: &str =
        "Install `@nrwl/next` so the Next.js webpack config can be discovered";
}

/// ANSI styles: bold red label, bold green help.
const ERROR_STYLE: &str = "1;31";
const HELP_STYLE: &str = "1;32";

/// A renderable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    headline: String,
    location: Option<PathBuf>,
    notes: Vec<String>,
    fixes: Vec<String>,
}

impl Diagnostic {
    pub fn error(headline: impl Into<String>) -> Self {
        Diagnostic {
            headline: headline.into(),
            location: None,
            notes: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// Attach a note rendered as `= note`.
    pub fn with_context(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Attach a fix rendered under `help`.
    pub fn with_suggestion(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    /// The workspace file the diagnostic is about.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal. A single fix goes on the `help:` line, several
    /// are numbered below it.
    pub fn format(&self, color: bool) -> String {
        let paint = |style: &str, text: &str| {
            if color {
                format!("\x1b[{}m{}\x1b[0m", style, text)
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", paint(ERROR_STYLE, "error"), self.headline);
        if let Some(path) = &self.location {
            let _ = writeln!(out, "  --> {}", to_slash(path));
        }
        for note in &self.notes {
            let _ = writeln!(out, "  = {}", note);
        }

        let help = paint(HELP_STYLE, "help");
        match self.fixes.as_slice() {
            [] => {}
            [fix] => {
                let _ = writeln!(out, "{}: {}", help, fix);
            }
            fixes => {
                let _ = writeln!(out, "{}: try one of", help);
                for (n, fix) in fixes.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", n + 1, fix);
                }
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
