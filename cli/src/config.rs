//! Project configuration file.
//!
//! Collects the paths one project reconciles so they need not be repeated
//! on every invocation. Command-line flags override file values.
//!
//! # Example YAML
//!
//! ```yaml
//! html:
//!   - public/signup.html
//!   - public/incident.html
//! database:
//!   path: exports/user_signup.json
//!   strategy: auto
//! table: user_signup
//! pdf: templates/report.pdf
//! mapping: lib/pdfFiller.js
//! primary: ui
//! max_distance: 5
//! output: reports/reconciliation.csv
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use fieldmap_sqlite::DatabaseConfig;
use serde::{Deserialize, Serialize};

/// Which namespace drives a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Primary {
    /// HTML form fields, checked against the database then the PDF.
    #[default]
    Ui,
    /// Table columns, checked against the PDF through the mapping.
    Database,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// HTML pages whose form fields form the UI namespace.
    pub html: Vec<PathBuf>,
    pub database: Option<DatabaseConfig>,
    /// Table whose columns form the database namespace.
    pub table: Option<String>,
    /// PDF template with the AcroForm.
    pub pdf: Option<PathBuf>,
    /// PDF-filling source code, or a mapping CSV exported earlier.
    pub mapping: Option<PathBuf>,
    pub primary: Option<Primary>,
    pub max_distance: Option<usize>,
    /// Reconciliation CSV destination.
    pub output: Option<PathBuf>,
}

impl ProjectConfig {
    /// Loads a project file and resolves its relative paths.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read config '{}': {err}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|err| format!("Failed to parse config '{}': {err}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    /// Loads `path` if given, otherwise returns an empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, String> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        self.html.iter_mut().for_each(resolve);
        if let Some(database) = &mut self.database {
            resolve(&mut database.path);
        }
        for path in [&mut self.pdf, &mut self.mapping, &mut self.output]
            .into_iter()
            .flatten()
        {
            resolve(path);
        }
        self
    }
}
