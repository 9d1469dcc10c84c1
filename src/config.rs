use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::mangadex::MANGADEX_ID;
use crate::error::CatalogueError;
use crate::presenter::PresenterSettings;

const APP_DIR: &str = "catalogue-tui";

#[derive(Parser, Debug)]
#[command(name = "catalogue-tui", version, about = "Browse and search manga catalogues in the terminal")]
pub struct Cli {
    /// Id of the source to open
    #[arg(short, long)]
    pub source: Option<i32>,

    /// SQLite database holding known manga
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_source: i32,
    pub search_debounce_ms: u64,
    pub detail_batch_size: usize,
    pub database_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_source: MANGADEX_ID,
            search_debounce_ms: 1000,
            detail_batch_size: 3,
            database_path: None,
            log_path: None,
        }
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.json")
}

impl Settings {
    /// Reads the settings file. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| CatalogueError::Config {
                path: path.display().to_string(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Settings file named on the command line (or the default one), with
    /// command line values taking precedence.
    pub fn from_cli(cli: &Cli) -> Result<Self, CatalogueError> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        Ok(Self::load(&path)?.overridden_by(cli))
    }

    pub fn overridden_by(mut self, cli: &Cli) -> Self {
        if let Some(source) = cli.source {
            self.default_source = source;
        }
        if let Some(database) = &cli.database {
            self.database_path = Some(database.clone());
        }
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| app_dir(dirs::data_dir()).join("catalogue.db"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| app_dir(dirs::cache_dir()).join("catalogue.log"))
    }

    pub fn presenter(&self) -> PresenterSettings {
        PresenterSettings {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            detail_batch_size: self.detail_batch_size.max(1),
        }
    }
}
