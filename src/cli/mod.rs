pub mod diagnose;
pub mod extract;
pub mod fixpct;
pub mod inspect;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::layout::{Layout, LayoutRegistry};
use crate::workbook::{LoadedSheet, load_grid};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `key = value` line per item
    #[default]
    Lines,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Workbook to read (xlsx, xlsm, xls, ods)
    pub input: PathBuf,

    /// Worksheet name; defaults to the first sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// JSON file with additional layouts
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Layout version to apply; defaults to the file's default or sales-offer-v1
    #[arg(long = "layout-version")]
    pub layout_version: Option<String>,
}

impl SourceArgs {
    pub fn registry(&self) -> Result<LayoutRegistry> {
        match &self.layout {
            Some(path) => LayoutRegistry::load(path)
                .with_context(|| format!("cannot load layout file: {}", path.display())),
            None => Ok(LayoutRegistry::builtin()),
        }
    }

    pub fn layout(&self) -> Result<Layout> {
        let registry = self.registry()?;
        let layout = registry
            .select(self.layout_version.as_deref())
            .with_context(|| {
                let known: Vec<&str> = registry.versions().collect();
                format!("cannot select layout version (known: {})", known.join(", "))
            })?;
        Ok(layout.clone())
    }

    pub fn load(&self) -> Result<LoadedSheet> {
        load_grid(&self.input, self.sheet.as_deref())
            .with_context(|| format!("cannot read workbook: {}", self.input.display()))
    }
}
