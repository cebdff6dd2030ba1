use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::data::export::{save_csv, write_csv};
use crate::data::loader::load_file;
use crate::data::model::HerdDataset;
use crate::filter::{check_parentheses, BoolColumnFilterSpec};
use crate::state::FilterSession;

#[derive(Parser, Debug)]
#[command(name = "mooselect")]
#[command(about = "Select herd records with a boolean filter expression")]
#[command(version)]
pub struct Cli {
    /// Herd table to read (.csv, .json, .parquet)
    pub input: PathBuf,

    /// Filter expression, e.g. "30 <= DIM <= 70 AND FCM > 30"
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Hide `true` cells of a boolean column
    #[arg(long, value_name = "COLUMN", action = clap::ArgAction::Append)]
    pub exclude_true: Vec<String>,

    /// Hide missing or empty cells of a boolean column
    #[arg(long, value_name = "COLUMN", action = clap::ArgAction::Append)]
    pub exclude_blank: Vec<String>,

    /// JSON file of boolean toggles, e.g. {"VACC": {"include_blank": false}}
    #[arg(long, value_name = "FILE")]
    pub toggles: Option<PathBuf>,

    /// Write the selected records to this CSV file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List the columns with their kinds and exit
    #[arg(long)]
    pub columns: bool,

    /// Reject an expression with unbalanced parentheses instead of warning
    #[arg(long)]
    pub strict: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let dataset = load_file(&cli.input)?;

    if cli.columns {
        return print_columns(&dataset, &mut std::io::stdout().lock());
    }

    if let Err(e) = check_parentheses(&cli.filter) {
        if cli.strict {
            return Err(e).context("checking filter expression");
        }
        log::warn!("filter expression: {e}; evaluating it as written");
    }

    let mut session = FilterSession::new(dataset);

    if let Some(path) = &cli.toggles {
        for (col, toggle) in load_toggles(path)? {
            session.set_include_true(&col, toggle.include_true)?;
            session.set_include_blank(&col, toggle.include_blank)?;
        }
    }
    for col in &cli.exclude_true {
        session.set_include_true(col, false)?;
    }
    for col in &cli.exclude_blank {
        session.set_include_blank(col, false)?;
    }

    session.set_expression(cli.filter);
    session.apply();

    let selected = session.selected_dataset();
    log::info!(
        "Selected {} of {} records",
        selected.len(),
        session.dataset.len()
    );

    match &cli.output {
        Some(path) => save_csv(&selected, path),
        None => write_csv(&selected, std::io::stdout().lock()),
    }
}

/// Read a toggle file: column name → `{ "include_true": .., "include_blank": .. }`,
/// with omitted flags left on.
pub fn load_toggles(path: &Path) -> Result<BoolColumnFilterSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading toggles from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing toggles in {}", path.display()))
}

fn print_columns(dataset: &HerdDataset, out: &mut impl Write) -> Result<()> {
    for col in &dataset.column_names {
        writeln!(out, "{col}\t{}", dataset.column_kind(col))?;
    }
    writeln!(out, "{} records", dataset.len())?;
    Ok(())
}
