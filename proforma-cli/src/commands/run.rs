//! Run command - the consolidation page in the terminal
//!
//! Selects files and a COA, runs one consolidation, applies cell edits from
//! `--set` flags or an interactive prompt, and optionally exports the workbook.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use dialoguer::Input;

use proforma_core::adapters::http_api::HttpConsolidatorApi;
use proforma_core::services::{Phase, Workbench};
use proforma_core::RowField;

use crate::output;

pub struct RunArgs {
    pub files: Vec<PathBuf>,
    pub coa: Option<PathBuf>,
    pub coa_text: Option<String>,
    pub api_url: String,
    pub edits: Vec<String>,
    pub interactive: bool,
    pub out: Option<PathBuf>,
    pub json: bool,
}

/// A parsed `ROW:FIELD=VALUE` edit; `row` is 0-based
#[derive(Debug, PartialEq)]
struct CellEdit {
    row: usize,
    field: RowField,
    value: String,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let api = HttpConsolidatorApi::new(&args.api_url)?;
    let mut workbench = Workbench::new(Arc::new(api));

    for path in &args.files {
        workbench
            .add_file_from_path(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }
    if let Some(path) = &args.coa {
        workbench
            .load_coa_file(path)
            .with_context(|| format!("Failed to read COA file {}", path.display()))?;
    } else if let Some(text) = args.coa_text {
        workbench.set_coa_text(text);
    }

    let total_bytes: u64 = workbench.files().iter().map(|f| f.len() as u64).sum();
    let show_spinner = !args.json && atty::is(atty::Stream::Stderr);
    let spinner = show_spinner.then(|| {
        output::spinner(&format!(
            "Consolidating {} file(s), {}",
            workbench.files().len(),
            output::format_size(total_bytes)
        ))
    });

    workbench.run().await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if workbench.phase() == Phase::Error {
        bail!(
            "Consolidation failed: {}",
            workbench.error().unwrap_or("Unexpected error.")
        );
    }

    for raw in &args.edits {
        let edit = parse_edit(raw)?;
        workbench.edit_cell(edit.row, edit.field, &edit.value)?;
    }

    if args.interactive {
        edit_interactively(&mut workbench)?;
    }

    let result = workbench
        .result()
        .ok_or_else(|| anyhow!("No result returned"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print_result(&workbench);
    }

    if let Some(dir) = &args.out {
        let download = workbench.download().await?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&download.filename);
        std::fs::write(&path, &download.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !args.json {
            output::success(&format!(
                "Saved {} ({})",
                path.display(),
                output::format_size(download.bytes.len() as u64)
            ));
        }
    }

    Ok(())
}

fn print_result(workbench: &Workbench) {
    let Some(result) = workbench.result() else {
        return;
    };

    println!("{}", "Consolidated Statement".bold());
    if let Some(units) = &result.meta.units {
        println!("Units: {}", units);
    }
    println!("TTM present: {}", if result.meta.ttm_present { "yes" } else { "no" });
    println!();

    if result.rows.is_empty() {
        output::warning("No rows were extracted.");
    } else {
        println!("{}", output::result_table(result));
    }

    if !result.meta.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".bold());
        for warning in &result.meta.warnings {
            output::warning(&format!("  - {}", warning));
        }
    }
}

fn edit_interactively(workbench: &mut Workbench) -> Result<()> {
    print_result(workbench);
    output::info("Edit cells as ROW:FIELD=VALUE (fields: account_number, y2023, notes, ...). Empty line to finish.");

    loop {
        let line: String = Input::new()
            .with_prompt("Edit")
            .allow_empty(true)
            .interact_text()?;
        if line.trim().is_empty() {
            return Ok(());
        }

        match parse_edit(&line).and_then(|edit| {
            workbench
                .edit_cell(edit.row, edit.field, &edit.value)
                .map_err(anyhow::Error::from)
        }) {
            Ok(()) => output::success("Updated."),
            Err(e) => output::error(&format!("{:#}", e)),
        }
    }
}

/// Parse `ROW:FIELD=VALUE` with a 1-based ROW; VALUE may be empty
fn parse_edit(raw: &str) -> Result<CellEdit> {
    let (target, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid edit '{}': expected ROW:FIELD=VALUE", raw))?;
    let (row, field) = target
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid edit '{}': expected ROW:FIELD=VALUE", raw))?;

    let row: usize = row
        .trim()
        .parse()
        .with_context(|| format!("Invalid row number '{}'", row.trim()))?;
    if row == 0 {
        bail!("Row numbers start at 1");
    }

    Ok(CellEdit {
        row: row - 1,
        field: field.parse()?,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        assert_eq!(
            parse_edit("2:y2023=1234.5").unwrap(),
            CellEdit {
                row: 1,
                field: RowField::Y2023,
                value: "1234.5".to_string()
            }
        );
    }

    #[test]
    fn test_parse_edit_keeps_value_verbatim() {
        let edit = parse_edit("1:notes= a=b ").unwrap();
        assert_eq!(edit.field, RowField::Notes);
        assert_eq!(edit.value, " a=b ");

        let cleared = parse_edit("1:y2022=").unwrap();
        assert_eq!(cleared.value, "");
    }

    #[test]
    fn test_parse_edit_rejects_bad_input() {
        assert!(parse_edit("y2023=5").is_err());
        assert!(parse_edit("0:y2023=5").is_err());
        assert!(parse_edit("x:y2023=5").is_err());
        assert!(parse_edit("1:revenue=5").is_err());
    }
}
