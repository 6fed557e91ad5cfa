//! File library commands.

use crate::display::open_output;
use anyhow::{Context, Result, bail};
use entsoe_lib::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn client() -> Result<FileClient> {
    FileClient::new(FileConfig::default())
        .context("Cannot create file library client (are ENTSOE_USERNAME and ENTSOE_PWD set?)")
}

/// List the files of an export folder.
pub(crate) async fn list_folder(folder: &str) -> Result<()> {
    let files = client()?.list_folder(folder).await?;

    if files.is_empty() {
        println!("No files found.");
        return Ok(());
    }

    println!("{:<60} {}", "NAME", "ID");
    println!("{}", "-".repeat(80));
    for (name, id) in &files {
        println!("{name:<60} {id}");
    }

    println!("\nTotal: {} files", files.len());
    Ok(())
}

/// Download files by name or ids and write them as one tab-separated table.
pub(crate) async fn download(
    folder: Option<&str>,
    name: Option<&str>,
    ids: &[String],
    output: Option<PathBuf>,
) -> Result<()> {
    let client = client()?;

    let table = match (folder, name) {
        (Some(folder), Some(name)) => client.download_single_file(folder, name).await?,
        _ if !ids.is_empty() => client.download_multiple_files(ids).await?,
        _ => bail!("Pass --folder with --name, or one or more --id"),
    };
    tracing::info!(rows = table.len(), "downloaded");

    let mut writer = open_output(output.as_deref())?;
    writeln!(writer, "{}", table.headers().join("\t"))?;
    for record in table.records() {
        writeln!(writer, "{}", record.join("\t"))?;
    }
    writer.flush()?;
    Ok(())
}
