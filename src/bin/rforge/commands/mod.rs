mod bins;
mod check;
mod runs;
mod uniq;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rec_forge::io::{Catalog, load_catalog, read_records};
use rec_forge::{RecordList, Schema};
use tracing::info;

use crate::cli::{Command, InputOptions};
use crate::display::Context as DisplayContext;
use crate::io::{open_input, stdin_is_tty};

pub fn dispatch(command: Command, ctx: DisplayContext) -> Result<()> {
    match command {
        Command::Check(args) => check::run(args, ctx),
        Command::Bins(args) => bins::run(args, ctx),
        Command::Uniq(args) => uniq::run(args, ctx),
        Command::Runs(args) => runs::run(args, ctx),
    }
}

fn catalog(opts: &InputOptions) -> Result<Catalog> {
    let custom = opts
        .catalog
        .as_deref()
        .map(|p| {
            fs::read_to_string(p)
                .with_context(|| format!("Failed to read kind catalog: {}", p.display()))
        })
        .transpose()?;
    load_catalog(custom.as_deref()).context("Failed to load kind catalog")
}

/// Reads the records of the requested kind.
fn load(opts: &InputOptions) -> Result<(Arc<Schema>, RecordList)> {
    if opts.input.is_none() && stdin_is_tty() {
        bail!(
            "No input file specified and stdin is a terminal.\n\nUsage: rforge <COMMAND> -k <KIND> -i <FILE> or pipe records via stdin."
        );
    }
    let catalog = catalog(opts)?;
    let kind = Arc::clone(catalog.require(&opts.kind)?);
    let reader = open_input(opts.input.as_deref())?;
    let list = read_records(reader, &kind)
        .with_context(|| format!("Failed to read '{}' records", opts.kind))?;
    info!(kind = %opts.kind, records = list.len(), "loaded records");
    Ok((kind, list))
}

fn field_refs(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}
