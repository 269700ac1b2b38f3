//! Instruments command - list General MIDI instruments for the voice renderer

use anyhow::Result;
use clap::Args;

use skysweep_core::instruments::{FEATURED, name_for, program_for};

/// Arguments for the instruments command
#[derive(Args, Debug, Default)]
pub struct InstrumentsArgs {
    /// Only list instruments whose name contains this text
    pub filter: Option<String>,

    /// List all 128 instruments instead of the featured ones
    #[arg(short, long)]
    pub all: bool,
}

/// `(program, name)` rows to print, featured instruments first.
pub fn listing(args: &InstrumentsArgs) -> Vec<(u8, &'static str)> {
    let filter = args.filter.as_deref().map(str::to_ascii_lowercase);
    let matches = |name: &str| {
        filter
            .as_deref()
            .is_none_or(|needle| name.to_ascii_lowercase().contains(needle))
    };

    let mut rows: Vec<(u8, &'static str)> = FEATURED
        .iter()
        .filter_map(|name| program_for(name).map(|program| (program, *name)))
        .collect();

    // A filter searches the whole table
    if args.all || filter.is_some() {
        rows.extend(
            (0..=127u8)
                .filter_map(|program| name_for(program).map(|name| (program, name)))
                .filter(|(_, name)| !FEATURED.contains(name)),
        );
    }
    rows.retain(|(_, name)| matches(name));
    rows
}

/// Execute the instruments command
pub fn execute(args: InstrumentsArgs) -> Result<()> {
    let rows = listing(&args);
    if rows.is_empty() {
        println!("No instruments found.");
        return Ok(());
    }

    for (program, name) in rows {
        let marker = if FEATURED.contains(&name) { "*" } else { " " };
        println!("{marker} {program:>3}  {name}");
    }
    if !args.all && args.filter.is_none() {
        println!("\nUse --all to list every General MIDI instrument.");
    }
    Ok(())
}
