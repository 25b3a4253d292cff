use anyhow::Result;
use std::io::{self, Write};

use crate::cli::BinsArgs;
use crate::display::{Context, print_bins};

pub fn run(args: BinsArgs, ctx: Context) -> Result<()> {
    let (_, list) = super::load(&args.input)?;
    let fields = super::field_refs(&args.by);

    let bins = if args.all {
        list.bin(&fields)
    } else {
        list.duplicates(&fields)
    };

    let mut out = io::stdout().lock();
    for (key, members) in &bins {
        writeln!(out, "{}\t{}", members.len(), key)?;
    }

    if ctx.interactive {
        let title = if args.all { "Bins" } else { "Colliding Bins" };
        print_bins(title, &bins);
    }
    Ok(())
}
