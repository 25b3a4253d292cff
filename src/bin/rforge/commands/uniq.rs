use anyhow::{Context as _, Result};
use std::io::Write;

use rec_forge::io::write_records;
use rec_forge::ops::uniquify;

use crate::cli::UniqArgs;
use crate::display::{Context, print_kv_table};
use crate::io::create_output;

pub fn run(args: UniqArgs, ctx: Context) -> Result<()> {
    let (_, mut list) = super::load(&args.input)?;
    let fields = super::field_refs(&args.fields);
    let common = super::field_refs(&args.common);

    let colliding: usize = list.duplicates(&fields).values().map(|b| b.len()).sum();
    uniquify(&mut list, &fields, &common).context("Uniquification failed")?;

    let mut out = create_output(args.output.as_deref())?;
    write_records(&mut out, &[&list])?;
    out.flush()?;

    if ctx.interactive {
        let changed = list.iter().filter(|r| !r.stash().is_empty()).count();
        print_kv_table(
            "Uniquification Summary",
            &[
                ("Records", list.len().to_string()),
                ("Colliding", colliding.to_string()),
                ("Changed", changed.to_string()),
                ("Identity", args.fields.join(",")),
            ],
        );
    }
    Ok(())
}
