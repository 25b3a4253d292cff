use anyhow::Result;
use std::io::{self, Write};

use crate::cli::CheckArgs;
use crate::display::{Context, print_kv_table};

pub fn run(args: CheckArgs, ctx: Context) -> Result<()> {
    let (kind, list) = super::load(&args.input)?;

    if args.dump {
        let mut out = io::stdout().lock();
        for (index, record) in list.iter().enumerate() {
            writeln!(out, "# {} {}", kind.name(), index + 1)?;
            write!(out, "{}", record.dump())?;
        }
    }

    if ctx.interactive {
        let orderable = list
            .first()
            .map(|r| r.attributes().values().filter(|v| v.is_orderable()).count())
            .unwrap_or(0);
        print_kv_table(
            "Validation Summary",
            &[
                ("Kind", kind.name().to_string()),
                ("Records", list.len().to_string()),
                ("Required", kind.required().len().to_string()),
                ("Optional", kind.optional().len().to_string()),
                ("Orderable (1st)", orderable.to_string()),
                ("Duplicates", (list.len() - distinct(&list)).to_string()),
            ],
        );
    }
    Ok(())
}

fn distinct(list: &rec_forge::RecordList) -> usize {
    let mut copy = list.clone();
    copy.remove_duplicates(None);
    copy.len()
}
