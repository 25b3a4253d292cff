use anyhow::{Context as _, Result};
use std::io::Write;

use rec_forge::io::write_records;
use rec_forge::ops::intervals::{StateInterval, mark_buildable, reduce};
use rec_forge::{Record, Value};

use crate::cli::RunsArgs;
use crate::display::{Context, print_intervals};
use crate::io::create_output;

const RESOLVED: &str = "RESOLVED";
const MISSING: &str = "MISSING";

/// Presence state: an absent attribute or an empty nested list is missing.
fn presence(record: &Record, attr: &str) -> Value {
    match record.get(attr) {
        Some(Value::List(list)) if list.is_empty() => Value::from(MISSING),
        Some(_) => Value::from(RESOLVED),
        None => Value::from(MISSING),
    }
}

pub fn run(args: RunsArgs, ctx: Context) -> Result<()> {
    let (_, list) = super::load(&args.input)?;
    let attr = args.attr.as_str();

    let mut intervals = if args.presence {
        reduce(&list, |r| presence(r, attr))
    } else {
        reduce(&list, |r| r.get(attr).cloned().unwrap_or_else(|| Value::from(MISSING)))
    }
    .context("Interval reduction failed")?;

    if let Some(state) = &args.buildable {
        let wanted = Value::from(state.as_str());
        mark_buildable(&mut intervals, |s| *s == wanted)?;
    }

    let mut out = create_output(args.output.as_deref())?;
    write_records(&mut out, &[&intervals])?;
    out.flush()?;

    if ctx.interactive {
        let typed = intervals
            .iter()
            .map(StateInterval::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        print_intervals(&typed);
    }
    Ok(())
}
