use std::io::{self, Write};

use rec_forge::{RecordList, StateInterval};

use super::clip;

const INDENT: &str = "      ";
const TABLE_WIDTH: usize = 56;

fn rule(out: &mut impl Write, left: char, mid: char, right: char, widths: &[usize]) {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    let _ = writeln!(out, "{}{}{}{}", INDENT, left, segments.join(&mid.to_string()), right);
}

fn row(out: &mut impl Write, cells: &[(&str, usize, bool)]) {
    let _ = write!(out, "{}│", INDENT);
    for (text, width, right_align) in cells {
        let text = clip(text, *width);
        if *right_align {
            let _ = write!(out, " {:>width$} │", text, width = width);
        } else {
            let _ = write!(out, " {:<width$} │", text, width = width);
        }
    }
    let _ = writeln!(out);
}

fn table(out: &mut impl Write, title: &str, header: (&str, &str), rows: &[(String, String)]) {
    let val_w = 10usize;
    let key_w = TABLE_WIDTH - val_w - 7;
    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, clip(title, TABLE_WIDTH - 6));
    rule(out, '┌', '┬', '┐', &[key_w, val_w]);
    row(out, &[(header.0, key_w, false), (header.1, val_w, true)]);
    rule(out, '├', '┼', '┤', &[key_w, val_w]);
    for (key, val) in rows {
        row(out, &[(key.as_str(), key_w, false), (val.as_str(), val_w, true)]);
    }
    rule(out, '└', '┴', '┘', &[key_w, val_w]);
}

pub fn print_kv_table(title: &str, rows: &[(&str, String)]) {
    let rows: Vec<(String, String)> = rows.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    table(&mut io::stderr().lock(), title, ("Metric", "Value"), &rows);
}

pub fn print_bins<'a>(title: &str, bins: impl IntoIterator<Item = (&'a String, &'a RecordList)>) {
    let rows: Vec<(String, String)> = bins
        .into_iter()
        .map(|(key, members)| (key.clone(), members.len().to_string()))
        .collect();
    table(&mut io::stderr().lock(), title, ("Key", "Records"), &rows);
}

pub fn print_intervals(intervals: &[StateInterval]) {
    let rows: Vec<(String, String)> = intervals
        .iter()
        .map(|iv| {
            let flag = match iv.buildable {
                Some(true) => " (buildable)",
                _ => "",
            };
            (format!("{}{}", iv.state, flag), format!("{}-{}", iv.start, iv.end))
        })
        .collect();
    table(&mut io::stderr().lock(), "State Intervals", ("State", "Indices"), &rows);
}
