mod error;
mod tables;

pub use error::print_error;
pub use tables::{print_bins, print_intervals, print_kv_table};

#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub interactive: bool,
}

impl Context {
    pub fn detect() -> Self {
        Self {
            interactive: crate::io::stderr_is_tty(),
        }
    }

    pub fn with_quiet(self, quiet: bool) -> Self {
        Self {
            interactive: self.interactive && !quiet,
        }
    }
}

/// Greedy word wrap; never returns an empty vector.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        match lines.last_mut() {
            Some(line) if line.len() + 1 + word.len() <= width => {
                line.push(' ');
                line.push_str(word);
            }
            _ => lines.push(word.to_string()),
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Cuts `s` to at most `max` characters, marking the cut with an ellipsis.
pub(crate) fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    if max == 0 { kept } else { kept + "…" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_between_words() {
        assert_eq!(wrap("schema violation for kind", 12), vec!["schema", "violation", "for kind"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn clip_marks_cut_text() {
        assert_eq!(clip("resname=ALA", 20), "resname=ALA");
        assert_eq!(clip("resname=ALA;chainID=A", 8), "resname…");
        assert_eq!(clip("日本語テスト", 4), "日本語…");
    }
}
