//! Text helpers for summaries, excerpts and shell command construction.

/// Collapse whitespace and cap the result at `max_chars` characters,
/// ending with `...` when shortened.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(3);
    let mut shortened: String = collapsed.chars().take(keep).collect();
    shortened.push_str("...");
    shortened
}

/// A line- and character-capped excerpt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipped {
    pub text: String,
    /// Lines dropped by the line cap
    pub omitted_lines: usize,
    /// Whether the character cap cut the text
    pub truncated: bool,
}

impl Clipped {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Keep at most `max_lines` lines, then at most `max_chars` characters.
pub fn clip_lines(text: &str, max_lines: usize, max_chars: usize) -> Clipped {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Clipped {
            text: String::new(),
            omitted_lines: 0,
            truncated: false,
        };
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let omitted_lines = lines.len().saturating_sub(max_lines);
    let mut clipped = lines[..lines.len().min(max_lines)].join("\n");
    let truncated = clipped.chars().count() > max_chars;
    if truncated {
        clipped = clipped.chars().take(max_chars).collect();
    }
    Clipped {
        text: clipped,
        omitted_lines,
        truncated,
    }
}

/// Quote a word for POSIX `sh` unless it is made only of safe characters.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ':' | '=' | '+' | ',')
        });
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Turn an identifier into a filesystem-safe slug (`2.1 Nodes Ready` → `2_1_nodes_ready`)
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_underscore = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !slug.is_empty() {
            slug.push('_');
            last_underscore = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}
