// Expected-pairs list.
//
// One pair per line, either form:
//     Kitchen - Dining
//     Kitchen, Dining
// A plain `-` (or an en/em dash) without surrounding spaces also separates.
// Blank lines, `#` comments and lines without two non-empty names are skipped.

/// Separators tried in order; the first one present in a line wins.
const SEPARATORS: &[&str] = &[",", " - ", " – ", " — ", "-", "–", "—"];

/// Names compare case-insensitively with runs of whitespace collapsed.
pub fn normalize_name(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse every well-formed line into a `(left, right)` pair of raw names.
pub fn parse_expected_pairs(text: &str) -> Vec<(String, String)> {
    text.lines().filter_map(parse_pair_line).collect()
}

fn parse_pair_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let sep = SEPARATORS.iter().find(|s| line.contains(**s))?;
    let (left, right) = line.split_once(sep)?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), right.to_string()))
}
