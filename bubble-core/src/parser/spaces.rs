// Bulk space list.
//
// One space per line:
//     Kitchen, 12
//     Living room: 28.5
//     Bath<TAB>6
//     Hall 9 m2
//     Storage                (no area: DEFAULT_AREA)
// A decimal comma is accepted (`Kitchen, 12,5`). A trailing unit (`m2`, `m²`, `sqm`)
// is ignored. Blank lines and `#` comments are skipped. Non-positive or unparsable
// areas fall back to DEFAULT_AREA.

/// Area given to spaces listed without one (m²).
pub const DEFAULT_AREA: f64 = 20.0;

const UNITS: &[&str] = &["m²", "m2", "sqm"];

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceEntry {
    pub name: String,
    pub area: f64,
}

pub fn parse_space_list(text: &str) -> Vec<SpaceEntry> {
    text.lines().filter_map(parse_space_line).collect()
}

fn parse_space_line(line: &str) -> Option<SpaceEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    // first split whose right side is an area wins; `,` splits at the first comma
    // so a decimal comma (`Kitchen, 12,5`) stays in the number
    let splits = [line.rsplit_once(':'), line.rsplit_once('\t'), line.split_once(','), line.rsplit_once(',')];
    for (name, rest) in splits.into_iter().flatten() {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(area) = parse_area(rest) {
            return Some(SpaceEntry { name: name.to_string(), area });
        }
    }

    for sep in [',', ':', '\t'] {
        if let Some((name, _)) = line.rsplit_once(sep) {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            return Some(SpaceEntry { name: name.to_string(), area: DEFAULT_AREA });
        }
    }

    // `Name 12` / `Name 12 m2`: take the trailing number if there is one
    let stripped = strip_unit(line);
    if let Some((name, last)) = stripped.rsplit_once(char::is_whitespace) {
        if let Some(area) = parse_area(last) {
            let name = name.trim();
            if !name.is_empty() {
                return Some(SpaceEntry { name: name.to_string(), area });
            }
        }
    }
    Some(SpaceEntry { name: line.to_string(), area: DEFAULT_AREA })
}

fn strip_unit(s: &str) -> &str {
    let s = s.trim();
    for unit in UNITS {
        if let Some(head) = s.strip_suffix(unit) {
            return head.trim_end();
        }
    }
    s
}

fn parse_area(s: &str) -> Option<f64> {
    let area: f64 = strip_unit(s).replace(',', ".").parse().ok()?;
    (area.is_finite() && area > 0.0).then_some(area)
}
