mod pairs;
mod spaces;

pub use pairs::{normalize_name, parse_expected_pairs};
pub use spaces::{DEFAULT_AREA, SpaceEntry, parse_space_list};
