//! Field-name shortening for formats limited to ten-character names.

pub const MAX_FIELD_NAME: usize = 10;

/// Prefixes of joined reference tables, stripped from field names outside
/// their own table.
const JOINED_PREFIXES: &[&str] = &["DescriptionOfMapUnits", "DataSources"];

const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("And", ""),
    ("Of", ""),
    ("Unit", "Un"),
    ("Source", "Src"),
    ("Shape", "Shp"),
    ("Hierarchy", "H"),
    ("Description", "Descript"),
    ("AreaFill", ""),
    ("Structure", "Struct"),
    ("STRUCTURE", "STRUCT"),
];

fn is_upper_or_caseless(c: char) -> bool {
    let mut upper = c.to_uppercase();
    upper.next() == Some(c) && upper.next().is_none()
}

fn is_lower_or_caseless(s: &[char]) -> bool {
    s.iter().all(|&c| {
        let mut lower = c.to_lowercase();
        lower.next() == Some(c) && lower.next().is_none()
    })
}

/// Abbreviates a field name: common words are shortened, then every
/// capital (or caseless character) is kept along with at most two
/// lowercase letters after it. Two compaction passes drop lowercase
/// letters near the front while the result is still too long.
///
/// Names that stay longer than ten characters are logged and returned
/// anyway.
pub fn remap_field_name(name: &str) -> String {
    let mut substituted = name.to_string();
    for (from, to) in SUBSTITUTIONS {
        substituted = substituted.replace(from, to);
    }

    let mut short: Vec<char> = Vec::with_capacity(substituted.len());
    let mut run = 0;
    for c in substituted.chars() {
        if is_upper_or_caseless(c) {
            short.push(c);
            run = 1;
        } else {
            run += 1;
            if run < 4 {
                short.push(c);
            }
        }
    }

    if short.len() > MAX_FIELD_NAME && is_lower_or_caseless(&short[1..3]) {
        short.drain(1..3);
    }
    if short.len() > MAX_FIELD_NAME && is_lower_or_caseless(&short[3..5]) {
        short.drain(2..5);
    }

    let short: String = short.into_iter().collect();
    if short.chars().count() > MAX_FIELD_NAME {
        log::warn!("      {}  {}", name, short);
    }
    short
}

/// Output name of `field` in `table`: joined-table prefixes are removed,
/// then names over ten characters are abbreviated.
pub fn short_field_name(table: &str, field: &str) -> String {
    let mut name = field;
    for prefix in JOINED_PREFIXES {
        if table != *prefix && name.starts_with(prefix) {
            name = name.get(prefix.len() + 1..).unwrap_or("");
        }
    }
    if name.chars().count() > MAX_FIELD_NAME {
        remap_field_name(name)
    } else {
        name.to_string()
    }
}
