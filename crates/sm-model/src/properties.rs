//! Plain key/value parameter files.
//!
//! One entry per line, `key=value` or `key: value`. Lines starting with `#`
//! or `!` are comments. Later duplicates win.

use std::collections::BTreeMap;

pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(split) = line.find(|c: char| c == '=' || c == ':') else {
            continue;
        };
        let key = line[..split].trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), line[split + 1..].trim().to_string());
    }
    out
}
