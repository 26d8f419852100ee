use std::collections::HashMap;

use super::StreamName;
use crate::error::{PopsError, Result};

/// Parse a `name -> seed` key-value string using configurable item and
/// key-value separators, e.g. `parse_seed_map("weather=1,general=2", ',', '=')`
/// or the YAML-like `parse_seed_map("weather:1\ngeneral:2", '\n', ':')`.
///
/// Fails with [`PopsError::Parse`] on a malformed entry and
/// [`PopsError::InvalidArgument`] on an unrecognized stream name.
pub fn parse_seed_map(text: &str, item_sep: char, kv_sep: char) -> Result<HashMap<StreamName, u64>> {
    let mut map = HashMap::new();
    for raw_item in text.split(item_sep) {
        let item = raw_item.trim();
        if item.is_empty() {
            continue;
        }
        let mut parts = item.splitn(2, kv_sep);
        let key = parts.next().unwrap_or("").trim();
        let value = parts
            .next()
            .ok_or_else(|| PopsError::Parse(format!("missing '{kv_sep}' in seed entry: {item}")))?
            .trim();
        let name = StreamName::parse(key)?;
        let seed: u64 = value
            .parse()
            .map_err(|_| PopsError::Parse(format!("invalid seed value in entry: {item}")))?;
        map.insert(name, seed);
    }
    Ok(map)
}
