//! CLI helpers

use std::collections::BTreeMap;

use miette::{miette, Result};

/// Parse repeated `KEY=VALUE` pairs into an ordered mapping. Later pairs
/// overwrite earlier ones for the same key.
pub fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| miette!("invalid --env '{}': expected KEY=VALUE", pair))?;
        if key.is_empty() {
            return Err(miette!("invalid --env '{}': empty key", pair));
        }
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}
