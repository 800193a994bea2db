//! Key command - show how key parts expand into a storage key

use crate::cache::{CacheKey, CacheOptions, KeyExpander};
use crate::cli::args::KeyArgs;
use crate::config::Config;
use crate::error::TrellisResult;
use crate::value::Value;
use console::style;

/// Execute the key command
pub async fn execute(args: KeyArgs, config: &Config) -> TrellisResult<()> {
    let key = CacheKey::new(args.parts.iter().map(|p| Value::parse(p)));
    let namespace = args
        .namespace
        .unwrap_or_else(|| config.cache.namespace.clone());
    let options = CacheOptions {
        skip_digest: args.skip_digest,
        scope: args.widget,
    };

    let storage_key = KeyExpander::new(namespace).expand(&key, &options);

    println!(
        "{:<9}{} ({} segment(s))",
        style("Key:").bold(),
        key,
        key.len()
    );
    println!("{:<9}{}", style("Digest:").bold(), !args.skip_digest);
    println!("{:<9}{}", style("Storage:").bold(), storage_key);
    Ok(())
}
