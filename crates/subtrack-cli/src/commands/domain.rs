//! Domain lookup command

use anyhow::Result;
use subtrack_core::domains::match_domain;

pub fn cmd_domain(url: &str) -> Result<()> {
    match match_domain(url) {
        Some(found) => {
            println!("✅ {} ({})", found.info.name, found.info.category);
            println!("   Matched: {}", found.domain);
            if let Some(cost) = found.info.default_cost {
                println!("   Typical cost: ${:.2}/month", cost);
            }
        }
        None => println!("No known subscription service for {}", url),
    }
    Ok(())
}
