use crate::cli::ParseArgs;
use crate::config::Config;
use crate::keys::{self, TransientKey};
use anyhow::Result;

pub fn execute(args: &ParseArgs, config: &Config) -> Result<()> {
    let namespaced = config.global.deployment.namespace_variants();
    match TransientKey::parse(&args.key, namespaced) {
        TransientKey::NotATransient => {
            println!("{}: not a transient key", args.key);
        }
        parsed => {
            let kind = match parsed {
                TransientKey::Timeout { .. } => "timeout",
                _ => "value",
            };
            if let Some((name, site)) = parsed.name() {
                println!("Key:       {}", args.key);
                println!("Kind:      {}", kind);
                println!("Name:      {}", name);
                println!("Namespace: {}", if site { "site" } else { "local" });
                println!("Primes:    {:?}", keys::prime_pair(name, site));
            }
        }
    }
    Ok(())
}
