use crate::cli::{connect, StatusArgs};
use crate::config::Config;
use crate::interceptor::{Activation, PrimeCapability};
use anyhow::Result;

pub async fn execute(args: &StatusArgs, config: &Config) -> Result<()> {
    let (client, activation) = connect(config).await?;

    println!("=== Transient Primer Status ===\n");
    println!("Service:    {}", client.service_name());
    println!("Backend:    {}", client.cache().backend().name());
    println!("Deployment: {:?}", config.global.deployment);

    let primer = match activation {
        Activation::Registered { priority } => format!("✅ REGISTERED (priority {})", priority),
        Activation::Disabled(reason) => format!("⚠️ DISABLED ({})", reason),
    };
    println!("Primer:     {}", primer);

    if args.verbose {
        let caps = client.cache().capabilities();
        println!("\nCapabilities:");
        println!("  batch_prime:              {}", caps.batch_prime);
        println!("  prefix_match:             {}", caps.prefix_match);
        println!("  native_transient_priming: {}", caps.native_transient_priming);

        println!("\nPre-read interceptors:");
        for (priority, name) in client.registry().describe() {
            println!("  {:>5}  {}", priority, name);
        }

        let alloptions = client.cache().load_alloptions().await?;
        println!("\nAutoloaded options: {}", alloptions.len());
    }

    Ok(())
}
