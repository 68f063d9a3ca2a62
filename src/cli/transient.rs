//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! transient 读写与往返验证命令。

use crate::cli::{connect, GetArgs, SetArgs, VerifyArgs};
use crate::config::Config;
use crate::keys;
use crate::metrics::{get_metrics_string, GLOBAL_METRICS};
use anyhow::{Context, Result};
use serde_json::Value;

const READ_OPS: [&str; 3] = ["fetch", "fetch_many", "load_autoloaded"];

fn read_round_trips(service: &str) -> u64 {
    READ_OPS
        .iter()
        .map(|op| GLOBAL_METRICS.request_count(service, "L2", op, "issued"))
        .sum()
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn get(args: &GetArgs, config: &Config) -> Result<()> {
    let (client, _) = connect(config).await?;
    let value: Option<Value> = if args.site {
        client.get_site_transient(&args.name).await?
    } else {
        client.get_transient(&args.name).await?
    };
    match value {
        Some(value) => println!("{}", value),
        None => println!("(not set or expired)"),
    }
    Ok(())
}

pub async fn set(args: &SetArgs, config: &Config) -> Result<()> {
    let (client, _) = connect(config).await?;
    let value = parse_value(&args.value);
    let written = if args.site {
        client
            .set_site_transient(&args.name, &value, args.ttl)
            .await?
    } else {
        client.set_transient(&args.name, &value, args.ttl).await?
    };
    println!("{}", if written { "stored" } else { "unchanged" });
    Ok(())
}

pub async fn verify(args: &VerifyArgs, config: &Config) -> Result<()> {
    let (client, activation) = connect(config).await?;
    let service = client.service_name().to_string();
    let marker = Value::String(format!("verify-{}", chrono::Utc::now().timestamp()));

    client
        .set_transient(&args.name, &marker, args.ttl)
        .await
        .context("Failed to write transient")?;
    for key in keys::prime_pair(&args.name, false) {
        client.cache().evict(&key).await;
    }

    let before = read_round_trips(&service);
    let value: Option<Value> = client.get_transient(&args.name).await?;
    let trips = read_round_trips(&service) - before;
    client.delete_transient(&args.name).await?;

    println!("Primer:      {:?}", activation);
    println!("Value match: {}", value.as_ref() == Some(&marker));
    println!("Read trips:  {}", trips);

    if args.metrics {
        println!();
        print!("{}", get_metrics_string());
    }
    Ok(())
}
