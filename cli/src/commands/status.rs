use anyhow::{bail, Result};
use colored::Colorize;
use serde_json::Value;
use std::time::Duration;

use crate::utils::{print_error, print_header};

pub async fn run(url: &str) -> Result<()> {
    let base = url.trim_end_matches('/');
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;

    print_header("TestLab Server Status");

    let health: Value = match client.get(format!("{}/health", base)).send().await {
        Ok(resp) if resp.status().is_success() => resp.json().await?,
        Ok(resp) => {
            print_error(&format!("{} answered {}", base, resp.status()));
            bail!("Server unhealthy");
        }
        Err(e) => {
            print_error(&format!("{} is not reachable: {}", base, e));
            bail!("Server not running");
        }
    };

    let state = health["status"].as_str().unwrap_or("unknown");
    println!("{} Server: {} at {}", "✅", state.green(), base);

    let setup = if health["isSetup"].as_bool().unwrap_or(false) {
        "complete".green()
    } else {
        "required".yellow()
    };
    println!("   Setup:  {}", setup);

    // Analyzer list is informational only
    if let Ok(resp) = client.get(format!("{}/status", base)).send().await {
        if let Ok(status) = resp.json::<Value>().await {
            if let Some(analyzers) = status["analyzers"].as_array() {
                let names: Vec<&str> = analyzers.iter().filter_map(Value::as_str).collect();
                println!("   Analyzers: {}", names.join(", "));
            }
        }
    }

    Ok(())
}
