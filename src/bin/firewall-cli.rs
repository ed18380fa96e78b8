use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use api_firewall::config::{load_config, FirewallConfig};
use api_firewall::inspection::{Classification, GraphqlInspector, PayloadClassifier};
use api_firewall::signatures::SignatureCatalog;

#[derive(Parser)]
#[command(name = "firewall-cli")]
#[command(about = "Offline inspection and admin client for the API firewall", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API bearer key.
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    /// Configuration file used for offline inspection limits and signatures.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a payload ("-" or omitted reads stdin)
    Scan { payload: Option<String> },
    /// Inspect a GraphQL request body ("-" or omitted reads stdin)
    Graphql { body: Option<String> },
    /// Show firewall status
    Status,
    /// Show decision counters
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FirewallConfig::default(),
    };

    match cli.command {
        Commands::Scan { payload } => {
            let payload = read_input(payload)?;
            let catalog = Arc::new(SignatureCatalog::from_config(&config.signatures)?);
            let classifier = PayloadClassifier::new(catalog, config.inspection.max_payload_chars);
            match classifier.classify(&payload) {
                Classification::Clean => println!("clean"),
                Classification::Threat(category) => println!("blocked: {category}"),
                Classification::Oversized => println!("blocked: Payload Too Large"),
            }
        }
        Commands::Graphql { body } => {
            let body = read_input(body)?;
            let inspector = GraphqlInspector::new(
                config.inspection.max_graphql_depth,
                config.inspection.max_parse_nesting,
            );
            match inspector.inspect(&body) {
                Ok(()) => println!("clean"),
                Err(violation) => println!("blocked: {violation}"),
            }
        }
        Commands::Status => admin_get(&cli.url, &cli.key, "/admin/status").await?,
        Commands::Stats => admin_get(&cli.url, &cli.key, "/admin/stats").await?,
    }

    Ok(())
}

fn read_input(arg: Option<String>) -> Result<String, std::io::Error> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

async fn admin_get(base: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);

    let res = reqwest::Client::new()
        .get(format!("{base}{path}"))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
