use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "Query a running health-router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List healthy backends for every service
    Backends,
    /// Ask for the next backend of a service (round robin)
    Next {
        #[arg(short, long)]
        service: String,

        /// Number of consecutive selections
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Show refresh state per service
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Backends => {
            let res = client.get(format!("{}/healthy-backends", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Next { service, count } => {
            for _ in 0..count {
                let res = client
                    .get(format!("{}/next-backend", base))
                    .query(&[("service", service.as_str())])
                    .send()
                    .await?;
                print_response(res).await?;
            }
        }
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;

    if !status.is_success() {
        eprintln!("Error ({}): {}", status, json["error"].as_str().unwrap_or("unknown error"));
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
