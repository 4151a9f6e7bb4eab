use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use restaurant_gatekeeper::security::PasswordHasher;

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Operator CLI for the restaurant gatekeeper", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an Argon2id digest for a [[users]] config entry
    HashPassword { password: String },
    /// Log in and print the issued token
    Login { username: String, password: String },
    /// Show the identity behind a token
    Me {
        #[arg(short, long)]
        token: String,
    },
    /// Show gatekeeper status (director token required)
    Status {
        #[arg(short, long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::HashPassword { password } => {
            let digest = PasswordHasher::default().hash(&password)?;
            println!("{digest}");
        }
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/auth/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Me { token } => {
            let res = client
                .get(format!("{}/api/me", cli.url))
                .headers(bearer(&token)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status { token } => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(bearer(&token)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn bearer(token: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gatekeeper returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
