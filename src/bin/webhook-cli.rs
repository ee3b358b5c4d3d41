use clap::{Parser, Subcommand};
use serde_json::Value;

use cx_webhook::webhook::testing::TestRequestBuilder;
use cx_webhook::DynamicValue;

#[derive(Parser)]
#[command(name = "webhook-cli")]
#[command(about = "Send test requests to a conversational-agent webhook", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// POST a generated webhook request and print the reply
    Send {
        /// Route path, e.g. /confirm
        path: String,

        /// Session parameter as key=value (value parsed as JSON, else string)
        #[arg(short, long = "session", value_parser = parse_pair)]
        session: Vec<(String, DynamicValue)>,

        /// Payload parameter as key=value
        #[arg(short, long = "payload", value_parser = parse_pair)]
        payload: Vec<(String, DynamicValue)>,

        /// Fulfillment tag
        #[arg(short, long)]
        tag: Option<String>,

        /// End-user utterance
        #[arg(long)]
        text: Option<String>,

        /// Session id; random when omitted
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Print a generated webhook request without sending it
    Show {
        #[arg(short, long = "session", value_parser = parse_pair)]
        session: Vec<(String, DynamicValue)>,
    },
}

fn parse_pair(s: &str) -> Result<(String, DynamicValue), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(json) => cx_webhook::codec::decode(&json),
        Err(_) => DynamicValue::from(raw),
    };
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            path,
            session,
            payload,
            tag,
            text,
            session_id,
        } => {
            let mut builder = TestRequestBuilder::new();
            for (k, v) in session {
                builder = builder.session_parameter(k, v);
            }
            for (k, v) in payload {
                builder = builder.payload_parameter(k, v);
            }
            if let Some(tag) = tag {
                builder = builder.fulfillment_tag(tag);
            }
            if let Some(text) = text {
                builder = builder.text(text);
            }
            if let Some(id) = session_id {
                builder = builder.session_id(id);
            }
            let body = builder.build()?.to_json()?;

            let client = reqwest::Client::new();
            let res = client
                .post(format!("{}{}", cli.url.trim_end_matches('/'), path))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { session } => {
            let mut builder = TestRequestBuilder::new();
            for (k, v) in session {
                builder = builder.session_parameter(k, v);
            }
            let json: Value = serde_json::from_slice(&builder.build()?.to_json()?)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: webhook returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
