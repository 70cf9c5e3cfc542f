use anyhow::Context;
use clap::{Parser, Subcommand};
use medrelay_core::{FieldValue, PayloadMap, PushEvent};
use medrelay_sdk::RelayClient;

#[derive(Parser)]
#[command(name = "medrelay")]
#[command(about = "medrelay relay client")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:4000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit an event to every connected subscriber
    Emit {
        /// Event name
        #[arg(long, default_value = "notification")]
        event: String,
        /// Notification title
        #[arg(long)]
        title: Option<String>,
        /// Notification body
        #[arg(long)]
        body: Option<String>,
        /// Raw JSON object merged into the payload
        #[arg(long)]
        payload: Option<String>,
    },
    /// Relay health check
    Health,
    /// Subscribe and print pushed events
    Listen,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = RelayClient::new(&cli.server);

    match cli.command {
        Commands::Emit {
            event,
            title,
            body,
            payload,
        } => {
            let payload = build_payload(title, body, payload)?;
            match client.emit(&PushEvent { event, payload }).await {
                Ok(ack) => {
                    println!("emitted '{}' to all connected subscribers", ack.event);
                }
                Err(e) => {
                    eprintln!("failed to emit: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Health => match client.health().await {
            Ok(()) => println!("relay is healthy"),
            Err(e) => {
                eprintln!("health check failed: {e}");
                std::process::exit(1);
            }
        },
        Commands::Listen => {
            let mut rx = match client.connect_websocket().await {
                Ok(rx) => rx,
                Err(e) => {
                    eprintln!("failed to subscribe: {e}");
                    std::process::exit(1);
                }
            };
            println!("listening for pushed events (ctrl-c to stop)");
            while let Some(event) = rx.recv().await {
                println!("{}: {}", event.event, serde_json::to_string(&event.payload)?);
            }
        }
    }

    Ok(())
}

fn build_payload(
    title: Option<String>,
    body: Option<String>,
    raw: Option<String>,
) -> anyhow::Result<PayloadMap> {
    let mut payload: PayloadMap = match raw {
        Some(raw) => serde_json::from_str(&raw)
            .context("--payload must be a JSON object of scalar or nested-object values")?,
        None => PayloadMap::new(),
    };
    if let Some(title) = title {
        payload.insert("title".to_string(), FieldValue::Text(title));
    }
    if let Some(body) = body {
        payload.insert("body".to_string(), FieldValue::Text(body));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_payload_merges_flags_over_raw_json() {
        let payload = build_payload(
            Some("T".to_string()),
            None,
            Some(r#"{"title":"old","extra":1}"#.to_string()),
        )
        .unwrap();
        assert_eq!(payload.get("title"), Some(&FieldValue::Text("T".to_string())));
        assert_eq!(payload.get("extra"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn test_build_payload_rejects_non_object_json() {
        assert!(build_payload(None, None, Some("[1,2]".to_string())).is_err());
    }

    #[test]
    fn test_build_payload_empty() {
        assert!(build_payload(None, None, None).unwrap().is_empty());
    }
}
