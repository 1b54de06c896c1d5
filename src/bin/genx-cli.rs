use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "genx-cli")]
#[command(about = "Command-line client for the GenX gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the health endpoint
    Health,
    /// POST a JSON body to a route
    Post {
        /// Route path, e.g. /api/data
        path: String,
        /// JSON body
        body: String,
    },
    /// Open the channel, send each message, and print every reply
    Ws {
        /// Messages to send, one frame each
        messages: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Post { path, body } => {
            let json: Value = serde_json::from_str(&body)?;
            let res = client
                .post(format!("{}{}", base, path))
                .json(&json)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ws { messages } => {
            let ws_url = channel_url(base);
            let (mut socket, _) = connect_async(ws_url.as_str()).await?;

            // Welcome
            if let Some(frame) = socket.next().await {
                print_frame(frame?)?;
            }

            for message in messages {
                socket.send(Message::Text(message.into())).await?;
                match socket.next().await {
                    Some(frame) => print_frame(frame?)?,
                    None => {
                        eprintln!("Error: channel closed by server");
                        return Ok(());
                    }
                }
            }

            socket.close(None).await?;
        }
    }

    Ok(())
}

fn channel_url(base: &str) -> String {
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}/", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}/", rest)
    } else {
        format!("{}/", base)
    }
}

fn print_frame(frame: Message) -> Result<(), Box<dyn std::error::Error>> {
    match frame {
        Message::Text(text) => {
            let json: Value = serde_json::from_str(text.as_str())?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Message::Close(close) => {
            eprintln!("Channel closed: {:?}", close);
        }
        other => {
            eprintln!("Unexpected frame: {:?}", other);
        }
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
