//! Sauti CLI - command-line client for the TTS server

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

/// Sauti - command-line client for the TTS server
///
/// Examples:
///   sauti status                          # Resident engine status
///   sauti speak "Hello world"             # Synthesize with a preset voice
///   sauti design "Hi" --voice "deep male" # Synthesize a described voice
///   sauti offload                         # Release device memory
#[derive(Parser)]
#[command(
    name = "sauti",
    about = "Command-line client for the Sauti TTS server",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server URL
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "SAUTI_SERVER",
        default_value = "http://localhost:8766"
    )]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show resident engine status
    Status,

    /// Evict the resident model, releasing device memory
    Offload,

    /// Synthesize speech with a preset speaker
    Speak {
        /// Text to synthesize
        text: String,

        /// Preset speaker name
        #[arg(short, long, default_value = "Vivian")]
        speaker: String,

        /// Language hint
        #[arg(short, long, default_value = "Auto")]
        language: String,

        /// Style instruction (emotion, pacing, ...)
        #[arg(short, long)]
        instruct: Option<String>,

        /// Output WAV path
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,
    },

    /// Synthesize speech for a voice described in natural language
    Design {
        /// Text to synthesize
        text: String,

        /// Voice description
        #[arg(short, long)]
        voice: String,

        /// Language hint
        #[arg(short, long, default_value = "Auto")]
        language: String,

        /// Output WAV path
        #[arg(short, long, default_value = "output.wav")]
        output: PathBuf,
    },

    /// List preset speakers
    Speakers,

    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.server.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Status => {
            let status: serde_json::Value = client
                .get(format!("{base}/api/v1/engine/status"))
                .send()
                .await
                .context("Failed to reach server")?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Offload => {
            client
                .post(format!("{base}/api/v1/engine/offload"))
                .send()
                .await
                .context("Failed to reach server")?
                .error_for_status()?;
            println!("Device memory released");
        }

        Commands::Speak {
            text,
            speaker,
            language,
            instruct,
            output,
        } => {
            let body = json!({
                "text": text,
                "speaker": speaker,
                "language": language,
                "instruct": instruct.unwrap_or_default(),
            });
            let bytes = post_tts(&client, &base, "custom-voice", &body).await?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), bytes.len());
        }

        Commands::Design {
            text,
            voice,
            language,
            output,
        } => {
            let body = json!({
                "text": text,
                "instruct": voice,
                "language": language,
            });
            let bytes = post_tts(&client, &base, "voice-design", &body).await?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), bytes.len());
        }

        Commands::Speakers => {
            let response: serde_json::Value = client
                .get(format!("{base}/api/v1/speakers"))
                .send()
                .await
                .context("Failed to reach server")?
                .error_for_status()?
                .json()
                .await?;
            print_list(&response, "speakers");
        }

        Commands::Languages => {
            let response: serde_json::Value = client
                .get(format!("{base}/api/v1/languages"))
                .send()
                .await
                .context("Failed to reach server")?
                .error_for_status()?
                .json()
                .await?;
            print_list(&response, "languages");
        }
    }

    Ok(())
}

async fn post_tts(
    client: &reqwest::Client,
    base: &str,
    endpoint: &str,
    body: &serde_json::Value,
) -> Result<Vec<u8>> {
    let response = client
        .post(format!("{base}/api/v1/tts/{endpoint}"))
        .json(body)
        .send()
        .await
        .context("Failed to reach server")?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        bail!("Server returned {}: {}", status, detail);
    }

    Ok(response.bytes().await?.to_vec())
}

fn print_list(response: &serde_json::Value, key: &str) {
    if let Some(items) = response.get(key).and_then(|v| v.as_array()) {
        for item in items {
            if let Some(s) = item.as_str() {
                println!("{s}");
            }
        }
    }
}
