use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};

use response_relay::relay::{ClientRelay, ClientRelayConfig};

#[derive(Parser)]
#[command(name = "relay-client")]
#[command(about = "Call the relay service and print the normalized result", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Timeout for normalized GET calls.
    #[arg(short, long, default_value_t = 3000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET with full normalization (e.g. /api-proxy-get-error -f errorPath=api-404-error)
    Get(FieldArgs),
    /// POST urlencoded fields
    Post(FieldArgs),
    /// PUT urlencoded fields
    Put(FieldArgs),
    /// DELETE with urlencoded fields
    Delete(FieldArgs),
    /// POST multipart/form-data with fields and files
    Multipart {
        #[command(flatten)]
        fields: FieldArgs,
        /// File to upload as field=path (repeatable)
        #[arg(long = "file", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
}

#[derive(clap::Args)]
struct FieldArgs {
    /// Request path, e.g. /get
    path: String,
    /// Form field as key=value (repeatable)
    #[arg(short, long = "field", value_parser = parse_pair)]
    fields: Vec<(String, String)>,
}

fn parse_pair(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", input))
}

async fn multipart_form(fields: Vec<(String, String)>, files: Vec<(String, String)>) -> Result<Form, Box<dyn std::error::Error>> {
    let mut form = Form::new();
    for (key, value) in fields {
        form = form.text(key, value);
    }
    for (field, path) in files {
        let path = PathBuf::from(path);
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        form = form.part(field, Part::bytes(bytes).file_name(file_name));
    }
    Ok(form)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let relay = ClientRelay::new(ClientRelayConfig {
        base_url: cli.url,
        timeout_ms: cli.timeout_ms,
    })?;

    let completion = match cli.command {
        Commands::Get(args) => relay.get(&args.path, args.fields),
        Commands::Post(args) => relay.post(&args.path, args.fields),
        Commands::Put(args) => relay.put(&args.path, args.fields),
        Commands::Delete(args) => relay.delete(&args.path, args.fields),
        Commands::Multipart { fields, files } => {
            let form = multipart_form(fields.fields, files).await?;
            relay.post_multipart(&fields.path, form)
        }
    };

    println!("{}", completion.await.render());
    Ok(())
}
