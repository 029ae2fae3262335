use std::{fs, path::PathBuf};

use clap::Parser;
use utoipa::OpenApi;
use vetclinic_api::openapi::ApiDocV1;

#[derive(Parser, Debug)]
#[command(name = "openapi-export", about = "Write the OpenAPI document for /api/v1")]
struct Cli {
    /// Output file; `-` prints to stdout
    #[arg(short, long, default_value = "openapi/vetclinic-api.v1.json")]
    output: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = serde_json::to_string_pretty(&ApiDocV1::openapi())?;

    if cli.output == "-" {
        println!("{}", json);
        return Ok(());
    }

    let output_path = PathBuf::from(&cli.output);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, json)?;

    println!("OpenAPI spec written to {}", output_path.display());
    Ok(())
}
