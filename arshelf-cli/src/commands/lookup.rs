//! Barcode lookup against a running server
//!
//! Does what the AR viewer does after decoding a barcode: resolve it to a
//! product and, optionally, fetch the linked model file.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use uuid::Uuid;

use arshelf_client::Request;

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// App the product belongs to
    pub app_id: Uuid,

    /// Barcode value as decoded by the scanner
    pub barcode: String,

    /// Server base URL
    #[arg(long, env = "ARSHELF_SERVER", default_value = "http://127.0.0.1:3030")]
    pub server: String,

    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,

    /// Save the linked model file to this path
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
}

pub async fn run_lookup(args: LookupArgs) -> Result<()> {
    let client = Request::new(&args.server)?;
    let scan = client
        .lookup_barcode(args.app_id, &args.barcode)
        .await
        .map_err(|e| anyhow!(e.display_message()))
        .with_context(|| format!("Lookup of '{}' failed", args.barcode))?;

    if args.json {
        let model = scan.model.as_ref().map(|m| {
            serde_json::json!({
                "id": m.id,
                "name": m.name,
                "file_name": m.file_name,
                "content_type": m.content_type,
                "size_bytes": m.size_bytes,
                "file_url": m.file_url,
            })
        });
        let out = serde_json::json!({
            "product": {
                "id": scan.product.id,
                "name": scan.product.name,
                "barcode": scan.product.barcode,
                "description": scan.product.description,
            },
            "model": model,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{} ({})", scan.product.name, scan.product.barcode);
        if let Some(description) = &scan.product.description {
            println!("  {}", description);
        }
        match &scan.model {
            Some(model) => println!(
                "  model: {} [{}; {} bytes]",
                model.file_name, model.content_type, model.size_bytes
            ),
            None => println!("  no model linked"),
        }
    }

    if let Some(path) = args.save {
        let model = scan
            .model
            .as_ref()
            .context("Product has no model to save")?;
        let bytes = client
            .download_model(model)
            .await
            .map_err(|e| anyhow!(e.display_message()))?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "model saved");
    }

    Ok(())
}
