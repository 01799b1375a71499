use std::fmt::Write as _;

use clap::{Parser, Subcommand};
use infocars_cascade::{render_text, CascadeController, CascadeSnapshot};
use infocars_core::{CatalogItem, VehicleKind};
use infocars_fipe::{CatalogSource, FipeClient};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "infocars")]
#[command(about = "Look up FIPE reference prices for Brazilian vehicles")]
struct Cli {
    /// Vehicle category; overrides `INFOCARS_VEHICLE_KIND`.
    #[arg(long, global = true)]
    kind: Option<VehicleKind>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk brand, model and year down to a vehicle price. Stages left out
    /// default to the first option.
    Lookup {
        #[arg(long)]
        brand: Option<String>,
        #[arg(long, requires = "brand")]
        model: Option<String>,
        #[arg(long, requires = "model")]
        year: Option<String>,
    },
    /// List brands.
    Brands,
    /// List the models of a brand.
    Models {
        #[arg(long)]
        brand: String,
    },
    /// List the model years of a model.
    Years {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = infocars_core::load_app_config()?;
    if let Some(kind) = cli.kind {
        config.vehicle_kind = kind;
    }
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = FipeClient::new(&config)?;
    let output = match cli.command {
        Commands::Lookup { brand, model, year } => {
            let snapshot = lookup(
                client,
                brand.as_deref(),
                model.as_deref(),
                year.as_deref(),
            )
            .await;
            if cli.json {
                serde_json::to_string_pretty(&snapshot)? + "\n"
            } else {
                render_text(&snapshot)
            }
        }
        Commands::Brands => format_items(&client.fetch_brands().await?, cli.json)?,
        Commands::Models { brand } => {
            format_items(&client.fetch_models(&brand).await?, cli.json)?
        }
        Commands::Years { brand, model } => {
            format_items(&client.fetch_years(&brand, &model).await?, cli.json)?
        }
    };
    print!("{output}");
    Ok(())
}

/// Applies the given choices and waits for the cascade to settle.
///
/// Choices are applied before anything loads, so auto-selection only fills
/// the stages left out.
async fn lookup<S: CatalogSource>(
    source: S,
    brand: Option<&str>,
    model: Option<&str>,
    year: Option<&str>,
) -> CascadeSnapshot {
    let controller = CascadeController::new(source);
    if let Some(code) = brand {
        controller.set_brand(code);
    }
    if let Some(code) = model {
        controller.set_model(code);
    }
    if let Some(code) = year {
        controller.set_year(code);
    }
    controller.settle().await;
    tracing::debug!(selection = ?controller.selection(), "lookup settled");
    controller.snapshot()
}

fn format_items(items: &[CatalogItem], json: bool) -> anyhow::Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(items)?;
        out.push('\n');
        return Ok(out);
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{}\t{}", item.code, item.label);
    }
    Ok(out)
}

#[cfg(test)]
mod tests;
