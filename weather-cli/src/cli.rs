use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{
    Config, ProviderId, ResolveOptions, SourceOverride, resolver_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log provider calls and fallbacks to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure an API key ("airnow") or the default source ("source").
    Configure {
        /// What to configure: "airnow" or "source".
        target: String,
    },

    /// Show weather for a free-text query, e.g. "Boston at 8 PM".
    Show {
        /// Location, optionally followed by a time ("tonight", "at 3am", ...).
        query: String,

        /// Force a source instead of picking by location.
        #[arg(long)]
        source: Option<SourceOverride>,

        /// Hourly forecast even without a time in the query.
        #[arg(long)]
        hourly: bool,

        /// Air quality from AirNow (needs an API key).
        #[arg(long)]
        aqi: bool,

        /// Latest observation from the nearest station.
        #[arg(long)]
        observe: bool,

        /// Sunrise, sunset, twilight and moon phase.
        #[arg(long)]
        astro: bool,

        /// Terminal aerodrome forecast for the nearest station.
        #[arg(long)]
        aviation: bool,

        /// Fire weather zone forecast.
        #[arg(long)]
        fire: bool,

        /// Snow, ice and precipitation totals.
        #[arg(long)]
        accumulation: bool,

        /// Skip active alerts.
        #[arg(long)]
        no_alerts: bool,

        /// Print the resolved facts as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { target } => configure(&target),
            Command::Show {
                query,
                source,
                hourly,
                aqi,
                observe,
                astro,
                aviation,
                fire,
                accumulation,
                no_alerts,
                json,
            } => {
                let config = Config::load()?.with_env_overrides();
                let options = ResolveOptions {
                    source: match source {
                        Some(source) => source,
                        None => config.default_source()?,
                    },
                    alerts: !no_alerts,
                    hourly,
                    accumulation,
                    air_quality: aqi,
                    observation: observe,
                    astronomy: astro,
                    aviation,
                    fire_weather: fire,
                };

                tracing::debug!(source = %options.source, ?options, "resolving query");
                let resolver = resolver_from_config(&config)?;
                let facts = resolver.resolve(&query, &options).await?;

                if json {
                    println!("{}", render::json(&facts)?);
                } else {
                    println!("{}", render::markdown(&facts));
                }
                Ok(())
            }
        }
    }
}

fn configure(target: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if target.eq_ignore_ascii_case("source") {
        let choice = Select::new("Default weather source:", SourceOverride::all().to_vec())
            .with_starting_cursor(2)
            .prompt()
            .context("Source selection cancelled")?;
        config.set_default_source(choice);
        config.save()?;
        println!("✅ Default source set to {choice}");
        return Ok(());
    }

    let provider = ProviderId::try_from(target)
        .with_context(|| format!("Cannot configure '{target}'. Targets: airnow, source."))?;
    if !provider.requires_api_key() {
        bail!("{provider} does not need an API key");
    }

    if config.is_provider_configured(provider) {
        println!("ℹ️  {provider} already has a key; entering a new one replaces it.");
    }

    let key = Password::new(&format!("{provider} API key:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key entry cancelled")?;
    let key = key.trim().to_string();
    if key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(provider, key);
    config.save()?;
    println!("✅ Saved {provider} API key to {}", Config::config_file_path()?.display());
    Ok(())
}
