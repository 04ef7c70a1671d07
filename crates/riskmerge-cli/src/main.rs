mod display;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use riskmerge_core::{ConsolidationConfig, RawRisk, Risk, TierResult};
use riskmerge_engine::{ThreeTierAnalyzer, detect};
use serde_json::Value;
use tracing::Level;

#[derive(Parser)]
#[command(name = "riskmerge")]
#[command(version)]
#[command(about = "Consolidate contract risks from template, industry and general analysis tiers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge three tier results into one de-duplicated risk list
    Consolidate {
        /// Template tier result (JSON object or bare array of risks)
        #[arg(long)]
        template: Option<PathBuf>,

        /// Industry tier result
        #[arg(long)]
        industry: Option<PathBuf>,

        /// General tier result
        #[arg(long)]
        general: Option<PathBuf>,

        #[arg(long, short = 'o', default_value = "report", value_enum)]
        format: OutputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Score two single risks against each other
    Score {
        /// Existing (candidate) risk as JSON
        candidate: PathBuf,

        /// Incoming risk as JSON
        incoming: PathBuf,

        #[arg(long, short = 'o', default_value = "report", value_enum)]
        format: OutputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Report,
    Json,
}

/// Settings layered over the defaults and an optional TOML file.
#[derive(Args, Default)]
struct ConfigArgs {
    /// TOML config file
    #[arg(long, env = "RISKMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum combined similarity for a duplicate, in [0, 1]
    #[arg(long, env = "RISKMERGE_THRESHOLD")]
    threshold: Option<f64>,

    #[arg(long, env = "RISKMERGE_TITLE_WEIGHT")]
    title_weight: Option<f64>,

    #[arg(long, env = "RISKMERGE_DESCRIPTION_WEIGHT")]
    description_weight: Option<f64>,

    #[arg(long, env = "RISKMERGE_CATEGORY_WEIGHT")]
    category_weight: Option<f64>,

    /// Honour manual overrides listed in the config file
    #[arg(long)]
    overrides: bool,
}

impl ConfigArgs {
    fn resolve(&self) -> anyhow::Result<ConsolidationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                ConsolidationConfig::from_toml(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ConsolidationConfig::default(),
        };
        if let Some(t) = self.threshold {
            config.similarity_threshold = t;
        }
        if let Some(w) = self.title_weight {
            config.title_weight = w;
        }
        if let Some(w) = self.description_weight {
            config.description_weight = w;
        }
        if let Some(w) = self.category_weight {
            config.category_weight = w;
        }
        if self.overrides {
            config.enable_manual_overrides = true;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Consolidate {
            template,
            industry,
            general,
            format,
            config,
        } => cmd_consolidate(
            template.as_deref(),
            industry.as_deref(),
            general.as_deref(),
            format,
            &config,
        ),
        Commands::Score {
            candidate,
            incoming,
            format,
            config,
        } => cmd_score(&candidate, &incoming, format, &config),
        Commands::Config { config } => cmd_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ── Commands ──

fn cmd_consolidate(
    template: Option<&Path>,
    industry: Option<&Path>,
    general: Option<&Path>,
    format: OutputFormat,
    args: &ConfigArgs,
) -> anyhow::Result<()> {
    if template.is_none() && industry.is_none() && general.is_none() {
        bail!("at least one of --template, --industry or --general is required");
    }
    let config = args.resolve()?;
    let template = load_tier(template)?;
    let industry = load_tier(industry)?;
    let general = load_tier(general)?;

    let analyzer = ThreeTierAnalyzer::new(&config)?;
    let result = analyzer.analyze(template, industry, general);
    tracing::info!(
        risks = result.consolidated_result.risks.len(),
        "consolidated"
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Report => display::print_report(&result),
    }
    Ok(())
}

fn cmd_score(
    candidate: &Path,
    incoming: &Path,
    format: OutputFormat,
    args: &ConfigArgs,
) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let candidate = load_risk(candidate)?;
    let incoming = load_risk(incoming)?;

    let detections = detect(std::slice::from_ref(&incoming), std::slice::from_ref(&candidate), &config);
    let Some(detection) = detections.into_iter().next() else {
        bail!("no detection produced");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detection)?),
        OutputFormat::Report => {
            display::print_detection(&candidate, &detection, config.similarity_threshold)
        }
    }
    Ok(())
}

fn cmd_config(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    print!("{}", config.to_toml()?);
    Ok(())
}

// ── Input ──

/// Read a tier result. A missing path yields an empty tier.
fn load_tier(path: Option<&Path>) -> anyhow::Result<TierResult> {
    let Some(path) = path else {
        return Ok(TierResult::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading tier {}", path.display()))?;
    parse_tier(&text).with_context(|| format!("parsing tier {}", path.display()))
}

/// Accept either a full tier result object or a bare array of risks.
fn parse_tier(text: &str) -> anyhow::Result<TierResult> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(_) => Ok(TierResult {
            risks: serde_json::from_value(value)?,
            ..Default::default()
        }),
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        other => bail!("expected an object or array, found {}", kind(&other)),
    }
}

fn load_risk(path: &Path) -> anyhow::Result<Risk> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading risk {}", path.display()))?;
    let raw: RawRisk =
        serde_json::from_str(&text).with_context(|| format!("parsing risk {}", path.display()))?;
    Ok(Risk::from_raw(raw, 1))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
