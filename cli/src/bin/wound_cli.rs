use clap::{Parser, Subcommand};
use cli::{ErrorEnvelope, build_inference, parse_point, write_masks};
use color_eyre::eyre::{Result, eyre};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

use wound_analysis::{
    AnalysisConfig, AnalysisRequest, HealthReport, WoundAnalyzer, WoundImage,
    decode_base64_image, load_file,
};
use wound_common::{LayeredResult, PatientMetadata, PixelPoint};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Always use the circular fallback mask
    #[arg(long, global = true)]
    demo: bool,

    /// Predictor script for model segmentation; fallback only when absent
    #[arg(long, global = true)]
    script: Option<PathBuf>,

    /// Run the predictor through `uv run` with this uv binary
    #[arg(long, global = true)]
    uv: Option<PathBuf>,

    /// Interpreter for the predictor script
    #[arg(long, global = true)]
    interpreter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze photographs of one wound, in capture order, into a session
    Analyze {
        /// Image files, one per observation
        #[arg(short, long, required_unless_present = "base64")]
        image: Vec<PathBuf>,
        /// Files holding base64 (or data URL) encoded images
        #[arg(long)]
        base64: Vec<PathBuf>,
        /// Prompt point as x,y (defaults to the image centre)
        #[arg(short, long, value_parser = parse_point)]
        point: Option<PixelPoint>,
        /// Session the observations belong to
        #[arg(short, long)]
        session: Option<String>,
        /// Patient metadata (.toml or .json)
        #[arg(short, long)]
        metadata: Option<PathBuf>,
        /// Skip the hypothetical simulation layer
        #[arg(long)]
        no_simulation: bool,
        /// Write wound and peri-wound masks to this directory
        #[arg(long)]
        mask_dir: Option<PathBuf>,
    },
    /// Print the JSON schema of the analysis result
    Schema {
        /// Print the configuration schema instead
        #[arg(long = "config-schema")]
        config_schema: bool,
    },
    /// Report model and pipeline status
    Health,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    config.demo_mode |= cli.demo;

    match cli.command {
        Commands::Analyze {
            image,
            base64,
            point,
            session,
            metadata,
            no_simulation,
            mask_dir,
        } => {
            let demo_mode = config.demo_mode;
            let analyzer = WoundAnalyzer::new(
                build_inference(cli.script, cli.uv, cli.interpreter),
                Arc::default(),
                config,
            );
            let job = AnalyzeJob {
                images: image,
                base64,
                point,
                session,
                metadata,
                enable_simulation: !no_simulation,
                mask_dir,
            };
            match job.run(&analyzer) {
                Ok(results) => print_json(&results)?,
                Err(e) => {
                    error!("Analysis failed: {e:?}");
                    let envelope = ErrorEnvelope::new(&e, demo_mode);
                    print_json(&envelope)?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Schema { config_schema: false } => print_json(&LayeredResult::schema())?,
        Commands::Schema { config_schema: true } => print_json(&AnalysisConfig::schema())?,
        Commands::Health => {
            let analyzer = WoundAnalyzer::new(
                build_inference(cli.script, cli.uv, cli.interpreter),
                Arc::default(),
                config,
            );
            let report: HealthReport = analyzer.health();
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct AnalyzeJob {
    images: Vec<PathBuf>,
    base64: Vec<PathBuf>,
    point: Option<PixelPoint>,
    session: Option<String>,
    metadata: Option<PathBuf>,
    enable_simulation: bool,
    mask_dir: Option<PathBuf>,
}

impl AnalyzeJob {
    fn run(self, analyzer: &WoundAnalyzer) -> Result<Vec<LayeredResult>> {
        let metadata: Option<PatientMetadata> = self.metadata.as_ref().map(load_file::<PatientMetadata, _>).transpose()?;

        let mut photos = Vec::with_capacity(self.images.len() + self.base64.len());
        for path in &self.images {
            photos.push(WoundImage::open(path)?);
        }
        for path in &self.base64 {
            photos.push(decode_base64_image(&std::fs::read_to_string(path)?)?);
        }
        if photos.is_empty() {
            return Err(eyre!("no images given"));
        }

        info!("Analyzing {} observation(s)", photos.len());
        let mut results = Vec::with_capacity(photos.len());
        for (index, photo) in photos.into_iter().enumerate() {
            let mut request = AnalysisRequest::new(photo).with_simulation(self.enable_simulation);
            request.point = self.point;
            request.session_id = self.session.clone();
            request.metadata = metadata.clone();

            let outcome = analyzer.analyze_with_masks(request)?;
            if let Some(dir) = &self.mask_dir {
                let (wound, peri) = write_masks(dir, &format!("day_{}", index + 1), &outcome.segmentation)?;
                info!("Masks saved to {:?} and {:?}", wound, peri);
            }
            results.push(outcome.result);
        }

        info!("✅ Analysis completed!");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_schema_parses_alongside_global_config() {
        let cli = Cli::try_parse_from(["wound-cli", "schema"]).expect("Should parse schema");
        assert!(matches!(cli.command, Commands::Schema { config_schema: false }));
        assert!(cli.config.is_none());

        let cli = Cli::try_parse_from(["wound-cli", "schema", "--config-schema"]).expect("Should parse flag");
        assert!(matches!(cli.command, Commands::Schema { config_schema: true }));

        let cli = Cli::try_parse_from(["wound-cli", "--config", "pipeline.toml", "schema"])
            .expect("Should parse global config");
        assert_eq!(cli.config, Some(PathBuf::from("pipeline.toml")));
        assert!(matches!(cli.command, Commands::Schema { config_schema: false }));
    }

    #[test]
    fn test_analyze_parses() {
        let cli = Cli::try_parse_from([
            "wound-cli", "analyze", "-i", "day1.png", "-i", "day2.png", "-p", "10,20", "-c", "p.json",
        ])
        .expect("Should parse analyze");
        assert_eq!(cli.config, Some(PathBuf::from("p.json")));
        match cli.command {
            Commands::Analyze { image, point, .. } => {
                assert_eq!(image.len(), 2);
                assert_eq!(point, Some(PixelPoint::new(10, 20)));
            }
            _ => panic!("expected analyze"),
        }
        assert!(Cli::try_parse_from(["wound-cli", "analyze"]).is_err());
    }
}
