//! Govlens analyzer binary.
//!
//! `serve` runs the HTTP analysis service; `analyze` runs the pipeline once
//! against a single proposal URL and writes the JSON artifact.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use govlens_analyzer::analysis::write_artifact;
use govlens_analyzer::{AnalyzerService, Category, ProposalAnalysis};
use govlens_common::{init_logging, Config};

#[derive(Parser)]
#[command(
    name = "govlens-analyzer",
    version,
    about = "Governance proposal analysis service"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP analysis service
    Serve {
        /// Bind host, overriding the config file
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overriding the config file
        #[arg(long)]
        port: Option<u16>,
    },
    /// Analyze one proposal URL and write the JSON artifact
    Analyze {
        /// Discourse topic URL
        url: String,
        /// Also run comment sentiment analysis
        #[arg(long)]
        sentiment: bool,
        /// Artifact directory; defaults to the configured output dir, then
        /// the working directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_with_env().context("Failed to load configuration")?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting govlens analyzer"
    );

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            AnalyzerService::new(config).start().await
        }
        Commands::Analyze {
            url,
            sentiment,
            output_dir,
        } => analyze_once(config, &url, sentiment, output_dir).await,
    }
}

async fn analyze_once(
    config: Config,
    url: &str,
    sentiment: bool,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let dir = output_dir
        .or_else(|| config.output.dir.clone().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let pipeline = AnalyzerService::new(config).build_pipeline()?;
    let analysis = pipeline.analyze_url(url, sentiment).await?;

    print_report(&analysis);

    let path = write_artifact(&analysis, &dir)?;
    println!("\nFull analysis written to {}", path.display());

    Ok(())
}

fn print_report(analysis: &ProposalAnalysis) {
    println!("\n=== Proposal Analysis ===");
    println!("Title:            {}", analysis.title);
    println!(
        "Primary category: {}",
        analysis.classification.primary_category
    );

    println!("\nCategory weights:");
    for category in Category::ALL {
        println!(
            "  {:<26} {:.2}",
            category.as_str(),
            analysis.classification.weights.get(category)
        );
    }
    println!("  {:<26} {:.2}", "total", analysis.classification.sum);
    println!("\nSummary:\n{}", analysis.classification.summary);

    if let Some(evaluation) = &analysis.evaluation {
        println!("\n=== Deep Evaluation ({}) ===", evaluation.category);
        println!("Score: {:.2}", evaluation.score);
        if !evaluation.reasoning.is_empty() {
            println!("{}", evaluation.reasoning);
        }
        for gap in &evaluation.information_gaps {
            println!("  gap: {}", gap);
        }
    }

    if let Some(sentiment) = &analysis.sentiment_analysis {
        println!("\n=== Community Sentiment ===");
        println!(
            "Score ({} comments): {:.2}",
            sentiment.num_comments, sentiment.sentiment_score
        );
        println!("{}", sentiment.summary);
    }
}
