mod chunk;
mod config;
mod decode;
mod extract;
mod model;
mod pipeline;
mod report;
mod segment;
mod text;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::config::AppConfig;
use crate::extract::backend::BackendExtractor;
use crate::extract::pattern::PatternExtractor;
use crate::extract::Extractor;
use crate::model::{ReportSubType, StyleConfig};
use crate::pipeline::{Pipeline, RunReport};
use crate::report::{report_filename, ReportType};

#[derive(Parser)]
#[command(name = "suminfo", about = "SUMINFO occurrence extractor and report generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract occurrences from a SUMINFO PDF and render the report
    Extract {
        /// Source PDF
        input: PathBuf,
        #[command(flatten)]
        opts: ExtractOpts,
    },
    /// Extract from a plain-text file (pasted SUMINFO content)
    Text {
        /// Source text file
        input: PathBuf,
        #[command(flatten)]
        opts: ExtractOpts,
    },
}

#[derive(clap::Args)]
struct ExtractOpts {
    /// Which records to include in the report
    #[arg(long, value_enum, default_value_t = ReportTypeArg::Crimes)]
    report_type: ReportTypeArg,
    /// Level of detail per record
    #[arg(long, value_enum, default_value_t = SubTypeArg::Complete)]
    sub_type: SubTypeArg,
    /// Use the offline pattern extractor instead of the backend service
    #[arg(long)]
    offline: bool,
    /// Output file (default: "Relatório <input>.pdf" beside the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Separator line color (hex)
    #[arg(long, default_value = "#000000")]
    separator_color: String,
    /// Person data color (hex)
    #[arg(long, default_value = "#FF0000")]
    data_color: String,
    /// Fact color (hex)
    #[arg(long, default_value = "#0000FF")]
    fact_color: String,
    /// Render person data in the regular face
    #[arg(long)]
    no_data_bold: bool,
    /// Render the fact in the regular face
    #[arg(long)]
    no_fact_bold: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportTypeArg {
    Crimes,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum SubTypeArg {
    Complete,
    PersonalData,
}

impl ExtractOpts {
    fn style(&self) -> StyleConfig {
        StyleConfig {
            separator_color: self.separator_color.clone(),
            data_color: self.data_color.clone(),
            fact_color: self.fact_color.clone(),
            data_bold: !self.no_data_bold,
            fact_bold: !self.no_fact_bold,
            report_sub_type: match self.sub_type {
                SubTypeArg::Complete => ReportSubType::Complete,
                SubTypeArg::PersonalData => ReportSubType::PersonalDataOnly,
            },
        }
    }

    fn report_type(&self) -> ReportType {
        match self.report_type {
            ReportTypeArg::Crimes => ReportType::Crimes,
            ReportTypeArg::All => ReportType::All,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let app = AppConfig::load()?;

    match cli.command {
        Commands::Extract { input, opts } => {
            let pages = decode::extract_pages(&input)?;
            println!("Decoded {} pages from {}", pages.len(), input.display());
            let outcome = run(&app, &opts, Input::Pages(pages)).await?;
            finish(&opts, outcome, Some(&input))?;
        }
        Commands::Text { input, opts } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let outcome = run(&app, &opts, Input::Manual(text)).await?;
            finish(&opts, outcome, None)?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

enum Input {
    Pages(Vec<String>),
    Manual(String),
}

async fn run(app: &AppConfig, opts: &ExtractOpts, input: Input) -> anyhow::Result<RunReport> {
    if opts.offline {
        drive(PatternExtractor::new(), app, input).await
    } else {
        drive(BackendExtractor::new(app.backend.clone())?, app, input).await
    }
}

async fn drive<E: Extractor>(
    extractor: E,
    app: &AppConfig,
    input: Input,
) -> anyhow::Result<RunReport> {
    let pipeline = Pipeline::new(extractor, app.pipeline.sub_batch_size);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    let on_progress = |p: pipeline::Progress| {
        pb.set_position(p.percent as u64);
        pb.set_message(match p.stage {
            pipeline::Stage::Segmenting => "mapping pages",
            pipeline::Stage::Extracting => "extracting",
        });
    };

    let report = match input {
        Input::Pages(pages) => pipeline.run(pages, on_progress).await?,
        Input::Manual(text) => pipeline.run_manual(&text, on_progress).await?,
    };
    pb.finish_and_clear();
    Ok(report)
}

fn finish(opts: &ExtractOpts, outcome: RunReport, input: Option<&Path>) -> anyhow::Result<()> {
    if outcome.failed_sub_batches > 0 {
        warn!(
            failed = outcome.failed_sub_batches,
            "some sub-batches failed and were skipped"
        );
        if outcome.model_side_failure {
            warn!("backend returned malformed or rejected responses; a smaller sub_batch_size may help");
        }
    }
    if outcome.records.is_empty() {
        anyhow::bail!("no valid occurrences were extracted from the input");
    }

    let bytes = report::generate(&outcome.records, opts.report_type(), &opts.style())?;

    let output = opts.output.clone().unwrap_or_else(|| {
        let name = report_filename(input);
        match input.and_then(Path::parent) {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    });
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Extracted {} occurrences ({} sub-batches failed). Report: {}",
        outcome.records.len(),
        outcome.failed_sub_batches,
        output.display()
    );
    Ok(())
}
