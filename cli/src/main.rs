//! pdf-outline CLI - heading outline inference for PDF directories

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_outline::render::{to_json, write_json};
use pdf_outline::{
    scan_pdfs, BatchRunner, Evaluator, ExtractOptions, HeadingLabel, JsonFormat, MatchPolicy,
    OutlineConfig, PageSelection, Pipeline, Scores, DEFAULT_MODEL_PATH,
};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(version)]
#[command(about = "Infer title and H1-H3 outlines from PDF layout", long_about = None)]
struct Cli {
    /// Input directory of PDF files
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory for JSON outlines
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Classifier artifact (falls back to font-size rules when absent)
    #[arg(
        long,
        global = true,
        env = "PDF_OUTLINE_MODEL",
        value_name = "FILE",
        default_value = DEFAULT_MODEL_PATH
    )]
    model: PathBuf,

    /// JSON file overriding pipeline thresholds
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer outlines for every PDF in a directory
    Run {
        /// Input directory of PDF files
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory for JSON outlines
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Process documents one at a time
        #[arg(long)]
        sequential: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Fail a document when any of its pages cannot be read
        #[arg(long)]
        strict: bool,
    },

    /// Infer the outline of a single PDF
    File {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Fail when any page cannot be read
        #[arg(long)]
        strict: bool,
    },

    /// Score produced outlines against references
    Eval {
        /// Produced JSON file or directory
        #[arg(value_name = "PRODUCED")]
        produced: PathBuf,

        /// Reference JSON file or directory
        #[arg(value_name = "REFERENCE")]
        reference: PathBuf,

        /// Match texts by similarity instead of exact equality
        #[arg(long, value_name = "THRESHOLD", num_args = 0..=1, default_missing_value = "0.7")]
        similar: Option<f64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump extracted lines with their features and labels
    Lines {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Show only heading candidates
        #[arg(long)]
        candidates: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let model_path = resolve_model(&cli.model);
    let model = Some(model_path.as_path());
    let config = cli.config.as_deref();

    let result = match cli.command {
        Some(Commands::Run {
            input,
            output,
            compact,
            sequential,
            pages,
            strict,
        }) => build_pipeline(model, config, pages.as_deref(), strict, !sequential).and_then(
            |pipeline| cmd_run(&pipeline, &input, &output, compact, sequential),
        ),
        Some(Commands::File {
            input,
            output,
            compact,
            pages,
            strict,
        }) => build_pipeline(model, config, pages.as_deref(), strict, true)
            .and_then(|pipeline| cmd_file(&pipeline, &input, output.as_deref(), compact)),
        Some(Commands::Eval {
            produced,
            reference,
            similar,
            json,
        }) => cmd_eval(&produced, &reference, similar, json),
        Some(Commands::Lines {
            input,
            pages,
            candidates,
        }) => build_pipeline(model, config, pages.as_deref(), false, true)
            .and_then(|pipeline| cmd_lines(&pipeline, &input, candidates)),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match (cli.input, cli.output) {
            (Some(input), Some(output)) => build_pipeline(model, config, None, false, true)
                .and_then(|pipeline| cmd_run(&pipeline, &input, &output, false, false)),
            _ => {
                println!("{}", "Usage: pdf-outline <INPUT> <OUTPUT>".yellow());
                println!("       pdf-outline --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// A relative artifact path that does not exist under the working directory
/// is looked up next to the executable.
fn resolve_model(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

fn build_pipeline(
    model: Option<&Path>,
    config: Option<&Path>,
    pages: Option<&str>,
    strict: bool,
    parallel: bool,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => OutlineConfig::from_file(path)?,
        None => OutlineConfig::default(),
    };

    let mut options = ExtractOptions::new().with_parallel(parallel);
    if strict {
        options = options.strict();
    }
    if let Some(range) = pages {
        options = options.with_pages(PageSelection::parse(range)?);
    }

    Ok(Pipeline::from_model_path(model, config).with_options(options))
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_run(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    compact: bool,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = scan_pdfs(input)?.len();
    println!(
        "{} {} PDF files with {}",
        "Processing".cyan().bold(),
        total,
        pipeline.model().name()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = BatchRunner::new(pipeline)
        .with_format(json_format(compact))
        .with_parallel(!sequential)
        .run_with_progress(input, output, |path| {
            pb.set_message(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            pb.inc(1);
        })?;
    pb.finish_with_message("Done!");

    println!();
    println!("{}: {}", "Processed".bold(), report.processed.to_string().green());
    println!("{}: {}", "Failed".bold(), report.failed.to_string().red());
    for (i, failure) in report.failures.iter().enumerate() {
        let branch = if i + 1 == report.failures.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), failure);
    }
    println!("{}: {}", "Output".bold(), output.display());

    Ok(())
}

fn cmd_file(
    pipeline: &Pipeline,
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = pipeline.process_file(input)?;
    let format = json_format(compact);

    match output {
        Some(path) => {
            write_json(&doc, path, format)?;
            eprintln!("{} {}", "Written to".green(), path.display());
        }
        None => println!("{}", to_json(&doc, format)?),
    }

    Ok(())
}

fn cmd_eval(
    produced: &Path,
    reference: &Path,
    similar: Option<f64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = similar.map(MatchPolicy::Similar).unwrap_or_default();
    let evaluator = Evaluator::new(policy);

    if !(produced.is_dir() && reference.is_dir()) {
        let result = evaluator.evaluate_files(produced, reference)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!(
                "TP {}  FP {}  FN {}",
                result.true_positives, result.false_positives, result.false_negatives
            );
            print_scores(&result.scores);
        }
        return Ok(());
    }

    let batch = evaluator.evaluate_dirs(produced, reference)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!("{}", "Evaluation".cyan().bold());
    println!("{}", "─".repeat(72).dimmed());
    for file in &batch.files {
        let r = &file.result;
        println!(
            "{:<28} TP {:>3} FP {:>3} FN {:>3}  P {:.3} R {:.3} F1 {:.3} H {}",
            file.name,
            r.true_positives,
            r.false_positives,
            r.false_negatives,
            r.precision(),
            r.recall(),
            r.f1(),
            format_ratio(r.hierarchy_accuracy())
        );
    }
    for name in &batch.missing {
        println!("{:<28} {}", name, "no produced outline".yellow());
    }
    for failure in &batch.failed {
        println!("{:<28} {}", failure.name, failure.error.red());
    }

    println!();
    println!("{} ({} files)", "Average".cyan().bold(), batch.files.len());
    println!("{}", "─".repeat(72).dimmed());
    match batch.average() {
        Some(scores) => print_scores(&scores),
        None => println!("{}", "No outlines to compare".yellow()),
    }

    Ok(())
}

fn print_scores(scores: &Scores) {
    println!("{}: {:.3}", "Precision".bold(), scores.precision);
    println!("{}: {:.3}", "Recall".bold(), scores.recall);
    println!("{}: {:.3}", "F1".bold(), scores.f1);
    println!(
        "{}: {}",
        "Hierarchy accuracy".bold(),
        format_ratio(scores.hierarchy_accuracy)
    );
}

fn format_ratio(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn cmd_lines(
    pipeline: &Pipeline,
    input: &Path,
    candidates: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = pipeline.extract_file(input)?;
    let analysis = pipeline.analyze(&doc);

    println!(
        "{}: {} pages, {} lines, {} boilerplate removed, model {}",
        input.display().to_string().bold(),
        doc.page_count(),
        doc.lines.len(),
        analysis.removed,
        pipeline.model().name()
    );
    println!(
        "{}",
        format!(
            "{:>4} {:>7} {:>6} {:>4} {:>6} {:>5} {:>5}  {}",
            "page", "y", "size", "bold", "rel", "label", "conf", "text"
        )
        .dimmed()
    );

    for c in &analysis.classified {
        if candidates && !c.candidate {
            continue;
        }
        let label = match c.label {
            HeadingLabel::None if c.candidate => "-".yellow(),
            HeadingLabel::None => "".normal(),
            level => level.as_str().green().bold(),
        };
        let confidence = c
            .prediction
            .map(|p| format!("{:.2}", p.confidence))
            .unwrap_or_default();
        println!(
            "{:>4} {:>7.1} {:>6.1} {:>4} {:>6.2} {:>5} {:>5}  {}",
            c.line.page,
            c.line.position.y,
            c.line.font_size,
            if c.line.is_bold { "B" } else { "" },
            c.features.relative_size,
            label,
            confidence,
            c.line.text
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdf-outline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heading outline inference for PDF documents");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "pdf-outline",
            "--model",
            "m.json",
            "run",
            "in",
            "out",
            "--compact",
            "--pages",
            "1-3",
        ])
        .unwrap();
        assert_eq!(cli.model, PathBuf::from("m.json"));
        assert!(matches!(
            cli.command,
            Some(Commands::Run { compact: true, ref pages, .. }) if pages.as_deref() == Some("1-3")
        ));
    }

    #[test]
    fn test_model_defaults_to_bundled_artifact() {
        if std::env::var_os("PDF_OUTLINE_MODEL").is_some() {
            return;
        }
        let cli = Cli::try_parse_from(["pdf-outline", "run", "in", "out"]).unwrap();
        assert_eq!(cli.model, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_default_model_loads_bundled_classifier() {
        let bundled = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join(DEFAULT_MODEL_PATH);
        let pipeline = build_pipeline(Some(bundled.as_path()), None, None, false, true).unwrap();
        assert_eq!(pipeline.model().name(), "heading-lr-v1");
    }

    #[test]
    fn test_missing_model_file_falls_back_to_rules() {
        let model = resolve_model(Path::new("no/such/heading_model.json"));
        assert_eq!(model, PathBuf::from("no/such/heading_model.json"));
        let pipeline = build_pipeline(Some(model.as_path()), None, None, false, true).unwrap();
        assert_eq!(pipeline.model().name(), "rules");
    }

    #[test]
    fn test_parse_eval_similar_default() {
        let cli = Cli::try_parse_from(["pdf-outline", "eval", "a", "b", "--similar"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Eval { similar: Some(t), .. }) if t == 0.7));
    }

    #[test]
    fn test_build_pipeline_rejects_bad_pages() {
        assert!(build_pipeline(None, None, Some("abc"), false, true).is_err());
    }

    #[test]
    fn test_file_command_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fake.pdf");
        fs::write(&input, b"not a pdf").unwrap();
        let pipeline = build_pipeline(None, None, None, false, true).unwrap();
        assert!(cmd_file(&pipeline, &input, None, true).is_err());
    }
}
