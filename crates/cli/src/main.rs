mod report;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use proctorcam_core::detection::infrastructure::cascade_resolver;
use proctorcam_core::detection::infrastructure::haar_cascade_detector::HaarCascadeDetector;
use proctorcam_core::pipeline::batch_executor::{BatchExecutor, FrameOutcome};
use proctorcam_core::pipeline::frame_analysis_pipeline::FrameAnalysisPipeline;
use proctorcam_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use proctorcam_core::pipeline::batch_observer::BatchStatistics;
use proctorcam_core::shared::constants::IMAGE_EXTENSIONS;

use report::{FailureReport, FrameReport};

/// Per-frame proctoring analysis: edge activity and face candidates.
#[derive(Parser)]
#[command(name = "proctorcam")]
struct Cli {
    /// Image files or directories of images to analyze.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// OpenCV Haar cascade XML (defaults to $PROCTORCAM_CASCADE, then the data directory).
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// Pretty-print each JSON report.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let inputs = collect_inputs(&cli.inputs)?;
    if inputs.is_empty() {
        return Err("No image files found in the given inputs".into());
    }

    let pipeline = build_pipeline(cli.cascade.as_deref())?;
    let executor = match cli.workers {
        Some(n) => ThreadedBatchExecutor::new(n),
        None => ThreadedBatchExecutor::default(),
    };
    let mut stats = BatchStatistics::default();

    let outcomes = executor.execute(&pipeline, &inputs, &mut stats)?;
    write_reports(&outcomes, cli.pretty, &mut std::io::stdout().lock())?;
    eprintln!("{}", stats.summary_line());

    if let Some(fatal) = outcomes.iter().find_map(|o| match &o.result {
        Err(e) if e.is_detector_unavailable() => Some(e),
        _ => None,
    }) {
        return Err(fatal.to_string().into());
    }
    Ok(())
}

fn build_pipeline(
    cascade: Option<&Path>,
) -> Result<FrameAnalysisPipeline, Box<dyn std::error::Error>> {
    let path = cascade_resolver::resolve(cascade)?;
    let detector = HaarCascadeDetector::load(&path)?;
    Ok(FrameAnalysisPipeline::new(Arc::new(detector)))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    Ok(())
}

/// Files are taken as given; directories contribute their image files, sorted.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            found.sort();
            log::info!("{}: {} images", input.display(), found.len());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn write_reports(
    outcomes: &[FrameOutcome],
    pretty: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    for outcome in outcomes {
        let line = match &outcome.result {
            Ok(result) => to_json(&FrameReport::new(&outcome.input, result), pretty)?,
            Err(e) => to_json(&FailureReport::new(&outcome.input, e), pretty)?,
        };
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proctorcam_core::pipeline::frame_analysis_pipeline::AnalysisResult;
    use proctorcam_core::shared::error::AnalysisError;
    use tempfile::TempDir;

    fn ok_outcome(name: &str, suspicious: bool) -> FrameOutcome {
        FrameOutcome {
            input: PathBuf::from(name),
            result: Ok(AnalysisResult {
                edge_density: 0.1,
                is_suspicious: suspicious,
                confidence: 0.3,
                faces: vec![],
                detected_count: 0,
                timestamp: Utc::now(),
            }),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/frame.JPG")));
        assert!(is_image(Path::new("frame.png")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[test]
    fn test_collect_inputs_expands_directories_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "readme.md"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested.png")).unwrap();
        let single = tmp.path().join("readme.md");

        let files = collect_inputs(&[tmp.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(
            files,
            vec![tmp.path().join("a.jpg"), tmp.path().join("b.png"), single]
        );
    }

    #[test]
    fn test_write_reports_one_line_per_outcome() {
        let outcomes = vec![
            ok_outcome("a.jpg", true),
            FrameOutcome {
                input: PathBuf::from("b.jpg"),
                result: Err(AnalysisError::invalid_frame("empty pixel buffer")),
            },
            ok_outcome("c.jpg", false),
        ];
        let mut out = Vec::new();
        write_reports(&outcomes, false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"suspicious_activity\":true"));
        assert!(lines[1].contains("\"error\""));
        assert!(lines[2].contains("\"input\":\"c.jpg\""));
    }

    #[test]
    fn test_missing_cascade_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = build_pipeline(Some(tmp.path().join("missing.xml").as_path()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing.xml"));
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "proctorcam",
            "--cascade",
            "c.xml",
            "--workers",
            "2",
            "--pretty",
            "x.jpg",
            "y.jpg",
        ]);
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.cascade, Some(PathBuf::from("c.xml")));
        assert_eq!(cli.workers, Some(2));
        assert!(cli.pretty);
    }

    #[test]
    fn test_validate_rejects_missing_input_and_zero_workers() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("a.png");
        std::fs::write(&present, b"x").unwrap();

        let missing = Cli::parse_from(["proctorcam", "/nonexistent/frame.png"]);
        assert!(validate(&missing).is_err());

        let zero = Cli::parse_from(["proctorcam", "--workers", "0", present.to_str().unwrap()]);
        assert!(validate(&zero).is_err());
    }
}
