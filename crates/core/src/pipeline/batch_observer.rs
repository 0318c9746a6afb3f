use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::batch_executor::FrameOutcome;
use crate::shared::error::AnalysisError;

/// Wall-clock cost of one frame, measured by the executor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTimings {
    pub decode_ms: f64,
    pub analyze_ms: f64,
}

/// Receives batch events on the executor's coordinating thread, in
/// completion order (not input order).
pub trait BatchObserver: Send {
    fn batch_started(&mut self, _total: usize, _workers: usize) {}

    fn frame_finished(&mut self, outcome: &FrameOutcome, timings: FrameTimings);

    fn batch_finished(&mut self) {}
}

/// Discards every event.
pub struct NullBatchObserver;

impl BatchObserver for NullBatchObserver {
    fn frame_finished(&mut self, _outcome: &FrameOutcome, _timings: FrameTimings) {}
}

/// Running proctoring statistics for a batch: how many frames were
/// suspicious or showed faces, the spread of edge density, and where the
/// time went. Logs throttled progress and a closing summary.
pub struct BatchStatistics {
    progress_every: usize,
    started: Instant,
    total: usize,
    done: usize,
    analyzed: usize,
    invalid_frames: usize,
    detector_failures: usize,
    suspicious: usize,
    with_faces: usize,
    faces: usize,
    density_min: f64,
    density_max: f64,
    density_sum: f64,
    most_active: Option<PathBuf>,
    decode_ms: f64,
    analyze_ms: f64,
}

impl BatchStatistics {
    /// Progress is logged every `progress_every` finished frames.
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
            started: Instant::now(),
            total: 0,
            done: 0,
            analyzed: 0,
            invalid_frames: 0,
            detector_failures: 0,
            suspicious: 0,
            with_faces: 0,
            faces: 0,
            density_min: f64::INFINITY,
            density_max: f64::NEG_INFINITY,
            density_sum: 0.0,
            most_active: None,
            decode_ms: 0.0,
            analyze_ms: 0.0,
        }
    }

    pub fn analyzed(&self) -> usize {
        self.analyzed
    }

    pub fn failed(&self) -> usize {
        self.invalid_frames + self.detector_failures
    }

    pub fn detector_failures(&self) -> usize {
        self.detector_failures
    }

    pub fn suspicious(&self) -> usize {
        self.suspicious
    }

    pub fn frames_with_faces(&self) -> usize {
        self.with_faces
    }

    /// Mean plausible faces per analyzed frame.
    pub fn mean_faces(&self) -> Option<f64> {
        (self.analyzed > 0).then(|| self.faces as f64 / self.analyzed as f64)
    }

    /// `(min, mean, max)` edge density over analyzed frames.
    pub fn edge_density_range(&self) -> Option<(f64, f64, f64)> {
        (self.analyzed > 0).then(|| {
            (
                self.density_min,
                self.density_sum / self.analyzed as f64,
                self.density_max,
            )
        })
    }

    /// Input with the highest edge density.
    pub fn most_active(&self) -> Option<&Path> {
        self.most_active.as_deref()
    }

    /// One-line tally for the end of a run.
    pub fn summary_line(&self) -> String {
        format!(
            "{} frames analyzed, {} failed, {} suspicious, {} with faces",
            self.analyzed,
            self.failed(),
            self.suspicious,
            self.with_faces
        )
    }

    /// Multi-line batch report, or `None` before any frame finished.
    pub fn summary(&self) -> Option<String> {
        if self.done == 0 {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Batch of {} frames in {elapsed:.2}s ({:.1} frames/s)",
            self.done,
            self.done as f64 / elapsed.max(f64::EPSILON)
        )];
        lines.push(format!(
            "  analyzed {}, failed {} ({} invalid, {} detector)",
            self.analyzed,
            self.failed(),
            self.invalid_frames,
            self.detector_failures
        ));
        if let (Some((min, mean, max)), Some(faces)) =
            (self.edge_density_range(), self.mean_faces())
        {
            lines.push(format!(
                "  suspicious activity in {} of {} frames ({:.1}%)",
                self.suspicious,
                self.analyzed,
                100.0 * self.suspicious as f64 / self.analyzed as f64
            ));
            lines.push(format!(
                "  faces in {} frames, {faces:.2} per frame",
                self.with_faces
            ));
            let peak = self
                .most_active
                .as_ref()
                .map(|p| format!(" ({})", p.display()))
                .unwrap_or_default();
            lines.push(format!(
                "  edge density min {min:.3}, mean {mean:.3}, max {max:.3}{peak}"
            ));
            lines.push(format!(
                "  mean decode {:.1}ms, mean analysis {:.1}ms",
                self.decode_ms / self.done as f64,
                self.analyze_ms / self.analyzed as f64
            ));
        }
        Some(lines.join("\n"))
    }

    fn record_failure(&mut self, input: &Path, error: &AnalysisError) {
        match error {
            AnalysisError::InvalidFrame(_) => self.invalid_frames += 1,
            AnalysisError::DetectorUnavailable(_) => self.detector_failures += 1,
        }
        log::warn!("{}: {error}", input.display());
    }
}

impl Default for BatchStatistics {
    fn default() -> Self {
        Self::new(10)
    }
}

impl BatchObserver for BatchStatistics {
    fn batch_started(&mut self, total: usize, workers: usize) {
        self.started = Instant::now();
        self.total = total;
        log::info!("Analyzing {total} frames on {workers} worker threads");
    }

    fn frame_finished(&mut self, outcome: &FrameOutcome, timings: FrameTimings) {
        self.done += 1;
        self.decode_ms += timings.decode_ms;
        match &outcome.result {
            Ok(result) => {
                self.analyzed += 1;
                self.analyze_ms += timings.analyze_ms;
                self.faces += result.detected_count;
                if result.is_suspicious {
                    self.suspicious += 1;
                }
                if result.detected_count > 0 {
                    self.with_faces += 1;
                }
                self.density_min = self.density_min.min(result.edge_density);
                self.density_sum += result.edge_density;
                if result.edge_density > self.density_max {
                    self.density_max = result.edge_density;
                    self.most_active = Some(outcome.input.clone());
                }
            }
            Err(e) => self.record_failure(&outcome.input, e),
        }

        if self.done % self.progress_every == 0 || self.done == self.total {
            log::info!(
                "{}/{} frames, {} suspicious so far",
                self.done,
                self.total.max(self.done),
                self.suspicious
            );
        }
    }

    fn batch_finished(&mut self) {
        if let Some(summary) = self.summary() {
            for line in summary.lines() {
                log::info!("{line}");
            }
        }
    }
}
