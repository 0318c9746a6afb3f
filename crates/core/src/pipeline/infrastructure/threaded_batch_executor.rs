use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::decoding::image_decoder::decode_file;
use crate::pipeline::batch_executor::{BatchExecutor, FrameOutcome};
use crate::pipeline::batch_observer::{BatchObserver, FrameTimings};
use crate::pipeline::frame_analysis_pipeline::FrameAnalysisPipeline;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// One finished job as reported by a worker.
struct WorkerReport {
    index: usize,
    outcome: FrameOutcome,
    timings: FrameTimings,
}

/// Decodes and analyzes files on a fixed pool of worker threads.
///
/// Layout: `feeder → [worker × N] → main [observe/reorder]`
///
/// Workers share one pipeline (and so one detector). The main thread owns
/// the observer and places each report back at its input index.
pub struct ThreadedBatchExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(
        &self,
        pipeline: &FrameAnalysisPipeline,
        inputs: &[PathBuf],
        observer: &mut dyn BatchObserver,
    ) -> Result<Vec<FrameOutcome>, Box<dyn std::error::Error>> {
        let total = inputs.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let worker_count = self.workers.min(total);
        observer.batch_started(total, worker_count);

        let (job_tx, job_rx) =
            crossbeam_channel::bounded::<(usize, PathBuf)>(self.channel_capacity);
        let (report_tx, report_rx) =
            crossbeam_channel::bounded::<WorkerReport>(self.channel_capacity);

        let feeder_handle = spawn_feeder(inputs.to_vec(), job_tx);
        let worker_handles: Vec<_> = (0..worker_count)
            .map(|_| spawn_worker(pipeline.clone(), job_rx.clone(), report_tx.clone()))
            .collect();
        drop(job_rx);
        drop(report_tx);

        let mut slots: Vec<Option<FrameOutcome>> = (0..total).map(|_| None).collect();
        for report in report_rx {
            observer.frame_finished(&report.outcome, report.timings);
            slots[report.index] = Some(report.outcome);
        }

        join_threads(feeder_handle, worker_handles)?;
        observer.batch_finished();

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| -> Box<dyn std::error::Error> {
                    format!("No result for {}", inputs[i].display()).into()
                })
            })
            .collect()
    }
}

fn spawn_feeder(
    inputs: Vec<PathBuf>,
    job_tx: crossbeam_channel::Sender<(usize, PathBuf)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in inputs.into_iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
    })
}

fn spawn_worker(
    pipeline: FrameAnalysisPipeline,
    job_rx: crossbeam_channel::Receiver<(usize, PathBuf)>,
    report_tx: crossbeam_channel::Sender<WorkerReport>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (index, input) in job_rx {
            let t0 = Instant::now();
            let decoded = decode_file(&input);
            let decode_ms = t0.elapsed().as_secs_f64() * 1000.0;

            let t1 = Instant::now();
            let result = decoded.and_then(|frame| pipeline.analyze(&frame));
            let analyze_ms = t1.elapsed().as_secs_f64() * 1000.0;

            let report = WorkerReport {
                index,
                outcome: FrameOutcome { input, result },
                timings: FrameTimings {
                    decode_ms,
                    analyze_ms,
                },
            };
            if report_tx.send(report).is_err() {
                break;
            }
        }
    })
}

fn join_threads(
    feeder_handle: JoinHandle<()>,
    worker_handles: Vec<JoinHandle<()>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut first_error: Option<Box<dyn std::error::Error>> = None;

    if feeder_handle.join().is_err() {
        first_error = Some("Feeder thread panicked".into());
    }
    for handle in worker_handles {
        if handle.join().is_err() && first_error.is_none() {
            first_error = Some("Worker thread panicked".into());
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
