//! Background worker running render jobs one after another.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::config::RenderConfig;
use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::pipeline::{ProgressFn, RenderJob, RenderReport, render_job_to_mp4};
use crate::text::font::FontCatalog;

/// Events reported by a worker, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    /// Job `job` (0-based) of `total` started.
    JobStarted {
        /// Job index.
        job: usize,
        /// Number of queued jobs.
        total: usize,
    },
    /// Progress of the running job.
    Progress {
        /// Job index.
        job: usize,
        /// Number of queued jobs.
        total: usize,
        /// Percent of the current job, 0..=100.
        percent: u8,
        /// Human-readable stage.
        message: String,
    },
    /// The job failed; the worker moves on to the next one.
    JobFailed {
        /// Job index.
        job: usize,
        /// Error message.
        error: String,
    },
    /// The job finished.
    JobFinished {
        /// Job index.
        job: usize,
        /// Frames rendered.
        frames: u64,
    },
    /// Every job ran.
    Finished {
        /// Jobs that succeeded.
        succeeded: usize,
        /// Jobs that failed.
        failed: usize,
    },
    /// The worker stopped early after a cancel request.
    Cancelled {
        /// Jobs that did not start.
        skipped: usize,
    },
}

/// Handle to a running worker thread.
#[derive(Debug)]
pub struct WorkerHandle {
    events: Receiver<WorkerEvent>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Event stream; disconnects once the worker exits.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Ask the worker to stop before the next job. The running job completes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Return `true` once a cancel was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) -> std::thread::Result<()> {
        match self.thread.take() {
            Some(t) => t.join(),
            None => Ok(()),
        }
    }
}

/// Jobs split by whether their input files exist.
#[derive(Debug, Default)]
pub struct CheckedJobs {
    /// Jobs whose inputs are all present, in their original order.
    pub runnable: Vec<RenderJob>,
    /// Jobs left out of the queue, with the [`LyricReelError::InputMissing`] that rejected them.
    pub rejected: Vec<(RenderJob, LyricReelError)>,
}

/// Check every job's inputs up front so jobs with missing files are never queued.
pub fn check_jobs(jobs: Vec<RenderJob>) -> CheckedJobs {
    let mut checked = CheckedJobs::default();
    for job in jobs {
        match job.validate_inputs() {
            Ok(()) => checked.runnable.push(job),
            Err(e) => {
                tracing::warn!(error = %e, "job not queued");
                checked.rejected.push((job, e));
            }
        }
    }
    checked
}

/// Render `jobs` to MP4 on a background thread.
///
/// Run the list through [`check_jobs`] first; jobs with missing inputs would otherwise only fail
/// once the worker reaches them.
pub fn spawn_worker(jobs: Vec<RenderJob>, cfg: RenderConfig, catalog: FontCatalog) -> WorkerHandle {
    spawn_worker_with(jobs, move |job, progress| {
        render_job_to_mp4(job, &cfg, &catalog, Some(progress))
    })
}

/// Run `jobs` through `run` on a background thread.
pub fn spawn_worker_with<F>(jobs: Vec<RenderJob>, run: F) -> WorkerHandle
where
    F: FnMut(&RenderJob, ProgressFn<'_>) -> LyricReelResult<RenderReport> + Send + 'static,
{
    let (tx, rx) = unbounded();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let thread = std::thread::spawn(move || run_jobs(&jobs, run, &tx, &flag));
    WorkerHandle {
        events: rx,
        cancel,
        thread: Some(thread),
    }
}

fn run_jobs<F>(jobs: &[RenderJob], mut run: F, tx: &Sender<WorkerEvent>, cancel: &AtomicBool)
where
    F: FnMut(&RenderJob, ProgressFn<'_>) -> LyricReelResult<RenderReport>,
{
    let total = jobs.len();
    let (mut succeeded, mut failed) = (0usize, 0usize);

    for (job_idx, job) in jobs.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!(skipped = total - job_idx, "worker cancelled");
            let _ = tx.send(WorkerEvent::Cancelled {
                skipped: total - job_idx,
            });
            return;
        }

        // Send errors mean nobody listens any more; the jobs still run to completion.
        let _ = tx.send(WorkerEvent::JobStarted {
            job: job_idx,
            total,
        });
        let mut on_progress = |percent: u8, message: &str| {
            let _ = tx.send(WorkerEvent::Progress {
                job: job_idx,
                total,
                percent,
                message: message.to_string(),
            });
        };

        let progress: ProgressFn<'_> = &mut on_progress;
        let outcome = catch_unwind(AssertUnwindSafe(|| run(job, progress))).unwrap_or_else(
            |payload| Err(LyricReelError::render(panic_message(&*payload))),
        );
        match outcome {
            Ok(report) => {
                succeeded += 1;
                let _ = tx.send(WorkerEvent::JobFinished {
                    job: job_idx,
                    frames: report.frames,
                });
            }
            Err(e) => {
                failed += 1;
                tracing::error!(job = job_idx, error = %e, "render job failed");
                let _ = tx.send(WorkerEvent::JobFailed {
                    job: job_idx,
                    error: e.to_string(),
                });
            }
        }
    }

    let _ = tx.send(WorkerEvent::Finished { succeeded, failed });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("render job panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("render job panicked: {s}")
    } else {
        "render job panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::text::script::Script;

    fn job(name: &str) -> RenderJob {
        RenderJob {
            audio_path: PathBuf::from(format!("{name}.mp3")),
            lyrics_path: PathBuf::from(format!("{name}.lrc")),
            cover_path: PathBuf::from(format!("{name}.jpg")),
            output_path: PathBuf::from(format!("{name}.mp4")),
        }
    }

    fn ok_report() -> RenderReport {
        RenderReport {
            frames: 24,
            duration_secs: 1.0,
            script: Script::Latin,
            entries: 1,
        }
    }

    #[test]
    fn failures_are_reported_and_the_queue_continues() {
        let jobs = vec![job("a"), job("bad"), job("c")];
        let handle = spawn_worker_with(jobs, |job, progress| {
            progress(0, "preparing");
            if job.audio_path == PathBuf::from("bad.mp3") {
                return Err(LyricReelError::input_missing("bad.mp3"));
            }
            progress(100, "done");
            Ok(ok_report())
        });
        let events: Vec<WorkerEvent> = handle.events().iter().collect();
        handle.join().unwrap();

        assert_eq!(
            events.last(),
            Some(&WorkerEvent::Finished {
                succeeded: 2,
                failed: 1
            })
        );
        let failed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::JobFailed { job, error } => Some((*job, error.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, 1);
        assert!(failed[0].1.contains("missing input"));

        let started: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::JobStarted { job, .. } => Some(*job),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![0, 1, 2]);
        assert!(events.contains(&WorkerEvent::Progress {
            job: 2,
            total: 3,
            percent: 100,
            message: "done".to_string()
        }));
    }

    #[test]
    fn a_panicking_job_is_reported_and_the_queue_continues() {
        let jobs = vec![job("boom"), job("b")];
        let handle = spawn_worker_with(jobs, |job, _| {
            if job.audio_path == PathBuf::from("boom.mp3") {
                panic!("malformed lyrics");
            }
            Ok(ok_report())
        });
        let events: Vec<WorkerEvent> = handle.events().iter().collect();
        handle.join().unwrap();

        assert_eq!(
            events,
            vec![
                WorkerEvent::JobStarted { job: 0, total: 2 },
                WorkerEvent::JobFailed {
                    job: 0,
                    error: "render failure: render job panicked: malformed lyrics".to_string()
                },
                WorkerEvent::JobStarted { job: 1, total: 2 },
                WorkerEvent::JobFinished { job: 1, frames: 24 },
                WorkerEvent::Finished {
                    succeeded: 1,
                    failed: 1
                },
            ]
        );
    }

    #[test]
    fn jobs_with_missing_inputs_are_not_queued() {
        let dir = PathBuf::from("target").join("worker_check_jobs");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["song.mp3", "song.lrc", "cover.jpg"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let present = RenderJob {
            audio_path: dir.join("song.mp3"),
            lyrics_path: dir.join("song.lrc"),
            cover_path: dir.join("cover.jpg"),
            output_path: dir.join("out.mp4"),
        };
        let missing = RenderJob {
            lyrics_path: dir.join("missing.lrc"),
            ..present.clone()
        };

        let checked = check_jobs(vec![missing.clone(), present.clone()]);
        assert_eq!(checked.runnable, vec![present]);
        assert_eq!(checked.rejected.len(), 1);
        assert_eq!(checked.rejected[0].0, missing);
        assert!(matches!(
            checked.rejected[0].1,
            LyricReelError::InputMissing(_)
        ));
    }

    #[test]
    fn cancel_stops_before_the_next_job() {
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        let jobs = vec![job("a"), job("b"), job("c")];
        let handle = spawn_worker_with(jobs, move |_, _| {
            // Block until the test has requested cancellation.
            let _ = gate_rx.recv();
            Ok(ok_report())
        });

        assert_eq!(
            handle.events().recv().unwrap(),
            WorkerEvent::JobStarted { job: 0, total: 3 }
        );
        handle.cancel();
        assert!(handle.is_cancelled());
        gate_tx.send(()).unwrap();
        drop(gate_tx);

        let rest: Vec<WorkerEvent> = handle.events().iter().collect();
        handle.join().unwrap();
        assert_eq!(
            rest,
            vec![
                WorkerEvent::JobFinished { job: 0, frames: 24 },
                WorkerEvent::Cancelled { skipped: 2 },
            ]
        );
    }
}
