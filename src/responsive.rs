//! Breakpoint orchestration: one source in, a keyed set of variants out.
//!
//! A run expands the configured breakpoints into render jobs (adding a
//! double-resolution `_x2` job for every breakpoint that asks for one),
//! synthesizes the watermark layer once, fans the jobs out over a bounded
//! worker pool, and collects the results.
//!
//! ## Failure model
//!
//! All or nothing. The first failed job fails the run; jobs still queued
//! behind it are skipped, and jobs already running finish in the background
//! with their results discarded. A job that exceeds the configured timeout
//! fails the run the same way.
//!
//! ## Concurrency
//!
//! ```text
//! caller ──spawn──▶ rayon pool (max_workers threads)
//!    ▲                 │ Started(i)
//!    └──── mpsc ◀──────┤ Finished(i, result)
//! ```
//!
//! Each job opens its own reader over the source and writes its own file.
//! The only shared state is the read-only watermark layer and the cancel flag.

use crate::imaging::{
    BackendError, Geometry, ImageBackend, MAX_DIMENSION, OutputFormat, Quality, RenderOptions,
    VariantFile, WatermarkLayer, WatermarkSpec, resize_file_to,
};
use crate::source::SourceImage;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("watermark synthesis failed: {0}")]
    Watermark(#[source] BackendError),
    #[error("breakpoint {key} failed: {source}")]
    Job {
        key: String,
        #[source]
        source: BackendError,
    },
    #[error("breakpoint {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },
    #[error("breakpoint {key} exceeds {max} px per edge")]
    Oversized { key: String, max: u32 },
    #[error("worker for breakpoint {key} exited without a result")]
    WorkerLost { key: String },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

/// A named target geometry, as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Breakpoint {
    pub name: String,
    pub width: u32,
    /// Absent (or 0) keeps the source aspect ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Also produce a double-resolution variant keyed `{name}_x2`.
    #[serde(default)]
    pub x2: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert_to_format: Option<OutputFormat>,
}

impl Breakpoint {
    pub fn new(name: impl Into<String>, width: u32, height: Option<u32>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            x2: false,
            convert_to_format: None,
        }
    }

    pub fn with_x2(mut self) -> Self {
        self.x2 = true;
        self
    }

    pub fn converted_to(mut self, format: OutputFormat) -> Self {
        self.convert_to_format = Some(format);
        self
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }
}

/// The stock breakpoint set: three widths plus a fixed-box thumbnail.
pub fn default_breakpoints() -> Vec<Breakpoint> {
    vec![
        Breakpoint::new("large", 1000, None),
        Breakpoint::new("medium", 750, None),
        Breakpoint::new("small", 500, None),
        Breakpoint::new("thumbnail", 245, Some(156)),
    ]
}

/// Everything a generation run reads, built once by the caller.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Master switch. When off a run produces nothing.
    pub responsive_dimensions: bool,
    pub auto_orientation: bool,
    pub breakpoints: Vec<Breakpoint>,
    pub quality: Quality,
    pub progressive: bool,
    pub watermark: Option<WatermarkSpec>,
    /// Upper bound on concurrently rendering jobs.
    pub max_workers: usize,
    /// Per-job wall-clock limit, measured from when the job starts running.
    pub job_timeout: Option<Duration>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            responsive_dimensions: true,
            auto_orientation: false,
            breakpoints: default_breakpoints(),
            quality: Quality::default(),
            progressive: true,
            watermark: None,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            job_timeout: None,
        }
    }
}

impl GenerationConfig {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            quality: self.quality,
            progressive: self.progressive,
            auto_orientation: self.auto_orientation,
        }
    }
}

/// Build the watermark specification from raw settings.
///
/// A missing or blank text means no watermark at all; a missing color falls
/// back to [`DEFAULT_WATERMARK_COLOR`](crate::imaging::DEFAULT_WATERMARK_COLOR).
pub fn watermark_from_settings(
    text: Option<&str>,
    position: crate::imaging::Gravity,
    color: Option<&str>,
) -> Option<WatermarkSpec> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    Some(WatermarkSpec {
        text: text.to_string(),
        position,
        color: color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(crate::imaging::DEFAULT_WATERMARK_COLOR)
            .to_string(),
    })
}

/// One unit of rendering work.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointJob {
    pub key: String,
    pub geometry: Geometry,
    pub convert_to_format: Option<OutputFormat>,
}

/// Expand breakpoints into jobs: every base job in configured order, then an
/// `_x2` job for each breakpoint that asks for one.
///
/// Fails with [`GenerationError::Oversized`] when a doubled geometry would
/// exceed [`MAX_DIMENSION`].
pub fn plan_breakpoints(
    breakpoints: &[Breakpoint],
) -> Result<Vec<BreakpointJob>, GenerationError> {
    let base = breakpoints.iter().map(|bp| {
        Ok(BreakpointJob {
            key: bp.name.clone(),
            geometry: bp.geometry(),
            convert_to_format: bp.convert_to_format,
        })
    });
    let doubled = breakpoints.iter().filter(|bp| bp.x2).map(|bp| {
        let key = format!("{}_x2", bp.name);
        match bp.geometry().doubled() {
            Some(geometry) => Ok(BreakpointJob {
                key,
                geometry,
                convert_to_format: bp.convert_to_format,
            }),
            None => Err(GenerationError::Oversized {
                key,
                max: MAX_DIMENSION,
            }),
        }
    });
    base.chain(doubled).collect()
}

/// A generated variant, keyed by breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsiveVariant {
    pub key: String,
    pub file: VariantFile,
}

/// Build the bounded pool jobs run on.
///
/// A panicking job is logged and reported to the collector as a lost worker
/// instead of aborting the process.
pub fn build_worker_pool(threads: usize) -> Result<ThreadPool, GenerationError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("variant-worker-{i}"))
        .panic_handler(|_| tracing::error!("render worker panicked"))
        .build()?;
    Ok(pool)
}

enum JobEvent {
    Started(usize),
    /// Not run because an earlier job already failed.
    Skipped(usize),
    Finished(usize, Result<VariantFile, BackendError>),
}

/// Generate every configured variant of `source` into `work_dir`.
///
/// Returns variants in job order (see [`plan_breakpoints`]). Disabled
/// configurations return an empty collection without touching the backend.
pub fn generate_responsive_formats<B: ImageBackend + 'static>(
    backend: &Arc<B>,
    pool: &ThreadPool,
    source: &SourceImage,
    work_dir: &Path,
    config: &GenerationConfig,
) -> Result<Vec<ResponsiveVariant>, GenerationError> {
    if !config.responsive_dimensions {
        tracing::debug!(source = %source.name, "responsive dimensions disabled");
        return Ok(Vec::new());
    }

    let jobs = plan_breakpoints(&config.breakpoints)?;
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let watermark = match &config.watermark {
        Some(spec) => Some(Arc::new(
            backend
                .synthesize_watermark(spec)
                .map_err(GenerationError::Watermark)?,
        )),
        None => None,
    };

    tracing::info!(
        source = %source.name,
        jobs = jobs.len(),
        workers = pool.current_num_threads(),
        watermark = watermark.is_some(),
        "generating responsive variants"
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    let rx = dispatch(
        backend,
        pool,
        source,
        work_dir,
        &jobs,
        config.render_options(),
        watermark,
        &cancelled,
    );
    let files = collect(&jobs, rx, config.job_timeout, &cancelled)?;

    Ok(jobs
        .into_iter()
        .zip(files)
        .map(|(job, file)| ResponsiveVariant { key: job.key, file })
        .collect())
}

#[allow(clippy::too_many_arguments)]
fn dispatch<B: ImageBackend + 'static>(
    backend: &Arc<B>,
    pool: &ThreadPool,
    source: &SourceImage,
    work_dir: &Path,
    jobs: &[BreakpointJob],
    options: RenderOptions,
    watermark: Option<Arc<WatermarkLayer>>,
    cancelled: &Arc<AtomicBool>,
) -> Receiver<JobEvent> {
    let (tx, rx) = mpsc::channel();
    let source = Arc::new(source.clone());
    let work_dir: Arc<PathBuf> = Arc::new(work_dir.to_path_buf());

    for (index, job) in jobs.iter().cloned().enumerate() {
        let tx = tx.clone();
        let backend = Arc::clone(backend);
        let source = Arc::clone(&source);
        let work_dir = Arc::clone(&work_dir);
        let watermark = watermark.clone();
        let cancelled = Arc::clone(cancelled);

        pool.spawn(move || {
            if cancelled.load(Ordering::SeqCst) {
                let _ = tx.send(JobEvent::Skipped(index));
                return;
            }
            let _ = tx.send(JobEvent::Started(index));
            tracing::debug!(key = %job.key, width = job.geometry.width, "rendering");
            let result = resize_file_to(
                backend.as_ref(),
                &source,
                &job.key,
                job.geometry,
                job.convert_to_format,
                options,
                watermark,
                &work_dir,
            );
            let _ = tx.send(JobEvent::Finished(index, result));
        });
    }
    rx
}

/// Wait for every job, enforcing the timeout on jobs that have started.
fn collect(
    jobs: &[BreakpointJob],
    rx: Receiver<JobEvent>,
    timeout: Option<Duration>,
    cancelled: &AtomicBool,
) -> Result<Vec<VariantFile>, GenerationError> {
    let mut started: Vec<Option<Instant>> = vec![None; jobs.len()];
    let mut files: Vec<Option<VariantFile>> = vec![None; jobs.len()];
    let mut remaining = jobs.len();

    let fail = |error: GenerationError| -> Result<Vec<VariantFile>, GenerationError> {
        cancelled.store(true, Ordering::SeqCst);
        tracing::warn!(%error, "variant generation aborted");
        Err(error)
    };

    while remaining > 0 {
        let deadline = timeout.and_then(|limit| {
            started
                .iter()
                .zip(&files)
                .filter_map(|(start, file)| match (start, file) {
                    (Some(start), None) => Some(*start + limit),
                    _ => None,
                })
                .min()
        });

        let event = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match event {
            Ok(JobEvent::Started(index)) => started[index] = Some(Instant::now()),
            Ok(JobEvent::Skipped(index)) => {
                tracing::debug!(key = %jobs[index].key, "skipped after earlier failure");
                remaining -= 1;
            }
            Ok(JobEvent::Finished(index, Ok(file))) => {
                tracing::debug!(
                    key = %jobs[index].key,
                    width = file.width,
                    height = file.height,
                    size_kb = file.size,
                    "variant written"
                );
                files[index] = Some(file);
                remaining -= 1;
            }
            Ok(JobEvent::Finished(index, Err(source))) => {
                return fail(GenerationError::Job {
                    key: jobs[index].key.clone(),
                    source,
                });
            }
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let limit = timeout.unwrap_or_default();
                let expired = started
                    .iter()
                    .zip(&files)
                    .position(|(start, file)| {
                        file.is_none() && start.is_some_and(|s| now.duration_since(s) >= limit)
                    });
                if let Some(index) = expired {
                    return fail(GenerationError::Timeout {
                        key: jobs[index].key.clone(),
                        timeout: limit,
                    });
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                let index = files.iter().position(Option::is_none).unwrap_or(0);
                return fail(GenerationError::WorkerLost {
                    key: jobs[index].key.clone(),
                });
            }
        }
    }

    files
        .into_iter()
        .zip(jobs)
        .map(|(file, job)| {
            file.ok_or_else(|| GenerationError::WorkerLost {
                key: job.key.clone(),
            })
        })
        .collect()
}
