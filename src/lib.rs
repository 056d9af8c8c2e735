//! # Responsive Variants
//!
//! Turns one uploaded image into a keyed set of resized, optionally
//! converted, optionally watermarked variants ("breakpoints"), each described
//! with its measured dimensions and size.
//!
//! # Pipeline
//!
//! ```text
//! GenerationConfig ─┐
//!                   ▼
//! SourceImage ──▶ plan_breakpoints ──▶ [large, medium, …, large_x2]
//!                   │                        │  (bounded worker pool)
//!                   │ watermark (once)       ▼
//!                   └──────────────▶ decode → orient → resize → composite → encode
//!                                            │
//!                                            ▼
//!                                   work_dir/{key}_{hash} ──probe──▶ ResponsiveVariant
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel work: color codec, watermark synthesis, render, probe |
//! | [`responsive`] | Breakpoint planning and the concurrent fan-out/fan-in |
//! | [`service`] | The [`ImageManipulation`](service::ImageManipulation) capability the host calls |
//! | [`source`] | Re-openable source images and upload hashing |
//! | [`config`] | `responsive.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//!
//! # Design Decisions
//!
//! ## Explicit Configuration
//!
//! Settings are read once into a [`GenerationConfig`](responsive::GenerationConfig)
//! and threaded through every call. Nothing in the pipeline looks settings
//! up on its own, so tests drive it with plain struct literals.
//!
//! ## Re-openable Sources
//!
//! Every render job opens its own reader. A file-backed source is reopened
//! from its path; an in-memory source hands each job a cursor over the same
//! shared buffer. No stream is ever consumed by two jobs.
//!
//! ## All or Nothing
//!
//! A run either returns every configured variant or one error naming the
//! breakpoint that failed. Queued siblings are skipped after a failure and
//! a per-job timeout keeps a stalled encode from holding the batch.
//!
//! ## Self-contained Imaging
//!
//! Decoding and most encoding use the `image` crate (Lanczos3 resampling,
//! rav1e for AVIF). JPEG goes through `jpeg-encoder` for progressive scans,
//! WebP through a statically built libwebp, and watermark text through
//! `usvg`/`resvg`. No ImageMagick, no libvips: the binary has no runtime
//! dependencies beyond system fonts for the watermark.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod responsive;
pub mod service;
pub mod source;
