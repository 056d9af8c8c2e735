//! The image manipulation capability the host upload subsystem talks to.
//!
//! [`ImageManipulation`] is the seam: the host holds a `dyn` or generic
//! implementation and never reaches into backends, pools or settings
//! directly. [`ResponsiveImageService`] is the production implementation,
//! composing an [`ImageBackend`] with the breakpoint orchestrator.

use crate::imaging::{
    BackendError, Dimensions, ImageBackend, RustBackend, supported_input_extensions,
};
use crate::responsive::{
    GenerationConfig, GenerationError, ResponsiveVariant, build_worker_pool,
    generate_responsive_formats,
};
use crate::source::SourceImage;
use rayon::ThreadPool;
use std::path::Path;
use std::sync::Arc;

pub trait ImageManipulation {
    /// Pixel dimensions of the source.
    fn get_dimensions(&self, source: &SourceImage) -> Result<Dimensions, BackendError>;

    /// Whether the source looks like an image this service can decode.
    fn is_supported_image(&self, source: &SourceImage) -> bool;

    /// Every configured variant of `source`, written into `work_dir`.
    fn generate_responsive_formats(
        &self,
        source: &SourceImage,
        work_dir: &Path,
    ) -> Result<Vec<ResponsiveVariant>, GenerationError>;
}

/// Backend + worker pool + settings, built once and reused per upload.
pub struct ResponsiveImageService<B: ImageBackend + 'static = RustBackend> {
    backend: Arc<B>,
    pool: ThreadPool,
    config: GenerationConfig,
}

impl<B: ImageBackend + 'static> ResponsiveImageService<B> {
    pub fn new(backend: B, config: GenerationConfig) -> Result<Self, GenerationError> {
        let pool = build_worker_pool(config.max_workers)?;
        Ok(Self {
            backend: Arc::new(backend),
            pool,
            config,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ImageBackend + 'static> ImageManipulation for ResponsiveImageService<B> {
    fn get_dimensions(&self, source: &SourceImage) -> Result<Dimensions, BackendError> {
        self.backend.identify(source)
    }

    fn is_supported_image(&self, source: &SourceImage) -> bool {
        let ext = source.ext.trim_start_matches('.');
        supported_input_extensions()
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(ext))
    }

    fn generate_responsive_formats(
        &self,
        source: &SourceImage,
        work_dir: &Path,
    ) -> Result<Vec<ResponsiveVariant>, GenerationError> {
        generate_responsive_formats(&self.backend, &self.pool, source, work_dir, &self.config)
    }
}
