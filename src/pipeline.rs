//! Check pipeline module
//!
//! Runs the margin analyzer over a whole document, separating the business
//! logic from CLI handling.
//!
//! ## Processing Steps
//!
//! 1. Determine the page range (after `skip_first` / `skip_last`)
//! 2. Render each page (pdftoppm / ImageMagick / image directory)
//! 3. Analyze margins and whitespace
//! 4. Optionally write a debug overlay for pages with issues
//!
//! Pages are processed in parallel; results come back ordered by page.

use rayon::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::debug_image::save_debug_image;
use crate::margin::{analyze_page, MarginOptions, PageAnalysis};
use crate::render::{PageRenderer, RenderError};

/// Progress callback for pipeline steps
pub trait ProgressCallback: Send + Sync {
    /// Called when a new step starts
    fn on_step_start(&self, step: &str);
    /// Called to report progress within a step
    fn on_step_progress(&self, current: usize, total: usize);
    /// Called when a step completes
    fn on_step_complete(&self, step: &str, message: &str);
    /// Called for verbose debug output
    fn on_debug(&self, message: &str);
}

/// No-op progress implementation
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
    fn on_debug(&self, _message: &str) {}
}

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No pages to analyze: document has {total} pages, skipping first {skip_first} and last {skip_last}")]
    NoPagesToAnalyze {
        total: usize,
        skip_first: usize,
        skip_last: usize,
    },

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// A page that could not be analyzed
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PageFailure {
    /// 1-based page number
    pub page_num: usize,
    pub error: String,
}

/// Result of checking a document
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// Page analyses, ordered by page number
    pub analyses: Vec<PageAnalysis>,
    /// Pages that failed to render, ordered by page number
    pub failures: Vec<PageFailure>,
    /// Debug overlays written for pages with issues
    pub debug_images: Vec<PathBuf>,
    /// Pages in the document before skipping
    pub total_pages: usize,
    pub elapsed: Duration,
}

impl CheckOutcome {
    pub fn pages_analyzed(&self) -> usize {
        self.analyses.len()
    }
}

enum PageResult {
    Analyzed(PageAnalysis, Option<PathBuf>),
    Failed(PageFailure),
}

/// Margin check pipeline
pub struct CheckPipeline {
    options: MarginOptions,
    threads: Option<usize>,
    debug_dir: Option<PathBuf>,
}

impl CheckPipeline {
    pub fn new(options: MarginOptions) -> Self {
        Self {
            options,
            threads: None,
            debug_dir: None,
        }
    }

    /// Use a dedicated pool of `threads` workers (0 = rayon's global pool)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = (threads > 0).then_some(threads);
        self
    }

    /// Write overlays for pages with issues into `dir`
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn options(&self) -> &MarginOptions {
        &self.options
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug_dir.as_deref()
    }

    /// 0-based page indices to analyze after skipping
    pub fn page_range(&self, total_pages: usize) -> Result<Range<usize>, PipelineError> {
        let start = self.options.skip_first;
        let end = total_pages.saturating_sub(self.options.skip_last);

        if start >= end {
            return Err(PipelineError::NoPagesToAnalyze {
                total: total_pages,
                skip_first: self.options.skip_first,
                skip_last: self.options.skip_last,
            });
        }
        Ok(start..end)
    }

    /// Run the check with no progress reporting
    pub fn run(&self, renderer: &dyn PageRenderer) -> Result<CheckOutcome, PipelineError> {
        self.run_with_progress(renderer, &SilentProgress)
    }

    /// Run the check, reporting progress
    pub fn run_with_progress<P: ProgressCallback>(
        &self,
        renderer: &dyn PageRenderer,
        progress: &P,
    ) -> Result<CheckOutcome, PipelineError> {
        let start_time = Instant::now();
        let total_pages = renderer.page_count()?;
        let range = self.page_range(total_pages)?;
        let to_analyze = range.len();

        info!(
            renderer = renderer.name(),
            total_pages,
            first = range.start + 1,
            last = range.end,
            dpi = self.options.dpi,
            "starting margin check"
        );
        progress.on_step_start(&format!(
            "Analyzing {} pages ({}-{}) at {} DPI...",
            to_analyze,
            range.start + 1,
            range.end,
            self.options.dpi
        ));

        let results = match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
                pool.install(|| self.process_pages(renderer, range, progress))
            }
            None => self.process_pages(renderer, range, progress),
        };

        let mut analyses = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        let mut debug_images = Vec::new();
        for result in results {
            match result {
                PageResult::Analyzed(analysis, debug_image) => {
                    analyses.push(analysis);
                    debug_images.extend(debug_image);
                }
                PageResult::Failed(failure) => failures.push(failure),
            }
        }

        let elapsed = start_time.elapsed();
        let with_issues = analyses.iter().filter(|a| a.has_any_issues()).count();
        progress.on_step_complete(
            "Analysis",
            &format!("{} pages, {} with issues", analyses.len(), with_issues),
        );
        if !debug_images.is_empty() {
            progress.on_debug(&format!("{} debug images written", debug_images.len()));
        }
        info!(
            analyzed = analyses.len(),
            failed = failures.len(),
            with_issues,
            elapsed_ms = elapsed.as_millis() as u64,
            "margin check finished"
        );

        Ok(CheckOutcome {
            analyses,
            failures,
            debug_images,
            total_pages,
            elapsed,
        })
    }

    fn process_pages<P: ProgressCallback>(
        &self,
        renderer: &dyn PageRenderer,
        range: Range<usize>,
        progress: &P,
    ) -> Vec<PageResult> {
        let total = range.len();
        let completed = AtomicUsize::new(0);

        range
            .into_par_iter()
            .map(|page_index| {
                let result = self.process_page(renderer, page_index);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress.on_step_progress(done, total);
                result
            })
            .collect()
    }

    fn process_page(&self, renderer: &dyn PageRenderer, page_index: usize) -> PageResult {
        let page_num = page_index + 1;
        let started = Instant::now();

        let page = match renderer.render_page(page_index, self.options.dpi) {
            Ok(page) => page,
            Err(e) => {
                warn!(page = page_num, error = %e, "page render failed");
                return PageResult::Failed(PageFailure {
                    page_num,
                    error: e.to_string(),
                });
            }
        };

        let analysis = analyze_page(&page, page_num, &self.options);
        debug!(
            page = page_num,
            violations = analysis.violations.len(),
            gaps = analysis.whitespace_gaps.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "page analyzed"
        );

        let debug_image = match (&self.debug_dir, analysis.has_any_issues()) {
            (Some(dir), true) => match save_debug_image(&page, &analysis, &self.options, dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(page = page_num, error = %e, "debug image not written");
                    None
                }
            },
            _ => None,
        };

        PageResult::Analyzed(analysis, debug_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::RenderedPage;
    use crate::render;
    use image::{GrayImage, Luma};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// In-memory renderer: blank letter pages, with a margin blot on the
    /// listed pages and render failures on others
    struct FakeRenderer {
        pages: usize,
        blotted: Vec<usize>,
        broken: Vec<usize>,
    }

    impl PageRenderer for FakeRenderer {
        fn page_count(&self) -> render::Result<usize> {
            Ok(self.pages)
        }

        fn render_page(&self, page_index: usize, _dpi: u32) -> render::Result<RenderedPage> {
            if self.broken.contains(&page_index) {
                return Err(RenderError::RenderFailed {
                    page: page_index + 1,
                    reason: "corrupt stream".to_string(),
                });
            }
            let mut img = GrayImage::from_pixel(1275, 1650, Luma([255]));
            if self.blotted.contains(&page_index) {
                for y in 0..100 {
                    for x in 0..100 {
                        img.put_pixel(x, y + 700, Luma([0]));
                    }
                }
            }
            Ok(RenderedPage::new(img))
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
        max_progress: AtomicUsize,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_step_start(&self, step: &str) {
            self.events.lock().unwrap().push(format!("start:{}", step));
        }
        fn on_step_progress(&self, current: usize, _total: usize) {
            self.max_progress.fetch_max(current, Ordering::Relaxed);
        }
        fn on_step_complete(&self, step: &str, _message: &str) {
            self.events.lock().unwrap().push(format!("complete:{}", step));
        }
        fn on_debug(&self, _message: &str) {}
    }

    fn letter_options() -> MarginOptions {
        MarginOptions::builder()
            .page_size(8.5, 11.0)
            .margins(0.75, 0.75, 0.75, 0.75)
            .twoside(false)
            .build()
    }

    #[test]
    fn test_page_range() {
        let pipeline = CheckPipeline::new(letter_options());
        assert_eq!(pipeline.page_range(10).unwrap(), 0..10);

        let opts = MarginOptions::builder().skip_pages(2, 3).build();
        let pipeline = CheckPipeline::new(opts);
        assert_eq!(pipeline.page_range(10).unwrap(), 2..7);
    }

    #[test]
    fn test_page_range_empty() {
        let opts = MarginOptions::builder().skip_pages(3, 2).build();
        let pipeline = CheckPipeline::new(opts);

        assert!(matches!(
            pipeline.page_range(5),
            Err(PipelineError::NoPagesToAnalyze { total: 5, .. })
        ));
        assert!(pipeline.page_range(0).is_err());
    }

    #[test]
    fn test_run_orders_results() {
        let renderer = FakeRenderer {
            pages: 12,
            blotted: vec![1, 7],
            broken: vec![],
        };
        let pipeline = CheckPipeline::new(letter_options()).with_threads(4);

        let outcome = pipeline.run(&renderer).unwrap();
        assert_eq!(outcome.total_pages, 12);
        assert_eq!(outcome.pages_analyzed(), 12);
        assert!(outcome.failures.is_empty());

        let page_nums: Vec<usize> = outcome.analyses.iter().map(|a| a.page_num).collect();
        assert_eq!(page_nums, (1..=12).collect::<Vec<_>>());

        let flagged: Vec<usize> = outcome
            .analyses
            .iter()
            .filter(|a| a.has_violations())
            .map(|a| a.page_num)
            .collect();
        assert_eq!(flagged, vec![2, 8]);
    }

    #[test]
    fn test_run_collects_failures() {
        let renderer = FakeRenderer {
            pages: 5,
            blotted: vec![],
            broken: vec![2],
        };
        let pipeline = CheckPipeline::new(letter_options());

        let outcome = pipeline.run(&renderer).unwrap();
        assert_eq!(outcome.pages_analyzed(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].page_num, 3);
        assert!(outcome.failures[0].error.contains("corrupt stream"));
    }

    #[test]
    fn test_run_respects_skips() {
        let renderer = FakeRenderer {
            pages: 6,
            blotted: vec![0, 5],
            broken: vec![],
        };
        let opts = MarginOptions {
            skip_first: 1,
            skip_last: 1,
            ..letter_options()
        };

        let outcome = CheckPipeline::new(opts).run(&renderer).unwrap();
        let page_nums: Vec<usize> = outcome.analyses.iter().map(|a| a.page_num).collect();
        assert_eq!(page_nums, vec![2, 3, 4, 5]);
        assert!(outcome.analyses.iter().all(|a| !a.has_any_issues()));
    }

    #[test]
    fn test_run_reports_progress() {
        let renderer = FakeRenderer {
            pages: 3,
            blotted: vec![],
            broken: vec![],
        };
        let progress = RecordingProgress::default();

        CheckPipeline::new(letter_options())
            .run_with_progress(&renderer, &progress)
            .unwrap();

        let events = progress.events.lock().unwrap();
        assert!(events[0].starts_with("start:Analyzing 3 pages"));
        assert_eq!(events.last().unwrap(), "complete:Analysis");
        assert_eq!(progress.max_progress.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_run_writes_debug_images() {
        let dir = tempdir().unwrap();
        let renderer = FakeRenderer {
            pages: 4,
            blotted: vec![2],
            broken: vec![],
        };
        let pipeline = CheckPipeline::new(letter_options()).with_debug_dir(dir.path());

        let outcome = pipeline.run(&renderer).unwrap();
        assert_eq!(
            outcome.debug_images,
            vec![dir.path().join("page_0003_violations.png")]
        );
        assert!(outcome.debug_images[0].exists());
    }

    #[test]
    fn test_with_threads_zero_uses_global_pool() {
        let pipeline = CheckPipeline::new(letter_options()).with_threads(0);
        assert!(pipeline.threads.is_none());
        assert!(pipeline.debug_dir().is_none());
    }
}
