//! Segmentation and detection pipeline
//!
//! One [`RecordSegmenter`] drives a list of [`CategoryPass`]es. Each pass owns
//! a shared [`Pattern`] and its own [`ReportWriter`], so a pipeline can carry a
//! single category (one independent pass per category) or every category at
//! once (single read of the input).
//!
//! A failure that belongs to one pass (report write error, matcher error)
//! retires only that pass. A failure reading the input ends every pass still
//! running. Reports already written are flushed and left in place.

use super::report::ReportWriter;
use super::segmenter::RecordSegmenter;
use super::summary::CategorySummary;
use super::trace::MatchObserver;
use crate::config::SegmenterConfig;
use crate::detector::Pattern;
use crate::domain::{PhiCategory, Record, Result, ScanError};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// One category's matcher and report
pub struct CategoryPass<W: Write> {
    pattern: Arc<Pattern>,
    writer: Option<ReportWriter<W>>,
    summary: CategorySummary,
}

impl CategoryPass<BufWriter<File>> {
    /// Pass writing to a freshly created report file
    pub fn create(pattern: Arc<Pattern>, output: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(pattern, ReportWriter::create(output)?))
    }
}

impl<W: Write> CategoryPass<W> {
    pub fn new(pattern: Arc<Pattern>, writer: ReportWriter<W>) -> Self {
        let summary = CategorySummary::new(pattern.category(), writer.path());
        Self {
            pattern,
            writer: Some(writer),
            summary,
        }
    }

    pub fn category(&self) -> PhiCategory {
        self.pattern.category()
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    fn process(
        &mut self,
        record: &Record,
        observer: &mut Option<Box<dyn MatchObserver>>,
    ) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        writer.begin_record(&record.id)?;

        let mut spans = self.pattern.detect(record);
        for span in spans.by_ref() {
            let span = span?;
            writer.write_span(&span)?;
            self.summary.spans += 1;

            if let Some(observer) = observer.as_mut() {
                if let Err(e) = observer.on_match(self.summary.category, &record.id, &span) {
                    tracing::warn!(error = %e, "Match observer failed");
                }
            }
        }

        self.summary.dropped_spans += spans.dropped();
        self.summary.records += 1;
        Ok(())
    }

    /// Retire the pass, keeping whatever was already written
    fn retire(&mut self, error: &ScanError) {
        tracing::error!(
            category = %self.summary.category,
            output = %self.summary.output.display(),
            error = %error,
            "Category pass failed"
        );
        self.summary.fail(error);

        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finish() {
                tracing::warn!(error = %e, "Failed to flush partial report");
            }
        }
    }

    fn finish(mut self) -> CategorySummary {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finish() {
                self.summary.fail(&e);
            }
        }
        self.summary
    }
}

/// A segmenter-driven run over one or more category passes
pub struct Pipeline<W: Write> {
    passes: Vec<CategoryPass<W>>,
    observer: Option<Box<dyn MatchObserver>>,
}

impl<W: Write> Pipeline<W> {
    pub fn new(passes: Vec<CategoryPass<W>>) -> Self {
        Self {
            passes,
            observer: None,
        }
    }

    /// Send every accepted span to `observer`
    pub fn with_observer(mut self, observer: Box<dyn MatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn categories(&self) -> Vec<PhiCategory> {
        self.passes.iter().map(CategoryPass::category).collect()
    }

    /// Open `input` and run every pass over it
    ///
    /// An input that cannot be opened fails every pass.
    pub fn run_file(self, input: &Path, config: &SegmenterConfig) -> Vec<CategorySummary> {
        match RecordSegmenter::open(input, config) {
            Ok(segmenter) => self.run(segmenter),
            Err(e) => self.abort(&e),
        }
    }

    /// Run every pass over the records of `segmenter`
    pub fn run<R: BufRead>(mut self, mut segmenter: RecordSegmenter<R>) -> Vec<CategorySummary> {
        tracing::info!(categories = ?self.categories(), "Starting pipeline");

        for record in segmenter.by_ref() {
            let record = match record {
                Ok(record) => record,
                Err(e) => return self.abort(&e),
            };

            for pass in self.passes.iter_mut().filter(|p| p.is_active()) {
                if let Err(e) = pass.process(&record, &mut self.observer) {
                    pass.retire(&e);
                }
            }

            if self.passes.iter().all(|p| !p.is_active()) {
                tracing::error!(record = %record.id, "Every category pass failed, stopping");
                break;
            }
        }

        let stats = segmenter.stats();
        tracing::info!(
            lines = stats.lines,
            records = stats.records,
            discarded_lines = stats.discarded_lines,
            abandoned_records = stats.abandoned_records,
            "Input segmented"
        );

        self.finish()
    }

    fn abort(mut self, error: &ScanError) -> Vec<CategorySummary> {
        for pass in self.passes.iter_mut().filter(|p| p.is_active()) {
            pass.retire(error);
        }
        self.finish()
    }

    fn finish(mut self) -> Vec<CategorySummary> {
        if let Some(observer) = self.observer.as_mut() {
            if let Err(e) = observer.flush() {
                tracing::warn!(error = %e, "Failed to flush match observer");
            }
        }
        self.passes.into_iter().map(CategoryPass::finish).collect()
    }
}
