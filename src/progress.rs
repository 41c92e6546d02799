use std::sync::Mutex;

use crate::error::ExportError;

/// Hierarchical progress reporting. A sink receives messages and progress
/// fractions; either call may signal cancellation by returning
/// `ExportError::Cancelled`. When a sink is present, per-region failures
/// are reported through it and the export continues with the remaining
/// regions.
pub trait ProgressSink: Send + Sync {
    fn set_message(&self, _message: &str) {}

    fn set_progress(&self, _fraction: f32) -> Result<(), ExportError> {
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), ExportError> {
        Ok(())
    }

    fn report_error(&self, _error: &ExportError) {}

    fn reset(&self) {}
}

/// Lightweight handle threading an optional sink plus a sub-range through
/// the passes. `sub` delegates a fraction of this handle's range, so each
/// pass reports 0..1 locally and the composition stays monotonic.
#[derive(Clone, Copy)]
pub struct Progress<'a> {
    sink: Option<&'a dyn ProgressSink>,
    start: f32,
    span: f32,
}

impl<'a> Progress<'a> {
    pub fn none() -> Progress<'static> {
        Progress {
            sink: None,
            start: 0.0,
            span: 1.0,
        }
    }

    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink: Some(sink),
            start: 0.0,
            span: 1.0,
        }
    }

    pub fn sub(&self, start: f32, span: f32) -> Progress<'a> {
        Progress {
            sink: self.sink,
            start: self.start + start * self.span,
            span: span * self.span,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.sink.is_some()
    }

    pub fn set_message(&self, message: &str) {
        if let Some(sink) = self.sink {
            sink.set_message(message);
        }
    }

    pub fn set(&self, fraction: f32) -> Result<(), ExportError> {
        match self.sink {
            Some(sink) => sink.set_progress(self.start + fraction.clamp(0.0, 1.0) * self.span),
            None => Ok(()),
        }
    }

    pub fn check_cancelled(&self) -> Result<(), ExportError> {
        match self.sink {
            Some(sink) => sink.check_cancelled(),
            None => Ok(()),
        }
    }

    pub fn report_error(&self, error: &ExportError) {
        if let Some(sink) = self.sink {
            sink.report_error(error);
        }
    }

    pub fn reset(&self) {
        if let Some(sink) = self.sink {
            sink.reset();
        }
    }
}

/// Fans one progress handle out to N parallel region tasks; the parent
/// fraction is the mean of the per-job fractions.
pub struct ParallelProgress<'a> {
    parent: Progress<'a>,
    fractions: Mutex<Vec<f32>>,
}

impl<'a> ParallelProgress<'a> {
    pub fn new(parent: Progress<'a>, jobs: usize) -> Self {
        Self {
            parent,
            fractions: Mutex::new(vec![0.0; jobs.max(1)]),
        }
    }

    pub fn job(&self, index: usize) -> JobProgress<'_> {
        JobProgress {
            parent: self,
            index,
        }
    }
}

pub struct JobProgress<'a> {
    parent: &'a ParallelProgress<'a>,
    index: usize,
}

impl ProgressSink for JobProgress<'_> {
    fn set_message(&self, message: &str) {
        self.parent.parent.set_message(message);
    }

    fn set_progress(&self, fraction: f32) -> Result<(), ExportError> {
        let aggregate = {
            let mut fractions = self.parent.fractions.lock().unwrap();
            fractions[self.index] = fraction;
            fractions.iter().sum::<f32>() / fractions.len() as f32
        };
        self.parent.parent.set(aggregate)
    }

    fn check_cancelled(&self) -> Result<(), ExportError> {
        self.parent.parent.check_cancelled()
    }

    fn report_error(&self, error: &ExportError) {
        self.parent.parent.report_error(error);
    }
}
