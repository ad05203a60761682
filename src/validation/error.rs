//! Error taxonomy and the non-fatal diagnostic channel

use crate::platform::PlatformError;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors produced while anchoring, fusing or meshing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoArError {
    /// A sensor or scene capability is missing; the feature stays inert
    #[error("{capability} is not available")]
    CapabilityUnavailable { capability: String },
    /// A sample was below the confidence required to use it
    #[error("low confidence sample: {reason} (value {value}, threshold {threshold})")]
    LowConfidenceSample { reason: String, value: f64, threshold: f64 },
    /// Input cannot be processed at all
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    /// The platform reports compass drift
    #[error("compass calibration requested")]
    CalibrationRequested,
    /// No zero anchor exists yet
    #[error("zero anchor not established")]
    AnchorNotReady,
    /// A sensor sample carried neither usable angles nor a heading
    #[error("malformed sample: {reason}")]
    MalformedSample { reason: String },
    /// Error pushed by a platform service
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Result type for geo-anchoring operations
pub type GeoArResult<T> = Result<T, GeoArError>;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Warning,
}

impl GeoArError {
    pub fn severity(&self) -> Severity {
        match self {
            GeoArError::CapabilityUnavailable { .. } => Severity::High,
            GeoArError::LowConfidenceSample { .. } => Severity::Low,
            GeoArError::InvalidInput { .. } => Severity::Medium,
            GeoArError::CalibrationRequested => Severity::Warning,
            GeoArError::AnchorNotReady => Severity::Low,
            GeoArError::MalformedSample { .. } => Severity::Low,
            GeoArError::Platform(e) if e.is_recoverable() => Severity::Medium,
            GeoArError::Platform(_) => Severity::High,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GeoArError::CapabilityUnavailable { .. } => "CapabilityUnavailable",
            GeoArError::LowConfidenceSample { .. } => "LowConfidenceSample",
            GeoArError::InvalidInput { .. } => "InvalidInput",
            GeoArError::CalibrationRequested => "CalibrationRequested",
            GeoArError::AnchorNotReady => "AnchorNotReady",
            GeoArError::MalformedSample { .. } => "MalformedSample",
            GeoArError::Platform(_) => "Platform",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GeoArError::InvalidInput { reason: reason.into() }
    }

    pub(crate) fn unavailable(capability: impl Into<String>) -> Self {
        GeoArError::CapabilityUnavailable { capability: capability.into() }
    }
}

/// One reported diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRecord {
    pub id: u64,
    pub timestamp_ms: u64,
    pub severity: Severity,
    pub error: GeoArError,
}

#[derive(Debug)]
struct DiagnosticLog {
    history: VecDeque<DiagnosticRecord>,
    counter: u64,
    max_history_size: usize,
    counts: HashMap<&'static str, u64>,
}

/// Non-fatal diagnostic channel.
///
/// Clones share one log; components and the callbacks they register each
/// hold a clone.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    log: Rc<RefCell<DiagnosticLog>>,
}

/// Counts of reported errors
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticSummary {
    pub total_reported: u64,
    pub retained: usize,
    pub by_type: HashMap<&'static str, u64>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(max_history_size: usize) -> Self {
        Self {
            log: Rc::new(RefCell::new(DiagnosticLog {
                history: VecDeque::new(),
                counter: 0,
                max_history_size: max_history_size.max(1),
                counts: HashMap::new(),
            })),
        }
    }

    /// Record an error and emit it as a tracing event; returns its id
    pub fn report(&self, error: GeoArError) -> u64 {
        let severity = error.severity();
        match severity {
            Severity::Critical | Severity::High => tracing::error!(kind = error.type_name(), "{}", error),
            Severity::Medium | Severity::Warning => tracing::warn!(kind = error.type_name(), "{}", error),
            Severity::Low => tracing::debug!(kind = error.type_name(), "{}", error),
        }

        let mut log = self.log.borrow_mut();
        log.counter += 1;
        let id = log.counter;
        *log.counts.entry(error.type_name()).or_insert(0) += 1;
        log.history.push_back(DiagnosticRecord {
            id,
            timestamp_ms: current_time_ms(),
            severity,
            error,
        });
        if log.history.len() > log.max_history_size {
            log.history.pop_front();
        }
        id
    }

    /// Report the error of a failed result and pass the success through
    pub fn check<T>(&self, result: GeoArResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    pub fn recent(&self, count: usize) -> Vec<DiagnosticRecord> {
        self.log.borrow().history.iter().rev().take(count).cloned().collect()
    }

    pub fn count_of(&self, type_name: &str) -> u64 {
        self.log.borrow().counts.get(type_name).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().counter == 0
    }

    pub fn summary(&self) -> DiagnosticSummary {
        let log = self.log.borrow();
        DiagnosticSummary {
            total_reported: log.counter,
            retained: log.history.len(),
            by_type: log.counts.clone(),
        }
    }

    /// Forget every record; ids restart from 1
    pub fn clear(&self) {
        let mut log = self.log.borrow_mut();
        log.history.clear();
        log.counts.clear();
        log.counter = 0;
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_shares_history_between_clones() {
        let diagnostics = Diagnostics::new();
        let handle = diagnostics.clone();

        handle.report(GeoArError::CalibrationRequested);
        let id = diagnostics.report(GeoArError::invalid("empty path"));

        assert_eq!(id, 2);
        assert_eq!(diagnostics.count_of("CalibrationRequested"), 1);
        assert_eq!(handle.count_of("InvalidInput"), 1);
        assert_eq!(diagnostics.recent(1)[0].error, GeoArError::invalid("empty path"));
    }

    #[test]
    fn test_clear_resets_counters() {
        let diagnostics = Diagnostics::new();
        diagnostics.report(GeoArError::CalibrationRequested);
        diagnostics.clear();

        assert!(diagnostics.is_empty());
        let summary = diagnostics.summary();
        assert_eq!(summary.total_reported, 0);
        assert_eq!(summary.retained, 0);
        assert!(summary.by_type.is_empty());
        assert_eq!(diagnostics.report(GeoArError::CalibrationRequested), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let diagnostics = Diagnostics::with_capacity(3);
        for _ in 0..5 {
            diagnostics.report(GeoArError::AnchorNotReady);
        }

        let summary = diagnostics.summary();
        assert_eq!(summary.total_reported, 5);
        assert_eq!(summary.retained, 3);
        assert_eq!(diagnostics.recent(10)[2].id, 3);
    }

    #[test]
    fn test_severity_mapping() {
        let low = GeoArError::LowConfidenceSample {
            reason: "accuracy".into(),
            value: 150.0,
            threshold: 100.0,
        };
        assert_eq!(low.severity(), Severity::Low);
        assert_eq!(GeoArError::unavailable("geolocation").severity(), Severity::High);

        let timeout: GeoArError = PlatformError::Timeout { timeout_ms: 27000 }.into();
        assert_eq!(timeout.severity(), Severity::Medium);
    }

    #[test]
    fn test_check_passes_values_and_reports_errors() {
        let diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.check(Ok::<_, GeoArError>(7)), Some(7));
        assert_eq!(diagnostics.check::<u8>(Err(GeoArError::AnchorNotReady)), None);
        assert_eq!(diagnostics.count_of("AnchorNotReady"), 1);
    }
}
