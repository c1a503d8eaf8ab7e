#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared test helpers: a backend that records every metric call

use modkit_http_perf::{BackendError, BackendOp, HttpMethod, HttpMetric, PerfBackend};
use std::sync::{Arc, Mutex};

/// Everything the backend saw for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub url: String,
    pub method: HttpMethod,
    pub started: bool,
    pub request_payload_size: Option<u64>,
    pub response_payload_size: Option<u64>,
    pub response_content_type: Option<String>,
    pub http_response_code: Option<u16>,
    pub stop_count: usize,
}

impl MetricRecord {
    pub fn has_response_attributes(&self) -> bool {
        self.response_payload_size.is_some()
            || self.response_content_type.is_some()
            || self.http_response_code.is_some()
    }
}

#[derive(Default)]
struct State {
    metrics: Vec<MetricRecord>,
    fail_on: Option<BackendOp>,
}

/// In-memory backend with optional failure and panic injection
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<State>>,
    panic_on: Option<BackendOp>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `op` always fails
    pub fn failing_on(op: BackendOp) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().fail_on = Some(op);
        backend
    }

    /// Backend whose `op` always panics
    ///
    /// The panic is raised before the state lock is taken, so the recorded
    /// metrics stay readable afterwards.
    pub fn panicking_on(op: BackendOp) -> Self {
        Self {
            panic_on: Some(op),
            ..Self::default()
        }
    }

    pub fn metrics(&self) -> Vec<MetricRecord> {
        self.state.lock().unwrap().metrics.clone()
    }

    pub fn stopped(&self) -> Vec<MetricRecord> {
        self.metrics()
            .into_iter()
            .filter(|m| m.stop_count > 0)
            .collect()
    }

    pub fn by_url(&self, url: &str) -> MetricRecord {
        self.metrics()
            .into_iter()
            .find(|m| m.url == url)
            .unwrap_or_else(|| panic!("no metric recorded for {url}"))
    }

    fn maybe_panic(&self, op: BackendOp) {
        assert!(self.panic_on != Some(op), "injected {op} panic");
    }

    fn check(state: &State, op: BackendOp) -> Result<(), BackendError> {
        if state.fail_on == Some(op) {
            return Err(format!("injected {op} failure").into());
        }
        Ok(())
    }
}

impl PerfBackend for RecordingBackend {
    type Metric = RecordingMetric;

    fn new_http_metric(&self, url: &str, method: HttpMethod) -> Result<Self::Metric, BackendError> {
        self.maybe_panic(BackendOp::Create);
        let mut state = self.state.lock().unwrap();
        Self::check(&state, BackendOp::Create)?;
        state.metrics.push(MetricRecord {
            url: url.to_owned(),
            method,
            started: false,
            request_payload_size: None,
            response_payload_size: None,
            response_content_type: None,
            http_response_code: None,
            stop_count: 0,
        });
        Ok(RecordingMetric {
            id: state.metrics.len() - 1,
            backend: self.clone(),
        })
    }
}

pub struct RecordingMetric {
    id: usize,
    backend: RecordingBackend,
}

impl RecordingMetric {
    fn apply(&self, op: BackendOp, f: impl FnOnce(&mut MetricRecord)) -> Result<(), BackendError> {
        self.backend.maybe_panic(op);
        let mut state = self.backend.state.lock().unwrap();
        RecordingBackend::check(&state, op)?;
        f(&mut state.metrics[self.id]);
        Ok(())
    }
}

impl HttpMetric for RecordingMetric {
    fn start(&mut self) -> Result<(), BackendError> {
        self.apply(BackendOp::Start, |m| m.started = true)
    }

    fn set_request_payload_size(&mut self, bytes: u64) -> Result<(), BackendError> {
        self.apply(BackendOp::RequestPayloadSize, |m| {
            m.request_payload_size = Some(bytes);
        })
    }

    fn set_response_payload_size(&mut self, bytes: u64) -> Result<(), BackendError> {
        self.apply(BackendOp::ResponsePayloadSize, |m| {
            m.response_payload_size = Some(bytes);
        })
    }

    fn set_response_content_type(&mut self, content_type: &str) -> Result<(), BackendError> {
        self.apply(BackendOp::ResponseContentType, |m| {
            m.response_content_type = Some(content_type.to_owned());
        })
    }

    fn set_http_response_code(&mut self, code: u16) -> Result<(), BackendError> {
        self.apply(BackendOp::ResponseCode, |m| m.http_response_code = Some(code))
    }

    fn stop(self) -> Result<(), BackendError> {
        self.apply(BackendOp::Stop, |m| m.stop_count += 1)
    }
}
