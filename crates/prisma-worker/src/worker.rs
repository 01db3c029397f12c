//! The processing worker: one dedicated thread, one request queue.
//!
//! Requests are handled strictly in arrival order by a single consumer.
//! There is no cancellation: a caller that no longer wants a result just
//! ignores its reply. Each reply is tagged with the id returned by
//! [`WorkerHandle::submit`].

use std::collections::BTreeMap;
use std::thread::JoinHandle;

use prisma_core::{EngineError, Histogram, Pipeline, PixelBuffer, ProcessParams};
use tokio::sync::mpsc;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::protocol::{REQUEST_KINDS, WorkerReply, WorkerRequest};

/// Identifies one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

struct Job {
    id: RequestId,
    request: WorkerRequest,
}

/// Synchronous request handler. Owns the pipeline; holds no per-request state.
pub struct RequestHandler {
    pipeline: Pipeline,
}

impl RequestHandler {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            pipeline: Pipeline::new(config.pipeline),
        }
    }

    /// Answer one typed request. Failures become [`WorkerReply::Error`].
    pub fn handle(&self, request: WorkerRequest) -> WorkerReply {
        let kind = request.kind();
        match self.run(request) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(kind, code = ?err.code(), "request rejected: {err}");
                WorkerReply::from(err)
            }
        }
    }

    /// Answer one JSON request with one JSON reply. Never panics.
    ///
    /// Unparsable input or missing fields yield `invalid_input`; a `kind`
    /// the worker does not know yields `unknown_operation`.
    pub fn handle_json(&self, json: &str) -> String {
        let reply = match parse_request(json) {
            Ok(request) => self.handle(request),
            Err(err) => {
                tracing::warn!(code = ?err.code(), "malformed request: {err}");
                WorkerReply::from(err)
            }
        };
        serde_json::to_string(&reply).unwrap_or_else(|e| {
            tracing::error!("failed to serialize reply: {e}");
            let fallback = serde_json::json!({
                "kind": "error",
                "code": "invalid_input",
                "message": format!("reply serialization failed: {e}"),
            });
            fallback.to_string()
        })
    }

    fn run(&self, request: WorkerRequest) -> Result<WorkerReply, EngineError> {
        match request {
            WorkerRequest::Process {
                buffer,
                adjustments,
                selective,
                balance,
            } => {
                let input = PixelBuffer::try_from(buffer)?;
                tracing::debug!(
                    width = input.width(),
                    height = input.height(),
                    "process request"
                );
                let params = ProcessParams::new(adjustments)
                    .with_selective(selective)
                    .with_balance(balance);
                let output = self.pipeline.process(input, &params)?;
                Ok(WorkerReply::Processed {
                    buffer: output.buffer.into(),
                    histogram: output.histogram,
                    stats: output.stats,
                })
            }
            WorkerRequest::Histogram { buffer } => {
                let input = PixelBuffer::try_from(buffer)?;
                let histogram = Histogram::compute(&input);
                let stats = histogram.summary();
                Ok(WorkerReply::Histogram { histogram, stats })
            }
        }
    }
}

/// Parse a JSON request, telling an unknown `kind` apart from bad input.
fn parse_request(json: &str) -> Result<WorkerRequest, EngineError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| EngineError::invalid(format!("malformed JSON: {e}")))?;
    let Some(kind) = value.get("kind").and_then(serde_json::Value::as_str) else {
        return Err(EngineError::invalid("request is missing a string `kind`"));
    };
    if !REQUEST_KINDS.contains(&kind) {
        return Err(EngineError::UnknownOperation(kind.to_string()));
    }
    serde_json::from_value(value).map_err(|e| EngineError::invalid(e.to_string()))
}

/// Caller-side handle to a running worker thread.
///
/// Dropping the handle closes the request queue; the thread finishes the
/// requests already queued and exits.
pub struct WorkerHandle {
    name: String,
    requests: Option<mpsc::UnboundedSender<Job>>,
    replies: mpsc::UnboundedReceiver<(RequestId, WorkerReply)>,
    pending: BTreeMap<RequestId, WorkerReply>,
    next_id: u64,
    thread: Option<JoinHandle<()>>,
}

/// Spawn the worker on a dedicated OS thread.
///
/// The thread hosts a current-thread tokio runtime that drains the
/// request channel one job at a time.
pub fn spawn(config: WorkerConfig) -> Result<WorkerHandle, WorkerError> {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Job>();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel::<(RequestId, WorkerReply)>();
    let handler = RequestHandler::new(&config);
    let name = config.name.clone();

    let thread = std::thread::Builder::new()
        .name(config.name.clone())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread().build() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("failed to build tokio runtime for worker: {e}");
                    return;
                }
            };

            rt.block_on(async move {
                tracing::info!(worker = %config.name, "worker started");
                let mut handled = 0u64;
                while let Some(Job { id, request }) = request_rx.recv().await {
                    let reply = handler.handle(request);
                    handled += 1;
                    if reply_tx.send((id, reply)).is_err() {
                        tracing::warn!(worker = %config.name, "reply receiver dropped");
                        break;
                    }
                }
                tracing::info!(worker = %config.name, handled, "worker stopped");
            });
        })?;

    Ok(WorkerHandle {
        name,
        requests: Some(request_tx),
        replies: reply_rx,
        pending: BTreeMap::new(),
        next_id: 0,
        thread: Some(thread),
    })
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a request. Returns immediately with the id its reply will carry.
    pub fn submit(&mut self, request: WorkerRequest) -> Result<RequestId, WorkerError> {
        let id = RequestId(self.next_id);
        let sender = self.requests.as_ref().ok_or_else(|| self.stopped())?;
        sender
            .send(Job { id, request })
            .map_err(|_| self.stopped())?;
        self.next_id += 1;
        Ok(id)
    }

    /// Block until the next reply arrives, in completion order.
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv(&mut self) -> Result<(RequestId, WorkerReply), WorkerError> {
        if let Some((id, reply)) = self.pending.pop_first() {
            return Ok((id, reply));
        }
        self.replies.blocking_recv().ok_or_else(|| self.stopped())
    }

    /// Async variant of [`recv`](Self::recv).
    pub async fn recv_async(&mut self) -> Result<(RequestId, WorkerReply), WorkerError> {
        if let Some((id, reply)) = self.pending.pop_first() {
            return Ok((id, reply));
        }
        self.replies.recv().await.ok_or_else(|| self.stopped())
    }

    /// Block until the reply for `id` arrives. Other replies are kept for later.
    pub fn wait_for(&mut self, id: RequestId) -> Result<WorkerReply, WorkerError> {
        if let Some(reply) = self.pending.remove(&id) {
            return Ok(reply);
        }
        loop {
            let (got, reply) = self.replies.blocking_recv().ok_or_else(|| self.stopped())?;
            if got == id {
                return Ok(reply);
            }
            self.pending.insert(got, reply);
        }
    }

    /// Submit one request and wait for its reply. Error replies become `Err`.
    pub fn request(&mut self, request: WorkerRequest) -> Result<WorkerReply, WorkerError> {
        let id = self.submit(request)?;
        into_result(self.wait_for(id)?)
    }

    /// Submit every request, then collect one result per item in
    /// submission order. A failing item does not abort the others.
    pub fn process_batch(
        &mut self,
        requests: impl IntoIterator<Item = WorkerRequest>,
    ) -> Vec<Result<WorkerReply, WorkerError>> {
        let submitted: Vec<Result<RequestId, WorkerError>> =
            requests.into_iter().map(|r| self.submit(r)).collect();
        tracing::debug!(
            worker = %self.name,
            items = submitted.len(),
            "batch submitted"
        );
        submitted
            .into_iter()
            .map(|id| into_result(self.wait_for(id?)?))
            .collect()
    }

    fn stopped(&self) -> WorkerError {
        WorkerError::Stopped(self.name.clone())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!(worker = %self.name, "worker thread panicked");
        }
    }
}

fn into_result(reply: WorkerReply) -> Result<WorkerReply, WorkerError> {
    match reply {
        WorkerReply::Error { code, message } => Err(WorkerError::Rejected { code, message }),
        other => Ok(other),
    }
}
