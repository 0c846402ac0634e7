use futures_util::future::{AbortHandle, AbortRegistration, Abortable};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::capability::CapabilitySlot;
use crate::dispatch::{Dispatcher, PreparedCall, ToolRequest, ToolResponse};
use crate::error::ToolError;
use crate::presenter::{self, ClipboardSink, COPY_MARKER, FAILURE_MARKER};
use crate::readiness::{ReadinessGate, ReadinessHandle, ReadinessPoll};
use crate::tools::{EmptyReply, ToolSpec};

// Shared across controllers so a settlement can never be mistaken for one
// belonging to a view opened later.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(Result<ToolResponse, ToolError>),
    Aborted,
}

#[derive(Debug, Clone)]
pub struct Settlement {
    ticket: u64,
    outcome: Outcome,
}

impl Settlement {
    #[allow(dead_code)]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// A request that passed the guards and is waiting to be driven.
pub struct PendingRequest {
    ticket: u64,
    call: PreparedCall,
    registration: AbortRegistration,
}

impl PendingRequest {
    pub async fn run(self) -> Settlement {
        let outcome = match Abortable::new(self.call.send(), self.registration).await {
            Ok(result) => Outcome::Completed(result),
            Err(_) => Outcome::Aborted,
        };
        Settlement {
            ticket: self.ticket,
            outcome,
        }
    }
}

pub enum Submission {
    /// A request is already in flight.
    Ignored,
    /// Rejected before anything was sent; the controller already shows why.
    Settled,
    Dispatched(PendingRequest),
}

struct InFlight {
    ticket: u64,
    abort: AbortHandle,
}

/// State behind one open tool view.
pub struct ToolController {
    tool: &'static ToolSpec,
    dispatcher: Dispatcher,
    readiness: ReadinessHandle,
    input: String,
    language: Option<&'static str>,
    result_text: String,
    status: RequestStatus,
    status_message: String,
    notice: Option<String>,
    last_error: Option<ToolError>,
    in_flight: Option<InFlight>,
}

impl ToolController {
    pub fn new(tool: &'static ToolSpec, dispatcher: Dispatcher, readiness: ReadinessHandle) -> Self {
        Self {
            tool,
            dispatcher,
            readiness,
            input: tool.seed.to_string(),
            language: tool.default_language,
            result_text: String::new(),
            status: RequestStatus::Idle,
            status_message: String::new(),
            notice: None,
            last_error: None,
            in_flight: None,
        }
    }

    /// Opens a controller whose readiness follows `slot`. The returned poll
    /// has to be driven by the caller for the tool to ever become ready.
    pub fn open(
        tool: &'static ToolSpec,
        slot: Arc<CapabilitySlot>,
        poll_interval: Duration,
    ) -> (Self, ReadinessPoll) {
        let probe_slot = slot.clone();
        let (readiness, poll) =
            ReadinessGate::observe(move || Ok(probe_slot.is_available()), poll_interval);
        (Self::new(tool, Dispatcher::new(slot), readiness), poll)
    }

    pub fn tool(&self) -> &'static ToolSpec {
        self.tool
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[allow(dead_code)]
    pub fn last_error(&self) -> Option<&ToolError> {
        self.last_error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn on_input_changed(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn select_language(&mut self, language: &'static str) {
        if self.tool.accepts_language(language) {
            self.language = Some(language);
        } else {
            tracing::debug!(tool = ?self.tool.kind, language, "ignoring unsupported language");
        }
    }

    pub fn load_example(&mut self) {
        self.input = self.tool.seed.to_string();
    }

    pub fn submit(&mut self) -> Submission {
        if self.status == RequestStatus::Pending {
            return Submission::Ignored;
        }

        self.notice = None;
        self.result_text.clear();

        let request = ToolRequest {
            template: self.tool.prompt,
            user_input: self.input.clone(),
            language: self.language,
        };

        match self.dispatcher.prepare(&request, self.readiness.is_ready()) {
            Err(e) => {
                self.fail(e);
                Submission::Settled
            }
            Ok(call) => {
                let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
                let (abort, registration) = AbortHandle::new_pair();
                self.in_flight = Some(InFlight { ticket, abort });
                self.status = RequestStatus::Pending;
                self.status_message.clear();
                self.last_error = None;
                tracing::debug!(tool = ?self.tool.kind, ticket, "request dispatched");

                Submission::Dispatched(PendingRequest {
                    ticket,
                    call,
                    registration,
                })
            }
        }
    }

    /// Applies the result of a pending request. Returns false when the
    /// settlement is not for the request currently in flight. Aborted
    /// requests were already cleared by whoever aborted them.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        let result = match settlement.outcome {
            Outcome::Completed(result) => result,
            Outcome::Aborted => {
                tracing::debug!(tool = ?self.tool.kind, ticket = settlement.ticket, "discarding aborted request");
                return false;
            }
        };
        match &self.in_flight {
            Some(in_flight) if in_flight.ticket == settlement.ticket => {}
            _ => {
                tracing::debug!(tool = ?self.tool.kind, ticket = settlement.ticket, "discarding stale settlement");
                return false;
            }
        }
        self.in_flight = None;

        match result {
            Ok(response) => self.succeed(response),
            Err(e) => self.fail(e),
        }
        true
    }

    pub fn reset(&mut self) {
        self.abort_in_flight();
        self.input.clear();
        self.result_text.clear();
        self.status_message.clear();
        self.notice = None;
        self.last_error = None;
        self.status = RequestStatus::Idle;
    }

    /// Text the output panel currently stands for, for copying.
    pub fn output_text(&self) -> &str {
        match self.status {
            RequestStatus::Success => &self.result_text,
            _ => self.tool.placeholder,
        }
    }

    pub fn copy_result(&mut self, clipboard: &mut dyn ClipboardSink) {
        if !self.tool.copyable {
            return;
        }
        let result = presenter::copy_to_clipboard(self.output_text(), self.tool.placeholder, clipboard);
        self.notice = Some(match result {
            Ok(message) => format!("{} {}", COPY_MARKER, message),
            Err(e) => {
                let text = format!("{} {}", FAILURE_MARKER, presenter::describe_error(self.tool, &e));
                self.last_error = Some(e);
                text
            }
        });
    }

    fn succeed(&mut self, response: ToolResponse) {
        if response.text.is_empty() {
            if let EmptyReply::Reject(message) = self.tool.empty_reply {
                self.fail(ToolError::ServiceError(message.to_string()));
                return;
            }
        }
        self.status = RequestStatus::Success;
        self.result_text = response.text;
        self.status_message = self.tool.success_message.unwrap_or_default().to_string();
        self.last_error = None;
    }

    fn fail(&mut self, error: ToolError) {
        tracing::debug!(tool = ?self.tool.kind, error = %error, "request failed");
        self.status = RequestStatus::Failed;
        self.result_text.clear();
        self.status_message = presenter::describe_error(self.tool, &error);
        self.last_error = Some(error);
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(tool = ?self.tool.kind, ticket = in_flight.ticket, "aborting in-flight request");
            in_flight.abort.abort();
        }
    }
}

impl Drop for ToolController {
    fn drop(&mut self) {
        self.abort_in_flight();
        self.readiness.dispose();
    }
}
