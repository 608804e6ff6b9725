//! The operation invoker
//!
//! Drives one invocation from bound inputs to emitted pages:
//!
//! ```text
//! Idle -> Building request -> Awaiting response -> Emitting page -+-> Done
//!              ^                      |                           |
//!              +----------- cursor ---+---------------------------+
//!                                     +-> Failed
//! ```
//!
//! Calls are strictly sequential. The cursor read from response N is only
//! ever sent with request N+1 of the same invocation, and cancellation is
//! observed before each remote call, never in the middle of one.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::binding::{BindingWarning, InvocationContext, insert_at};
use crate::descriptor::OperationDescriptor;
use crate::error::{CoreError, Result};
use crate::select::unroll;
use crate::transport::{GlueTransport, TransportError};

/// One response page after selection
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based position in the invocation
    pub number: usize,
    /// Selected output, arrays unrolled
    pub items: Vec<Value>,
    /// Cursor the service returned with this page, if more results exist
    pub cursor: Option<String>,
    /// The selection was a list, even if it held fewer than two items
    pub listed: bool,
}

/// Receives pages as they arrive
pub trait PageSink {
    fn emit(&mut self, page: Page);
}

impl PageSink for Vec<Page> {
    fn emit(&mut self, page: Page) {
        self.push(page);
    }
}

/// Adapter that lets a closure act as a [`PageSink`]
pub struct FnSink<F>(pub F);

impl<F: FnMut(Page)> PageSink for FnSink<F> {
    fn emit(&mut self, page: Page) {
        (self.0)(page)
    }
}

/// Wrap a closure as a [`PageSink`]
pub fn sink_fn<F: FnMut(Page)>(f: F) -> FnSink<F> {
    FnSink(f)
}

/// Outcome of a completed invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationSummary {
    /// Remote calls made
    pub calls: usize,
    /// Pages handed to the sink
    pub pages: usize,
    /// Set when the caller controls paging and the service has more results
    pub next_cursor: Option<String>,
    pub warnings: Vec<BindingWarning>,
}

/// Runs operations over a transport
#[derive(Debug, Clone)]
pub struct Invoker<T> {
    transport: T,
}

impl<T: GlueTransport> Invoker<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute the invocation described by `ctx`, emitting every page to `sink`
    ///
    /// Pages emitted before a failure stay in the sink.
    pub async fn invoke<S>(
        &self,
        ctx: &InvocationContext,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<InvocationSummary>
    where
        S: PageSink + ?Sized,
    {
        let operation = ctx.operation();
        let (base_request, warnings) = ctx.build_request();
        for warning in &warnings {
            warn!("{}: {}", operation.command, warning);
        }

        let manual_paging = ctx.user_controls_paging();
        let mut cursor = ctx.starting_cursor();
        let mut summary = InvocationSummary {
            warnings,
            ..Default::default()
        };

        debug!(
            "Invoking {} (selector: {}, paginated: {}, manual paging: {})",
            operation.name,
            ctx.selector(),
            operation.is_paginated(),
            manual_paging
        );

        loop {
            if cancel.is_cancelled() {
                debug!("{} cancelled after {} call(s)", operation.name, summary.calls);
                return Err(CoreError::Cancelled {
                    operation: operation.name.to_string(),
                    completed_calls: summary.calls,
                });
            }

            let mut request = base_request.clone();
            if let Some(token) = &cursor {
                set_cursor(&mut request, operation, token);
            }
            trace!("{} request: {}", operation.name, request);

            let response = self
                .transport
                .call(operation.name, &request)
                .await
                .map_err(|e| self.wrap_error(operation, e))?;
            summary.calls += 1;

            let next = next_cursor(operation, &response);
            let selected = ctx.selector().apply(&response, ctx);
            let listed = matches!(selected, Some(Value::Array(_)));
            let items = unroll(selected);
            summary.pages += 1;
            debug!(
                "{} page {}: {} item(s), more results: {}",
                operation.name,
                summary.pages,
                items.len(),
                next.is_some()
            );
            sink.emit(Page {
                number: summary.pages,
                items,
                cursor: next.clone(),
                listed,
            });

            if !operation.is_paginated() {
                break;
            }
            if manual_paging {
                summary.next_cursor = next;
                break;
            }
            match next {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        debug!(
            "{} done: {} call(s), {} page(s)",
            operation.name, summary.calls, summary.pages
        );
        Ok(summary)
    }

    fn wrap_error(&self, operation: &OperationDescriptor, err: TransportError) -> CoreError {
        warn!("{} failed: {}", operation.name, err);
        if err.is_name_resolution() {
            CoreError::NameResolution {
                operation: operation.name.to_string(),
                endpoint: self.transport.endpoint().to_string(),
                source: err,
            }
        } else {
            CoreError::Remote {
                operation: operation.name.to_string(),
                source: err,
            }
        }
    }
}

fn set_cursor(request: &mut Value, operation: &OperationDescriptor, token: &str) {
    let value = Value::String(token.to_string());
    match operation.cursor_field() {
        Some(field) => insert_at(request, field, value),
        None => {
            if let (Some(paging), Some(map)) = (operation.paging, request.as_object_mut()) {
                map.insert(paging.input.to_string(), value);
            }
        }
    }
}

/// Non-empty cursor from a paginated response
fn next_cursor(operation: &OperationDescriptor, response: &Value) -> Option<String> {
    let paging = operation.paging?;
    response
        .get(paging.output)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
