//! Error normalization and timing audit events.
//!
//! Operations never hand an error to their caller. Failures are logged
//! here, with the operation name and its non-sensitive parameters, and
//! then flattened to `None`.

use std::fmt::Debug;
use tracing::{debug, error};

use cloudfiles_common::Result;

use crate::context::RequestContext;

/// Target of diagnostic events logged for later research.
pub const RESEARCH_TARGET: &str = "cloudfiles::research";
/// Target of timing audit events.
pub const TIMING_TARGET: &str = "cloudfiles::timing";

/// Whether a `NotFound` failure is worth a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Missing objects are expected; do not log them.
    Suppress,
    /// Log every failure.
    Log,
}

/// Record a start/end marker for a backend call.
pub fn timing_audit(ctx: &RequestContext, stage: &str, label: &str) {
    debug!(
        target: TIMING_TARGET,
        request_id = %ctx.id(),
        stage,
        label,
        elapsed_ms = ctx.elapsed_ms() as u64,
        "timing audit"
    );
}

/// Flatten an operation result, logging the failure unless suppressed.
pub fn settle<T>(
    ctx: &RequestContext,
    cmd: &str,
    params: &dyn Debug,
    result: Result<T>,
    policy: NotFoundPolicy,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            if !(err.is_not_found() && policy == NotFoundPolicy::Suppress) {
                error!(
                    target: RESEARCH_TARGET,
                    request_id = %ctx.id(),
                    backend = ctx.client().map(|c| c.name()).unwrap_or("none"),
                    cmd,
                    params = ?params,
                    kind = %err.kind(),
                    error = %err,
                    "storage operation failed"
                );
            }
            None
        }
    }
}
