use tokio::sync::watch;

use crate::error::{AppError, AppResult};

/// Per-call context handed from the transport to factories and the backend.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    cancel: Option<watch::Receiver<bool>>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self { request_id: uuid::Uuid::new_v4().to_string(), cancel: None }
    }
}

impl RequestContext {
    pub fn new() -> Self { Self::default() }

    /// Context that reports cancellation once `true` is sent on the paired sender.
    pub fn with_cancel(cancel: watch::Receiver<bool>) -> Self {
        Self { cancel: Some(cancel), ..Self::default() }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Fail with [`AppError::Cancelled`] if the caller has gone away.
    pub fn ensure_active(&self) -> AppResult<()> {
        if self.is_cancelled() {
            return Err(AppError::cancelled("cancelled".to_string(), format!("request {} was cancelled", self.request_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_observed() {
        let (tx, rx) = watch::channel(false);
        let ctx = RequestContext::with_cancel(rx);
        assert!(ctx.ensure_active().is_ok());
        tx.send(true).unwrap();
        let err = ctx.ensure_active().unwrap_err();
        assert_eq!(err.http_status(), 499);
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestContext::new().request_id, RequestContext::new().request_id);
    }
}
