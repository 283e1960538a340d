use std::fmt;

/// Request-scoped logger for guards and the pipeline.
///
/// Every event carries the request id and the emitting stage as structured
/// fields, so one request can be followed through the whole chain.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    stage: &'static str,
}

impl<'a> RequestLog<'a> {
    /// Creates a logger for `stage` handling request `request_id`.
    pub fn new(request_id: &'a str, stage: &'static str) -> Self {
        Self { request_id, stage }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the stage name associated with this logger.
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Logs an info-level message with request ID.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, stage = self.stage, "{}", args);
    }

    /// Logs a warning-level message with request ID.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, stage = self.stage, "{}", args);
    }

    /// Logs an error-level message with request ID.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, stage = self.stage, "{}", args);
    }

    /// Logs a debug-level message with request ID.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, stage = self.stage, "{}", args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_exposes_its_fields() {
        let log = RequestLog::new("req-42", "authorization");
        assert_eq!(log.request_id(), "req-42");
        assert_eq!(log.stage(), "authorization");
    }

    #[test]
    fn logging_without_subscriber_is_harmless() {
        let log = RequestLog::new("req-43", "schema");
        log.info(format_args!("payload accepted"));
        log.warn(format_args!("denied: {}", "rights"));
        log.error(format_args!("lookup failed"));
        log.debug(format_args!("session released"));
    }
}
