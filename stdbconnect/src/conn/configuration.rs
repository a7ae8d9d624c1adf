use std::time::Duration;

/// Tunable knobs of one connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfiguration {
    base_reconnect_delay_ms: u64,
    max_reconnect_delay_ms: u64,
    max_reconnect_attempts: u32,
    handshake_timeout: Duration,
}

impl Default for ConnectionConfiguration {
    fn default() -> Self {
        Self {
            base_reconnect_delay_ms: Self::DEFAULT_BASE_RECONNECT_DELAY_MS,
            max_reconnect_delay_ms: Self::DEFAULT_MAX_RECONNECT_DELAY_MS,
            max_reconnect_attempts: Self::DEFAULT_MAX_RECONNECT_ATTEMPTS,
            handshake_timeout: Self::DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl ConnectionConfiguration {
    /// Default base of the linear backoff between reconnect attempts.
    pub const DEFAULT_BASE_RECONNECT_DELAY_MS: u64 = 1_000;

    /// Default cap of the backoff delay.
    pub const DEFAULT_MAX_RECONNECT_DELAY_MS: u64 = 30_000;

    /// Default number of reconnect attempts before giving up.
    pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

    /// Default time budget for the connect-time handshake.
    pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Returns the backoff base delay in milliseconds.
    pub fn base_reconnect_delay_ms(&self) -> u64 {
        self.base_reconnect_delay_ms
    }
    /// Sets the backoff base delay in milliseconds.
    pub fn set_base_reconnect_delay_ms(&mut self, ms: u64) {
        self.base_reconnect_delay_ms = ms;
    }
    /// Builder-method for setting the backoff base delay in milliseconds.
    #[must_use]
    pub fn with_base_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.base_reconnect_delay_ms = ms;
        self
    }

    /// Returns the backoff delay cap in milliseconds.
    pub fn max_reconnect_delay_ms(&self) -> u64 {
        self.max_reconnect_delay_ms
    }
    /// Sets the backoff delay cap in milliseconds.
    pub fn set_max_reconnect_delay_ms(&mut self, ms: u64) {
        self.max_reconnect_delay_ms = ms;
    }
    /// Builder-method for setting the backoff delay cap in milliseconds.
    #[must_use]
    pub fn with_max_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.max_reconnect_delay_ms = ms;
        self
    }

    /// Returns the number of reconnect attempts before giving up.
    pub fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }
    /// Sets the number of reconnect attempts before giving up.
    pub fn set_max_reconnect_attempts(&mut self, attempts: u32) {
        self.max_reconnect_attempts = attempts;
    }
    /// Builder-method for setting the number of reconnect attempts.
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Returns the connect-time handshake time budget.
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }
    /// Sets the connect-time handshake time budget.
    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }
    /// Builder-method for setting the connect-time handshake time budget.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}
