use crate::error::{Error, Result};

const MAX_THREADS: usize = 1024;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub num_threads: Option<usize>,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "veda-sync-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Shorthand for a default config with a fixed worker count.
    pub fn with_threads(n: usize) -> Self {
        Self {
            num_threads: Some(n),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > MAX_THREADS {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if let Some(size) = self.stack_size {
            if size == 0 {
                return Err(Error::config("stack_size must be > 0"));
            }
        }

        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.worker_threads() >= 1);
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::builder()
            .num_threads(4)
            .thread_name_prefix("io")
            .stack_size(64 * 1024)
            .build()
            .unwrap();

        assert_eq!(config.worker_threads(), 4);
        assert_eq!(config.thread_name_prefix, "io");
        assert_eq!(config.stack_size, Some(64 * 1024));
    }

    #[test]
    fn test_rejects_zero_threads() {
        let err = PoolConfig::builder().num_threads(0).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_too_many_threads() {
        assert!(PoolConfig::with_threads(MAX_THREADS + 1).validate().is_err());
        assert!(PoolConfig::with_threads(MAX_THREADS).validate().is_ok());
    }
}
