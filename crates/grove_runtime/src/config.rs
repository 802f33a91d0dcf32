//! Executor configuration.

use grove_semantic::ValidationOptions;
use serde::Deserialize;

/// Tunables for an [`Executor`](crate::Executor).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Upper bound on resolver calls in flight for one request.
    pub max_concurrent_resolvers: Option<usize>,
    /// Maximum selection depth accepted by validation.
    pub max_depth: Option<usize>,
    /// Run validation rules on the rayon pool.
    pub parallel_validation: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_resolvers: None,
            max_depth: None,
            parallel_validation: true,
        }
    }
}

impl ExecutorConfig {
    #[must_use]
    pub fn with_max_concurrent_resolvers(mut self, limit: usize) -> Self {
        self.max_concurrent_resolvers = Some(limit.max(1));
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_parallel_validation(mut self, parallel: bool) -> Self {
        self.parallel_validation = parallel;
        self
    }

    pub(crate) fn validation_options(&self) -> ValidationOptions {
        let options = ValidationOptions::default().with_parallel(self.parallel_validation);
        match self.max_depth {
            Some(depth) => options.with_max_depth(depth),
            None => options,
        }
    }
}
