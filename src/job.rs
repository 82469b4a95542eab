//! Named, independently dispatchable units of work.
//!
//! A job receives the adapter plus CLI-style extra arguments and resolves to
//! exactly one outcome: the result model, or the adapter's error untouched.

use crate::error::BotError;
use crate::model::Model;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

#[async_trait]
pub trait Job<A: ?Sized + Sync>: Send + Sync {
    /// Name the runner dispatches on (e.g. `"me"`).
    fn name(&self) -> &'static str;

    /// One-line usage shown by the runner.
    fn usage(&self) -> &'static str;

    async fn run(
        &self,
        adapter: &A,
        extra_arguments: &[String],
    ) -> Result<Box<dyn Model>, BotError>;
}

/// Jobs available for one adapter type, keyed by name.
pub struct JobRegistry<A: ?Sized + Sync> {
    jobs: BTreeMap<&'static str, Arc<dyn Job<A>>>,
}

impl<A: ?Sized + Sync> JobRegistry<A> {
    pub fn new() -> Self {
        Self {
            jobs: BTreeMap::new(),
        }
    }

    /// Adds `job`, replacing any job registered under the same name.
    pub fn register(&mut self, job: Arc<dyn Job<A>>) {
        self.jobs.insert(job.name(), job);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Job<A>>> {
        self.jobs.get(name).cloned()
    }

    /// Registered jobs, sorted by name.
    pub fn jobs(&self) -> impl Iterator<Item = &Arc<dyn Job<A>>> {
        self.jobs.values()
    }

    /// Runs the job called `name`.
    pub async fn dispatch(
        &self,
        name: &str,
        adapter: &A,
        extra_arguments: &[String],
    ) -> Result<Box<dyn Model>, BotError> {
        let job = self
            .get(name)
            .ok_or_else(|| BotError::UnknownJob(name.to_string()))?;

        tracing::debug!(job = %name, args = extra_arguments.len(), "Dispatching job");
        job.run(adapter, extra_arguments).await
    }
}

impl<A: ?Sized + Sync> Default for JobRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Counter {
        fail: bool,
    }

    struct Echo;

    #[async_trait]
    impl Job<Counter> for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn usage(&self) -> &'static str {
            "echo [args...]"
        }

        async fn run(
            &self,
            adapter: &Counter,
            extra_arguments: &[String],
        ) -> Result<Box<dyn Model>, BotError> {
            if adapter.fail {
                return Err(BotError::Provider {
                    status: 500,
                    body: json!({"error": "boom"}),
                });
            }
            Ok(Box::new(json!(extra_arguments)))
        }
    }

    fn registry() -> JobRegistry<Counter> {
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(Echo));
        registry
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let args = vec!["a".to_string(), "b".to_string()];
        let data = registry()
            .dispatch("echo", &Counter { fail: false }, &args)
            .await
            .unwrap();
        assert_eq!(data.json(), &json!(["a", "b"]));
        assert!(data.downcast_ref::<Value>().is_some());
    }

    #[tokio::test]
    async fn test_dispatch_forwards_adapter_error() {
        let err = registry()
            .dispatch("echo", &Counter { fail: true }, &[])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_job() {
        let err = registry()
            .dispatch("nope", &Counter { fail: false }, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::UnknownJob(name) if name == "nope"));
    }

    #[test]
    fn test_lookup_and_listing() {
        let registry = registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());

        let names: Vec<&str> = registry.jobs().map(|job| job.name()).collect();
        assert_eq!(names, vec!["echo"]);
    }
}
