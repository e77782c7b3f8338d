//! Mock runtime for testing
//!
//! Records every container it is asked to run and replays queued results,
//! so facades can be tested without a container engine.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::ContainerRuntime;
use crate::container::Container;
use crate::error::RuntimeError;
use crate::handles::File;

/// A single request made to the mock
#[derive(Debug, Clone)]
pub enum RuntimeCall {
    Stdout(Container),
    File { container: Container, path: String },
}

impl RuntimeCall {
    pub fn container(&self) -> &Container {
        match self {
            RuntimeCall::Stdout(c) => c,
            RuntimeCall::File { container, .. } => container,
        }
    }
}

enum Reply {
    Output(Vec<u8>),
    Failure(RuntimeError),
}

/// In-memory runtime for testing
#[derive(Clone, Default)]
pub struct MockRuntime {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<Mutex<Vec<RuntimeCall>>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue output for the next call (stdout text, or file contents)
    pub fn push_output(&self, output: impl Into<Vec<u8>>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Output(output.into()));
        self
    }

    /// Queue a failure for the next call
    pub fn push_failure(&self, err: RuntimeError) -> &Self {
        self.replies.lock().unwrap().push_back(Reply::Failure(err));
        self
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<RuntimeCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn record(&self, call: RuntimeCall) -> Result<Vec<u8>, RuntimeError> {
        self.calls.lock().unwrap().push(call);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Output(bytes)) => Ok(bytes),
            Some(Reply::Failure(err)) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn stdout_bytes(&self, container: &Container) -> Result<Vec<u8>, RuntimeError> {
        if container.steps().is_empty() {
            return Err(RuntimeError::NothingToRun);
        }
        self.record(RuntimeCall::Stdout(container.clone()))
    }

    async fn file(&self, container: &Container, path: &str) -> Result<File, RuntimeError> {
        let bytes = self.record(RuntimeCall::File {
            container: container.clone(),
            path: path.to_string(),
        })?;
        let name = path.rsplit('/').next().unwrap_or(path);
        Ok(File::new(name, bytes))
    }
}
