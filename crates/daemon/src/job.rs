// crates/daemon/src/job.rs
//! Work and callback pairing executed once inside a daemon.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::{DaemonError, JobFailure, Result};

/// Parameter bundle bound to a work or callback function.
pub type Params = Value;

pub type WorkFn = fn(Option<&Params>) -> std::result::Result<Value, JobFailure>;
pub type CallbackFn = fn(&Value, Option<&Params>) -> std::result::Result<(), JobFailure>;

type BoxedWork = Box<dyn FnMut(Option<&Params>) -> std::result::Result<Value, JobFailure> + Send>;
type BoxedCallback =
    Box<dyn FnMut(&Value, Option<&Params>) -> std::result::Result<(), JobFailure> + Send>;

/// The unit of work a [`Daemon`](crate::Daemon) runs after detaching.
///
/// `execute` and `finish` are called exactly once, in that order. Failures
/// are returned as-is; the daemon decides what to do with them.
pub trait JobUnit {
    /// Checked before forking so misconfiguration is reported to the caller.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self) -> std::result::Result<(), JobFailure>;

    fn finish(&mut self) -> std::result::Result<(), JobFailure>;
}

/// Named work and callback functions that can be bound to a [`Job`] by name.
#[derive(Default, Clone)]
pub struct JobCatalog {
    work: HashMap<String, WorkFn>,
    callbacks: HashMap<String, CallbackFn>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_work(&mut self, name: impl Into<String>, work: WorkFn) -> &mut Self {
        self.work.insert(name.into(), work);
        self
    }

    pub fn register_callback(&mut self, name: impl Into<String>, callback: CallbackFn) -> &mut Self {
        self.callbacks.insert(name.into(), callback);
        self
    }

    pub fn work(&self, name: &str) -> Option<WorkFn> {
        self.work.get(name).copied()
    }

    pub fn callback(&self, name: &str) -> Option<CallbackFn> {
        self.callbacks.get(name).copied()
    }

    pub fn work_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.work.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn callback_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.callbacks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for JobCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCatalog")
            .field("work", &self.work_names())
            .field("callbacks", &self.callback_names())
            .finish()
    }
}

/// A work function, its completion callback and the result handed between them.
#[derive(Default)]
pub struct Job {
    work: Option<BoxedWork>,
    work_params: Option<Params>,
    callback: Option<BoxedCallback>,
    callback_params: Option<Params>,
    result: Option<Value>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the work function. `params` replaces the bound parameters only
    /// when given.
    pub fn set_work<F>(&mut self, work: F, params: Option<Params>) -> &mut Self
    where
        F: FnMut(Option<&Params>) -> std::result::Result<Value, JobFailure> + Send + 'static,
    {
        self.work = Some(Box::new(work));
        if params.is_some() {
            self.work_params = params;
        }
        self
    }

    pub fn set_callback<F>(&mut self, callback: F, params: Option<Params>) -> &mut Self
    where
        F: FnMut(&Value, Option<&Params>) -> std::result::Result<(), JobFailure> + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        if params.is_some() {
            self.callback_params = params;
        }
        self
    }

    /// Binds the catalog's work function called `name`.
    pub fn set_named_work(
        &mut self,
        catalog: &JobCatalog,
        name: &str,
        params: Option<Params>,
    ) -> Result<&mut Self> {
        let work = catalog
            .work(name)
            .ok_or_else(|| DaemonError::InvalidWork(name.to_string()))?;
        Ok(self.set_work(work, params))
    }

    /// Binds the catalog's callback function called `name`.
    pub fn set_named_callback(
        &mut self,
        catalog: &JobCatalog,
        name: &str,
        params: Option<Params>,
    ) -> Result<&mut Self> {
        let callback = catalog
            .callback(name)
            .ok_or_else(|| DaemonError::InvalidCallback(name.to_string()))?;
        Ok(self.set_callback(callback, params))
    }

    pub fn has_work(&self) -> bool {
        self.work.is_some()
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub fn work_params(&self) -> Option<&Params> {
        self.work_params.as_ref()
    }

    pub fn callback_params(&self) -> Option<&Params> {
        self.callback_params.as_ref()
    }

    /// The value produced by the last `execute`, until `finish` consumes it.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

impl JobUnit for Job {
    fn validate(&self) -> Result<()> {
        if self.work.is_none() {
            return Err(DaemonError::InvalidWork("<unset>".to_string()));
        }
        if self.callback.is_none() {
            return Err(DaemonError::InvalidCallback("<unset>".to_string()));
        }
        Ok(())
    }

    fn execute(&mut self) -> std::result::Result<(), JobFailure> {
        let work = self.work.as_mut().ok_or("no work function set")?;
        self.result = Some(work(self.work_params.as_ref())?);
        Ok(())
    }

    fn finish(&mut self) -> std::result::Result<(), JobFailure> {
        let callback = self.callback.as_mut().ok_or("no callback function set")?;
        let result = self.result.take().unwrap_or(Value::Null);
        callback(&result, self.callback_params.as_ref())
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("work", &self.work.is_some())
            .field("work_params", &self.work_params)
            .field("callback", &self.callback.is_some())
            .field("callback_params", &self.callback_params)
            .field("result", &self.result)
            .finish()
    }
}
