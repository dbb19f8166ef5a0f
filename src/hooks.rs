//! Lifecycle hooks applied around routing and dispatch.

use crate::http::Request;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_PRIORITY: i32 = 10;

type HookFn = Arc<dyn Fn(&Request) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Before,
    BeforeRouter,
    BeforeDispatch,
    AfterDispatch,
    AfterRouter,
    After,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Before => "before",
            Hook::BeforeRouter => "before.router",
            Hook::BeforeDispatch => "before.dispatch",
            Hook::AfterDispatch => "after.dispatch",
            Hook::AfterRouter => "after.router",
            Hook::After => "after",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Hook::Before),
            "before.router" => Ok(Hook::BeforeRouter),
            "before.dispatch" => Ok(Hook::BeforeDispatch),
            "after.dispatch" => Ok(Hook::AfterDispatch),
            "after.router" => Ok(Hook::AfterRouter),
            "after" => Ok(Hook::After),
            other => Err(format!("unknown hook `{}`", other)),
        }
    }
}

/// Named callbacks, ordered by priority (lowest first). Callbacks with the
/// same priority run in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: HashMap<Hook, Vec<(i32, HookFn)>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, hook: Hook, priority: i32, callback: F)
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        let callbacks = self.hooks.entry(hook).or_default();
        callbacks.push((priority, Arc::new(callback)));
        // stable: equal priorities keep insertion order
        callbacks.sort_by_key(|(priority, _)| *priority);
    }

    pub fn apply(&self, hook: Hook, req: &Request) {
        let Some(callbacks) = self.hooks.get(&hook) else {
            return;
        };
        tracing::trace!(hook = %hook, callbacks = callbacks.len(), "Applying hook");
        for (_, callback) in callbacks {
            callback(req);
        }
    }

    pub fn count(&self, hook: Hook) -> usize {
        self.hooks.get(&hook).map_or(0, Vec::len)
    }

    pub fn clear(&mut self, hook: Hook) {
        self.hooks.remove(&hook);
    }
}
