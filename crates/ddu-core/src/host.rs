//! Contract for round trips into the host editor.
//!
//! The engine never talks to the editor itself. Sources, UIs and kinds get
//! an `Arc<dyn Host>` and use it for buffer, window and function calls; how
//! those calls travel is up to the implementation.

use async_trait::async_trait;
use serde_json::Value;

/// Handle to the host editor.
#[async_trait]
pub trait Host: Send + Sync {
    /// Call a host function and return its result.
    async fn call(&self, func: &str, args: Vec<Value>) -> anyhow::Result<Value>;

    /// Execute a host command.
    async fn cmd(&self, command: &str) -> anyhow::Result<()>;
}

/// A host that accepts every call and returns `null`.
///
/// Handy for headless use and tests that do not inspect host traffic.
pub struct NullHost;

#[async_trait]
impl Host for NullHost {
    async fn call(&self, _func: &str, _args: Vec<Value>) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }

    async fn cmd(&self, _command: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
