//! Host that stands in for an editor when running from a terminal.

use std::collections::HashSet;

use async_trait::async_trait;
use ddu_core::Host;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::trace;

const BUFNR: i64 = 1;

/// Keeps the lines a UI writes into its buffer.
///
/// Every buffer is buffer 1 and is always shown; the cursor sits on the
/// first line. Calls it does not model return null.
#[derive(Default)]
pub struct TerminalHost {
    lines: Mutex<Vec<String>>,
    buffers: Mutex<HashSet<String>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of the last buffer update.
    pub fn buffer(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[async_trait]
impl Host for TerminalHost {
    async fn call(&self, func: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        trace!(func, ?args, "Host call");
        let name = args.first().and_then(Value::as_str).unwrap_or_default();
        Ok(match func {
            "bufexists" => json!(i64::from(self.buffers.lock().contains(name))),
            "bufnr" => json!(BUFNR),
            "bufadd" => {
                self.buffers.lock().insert(name.to_string());
                json!(BUFNR)
            }
            "line" => json!(1),
            "win_findbuf" => json!([1000]),
            "ddu#ui#std#update_buffer" => {
                let lines = args
                    .get(1)
                    .and_then(Value::as_array)
                    .map(|lines| {
                        lines
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                *self.lines.lock() = lines;
                Value::Null
            }
            _ => Value::Null,
        })
    }

    async fn cmd(&self, command: &str) -> anyhow::Result<()> {
        trace!(command, "Host command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_buffer_updates() {
        let host = TerminalHost::new();
        let exists = host.call("bufexists", vec![json!("ddu-std-x")]).await.unwrap();
        assert_eq!(exists, json!(0));
        assert_eq!(host.call("bufadd", vec![json!("ddu-std-x")]).await.unwrap(), json!(1));
        let exists = host.call("bufexists", vec![json!("ddu-std-x")]).await.unwrap();
        assert_eq!(exists, json!(1));

        host.call("ddu#ui#std#update_buffer", vec![json!(1), json!([" a", "*b"])])
            .await
            .unwrap();
        assert_eq!(host.buffer(), vec![" a", "*b"]);

        host.call("ddu#ui#std#update_buffer", vec![json!(1), json!([])])
            .await
            .unwrap();
        assert!(host.buffer().is_empty());
    }
}
