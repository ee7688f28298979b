//! `word` kind: insert item words into the current buffer.

use async_trait::async_trait;
use ddu_core::ActionFlags;
use serde_json::json;

use crate::kind::{ActionArgs, Kind};

const ACTION_APPEND: &str = "append";
const ACTION_INSERT: &str = "insert";

pub struct WordKind;

#[async_trait]
impl Kind for WordKind {
    fn name(&self) -> &str {
        "word"
    }

    fn action_names(&self) -> Vec<String> {
        vec![ACTION_APPEND.to_string(), ACTION_INSERT.to_string()]
    }

    async fn do_action(&self, name: &str, args: &ActionArgs) -> anyhow::Result<ActionFlags> {
        let mode = match name {
            ACTION_APPEND => "p",
            ACTION_INSERT => "P",
            other => anyhow::bail!("word kind has no action '{}'", other),
        };

        let text: Vec<&str> = args.items.iter().map(|item| item.word.as_str()).collect();
        args.host
            .call("ddu#kind#word#paste", vec![json!(text.join("\n")), json!(mode)])
            .await?;

        Ok(ActionFlags::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddu_core::{DduItem, DduOptions, Host, KindOptions, Params};
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::Arc;

    #[derive(Default)]
    struct PasteHost {
        calls: Mutex<Vec<Vec<Value>>>,
    }

    #[async_trait]
    impl Host for PasteHost {
        async fn call(&self, _func: &str, args: Vec<Value>) -> anyhow::Result<Value> {
            self.calls.lock().push(args);
            Ok(Value::Null)
        }

        async fn cmd(&self, _command: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn args(host: Arc<PasteHost>, words: &[&str]) -> ActionArgs {
        ActionArgs {
            host,
            options: DduOptions::default(),
            kind_options: KindOptions::default(),
            kind_params: Params::new(),
            action_params: Value::Null,
            items: words
                .iter()
                .map(|w| DduItem {
                    word: w.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_insert_joins_words() {
        let host = Arc::new(PasteHost::default());
        WordKind
            .do_action(ACTION_INSERT, &args(host.clone(), &["one", "two"]))
            .await
            .unwrap();
        assert_eq!(host.calls.lock()[0], vec![json!("one\ntwo"), json!("P")]);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let host = Arc::new(PasteHost::default());
        assert!(WordKind.do_action("yank", &args(host, &["a"])).await.is_err());
    }
}
