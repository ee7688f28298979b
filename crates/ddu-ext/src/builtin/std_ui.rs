//! `std` UI: one plain buffer, one line per item.

use std::collections::BTreeSet;

use anyhow::Context as _;
use async_trait::async_trait;
use ddu_core::{ActionFlags, DduItem, Host, Params};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::ui::{Ui, UiActionArgs, UiRedrawArgs};

const ACTION_DO: &str = "doAction";
const ACTION_TOGGLE: &str = "toggleSelectItem";

#[derive(Debug, Default, Deserialize)]
struct DoActionParams {
    name: Option<String>,
    params: Option<Value>,
}

#[derive(Default)]
struct StdState {
    items: Vec<DduItem>,
    selected: BTreeSet<usize>,
}

/// Renders items into a `ddu-std-<name>` buffer.
///
/// Keeps at most `max_items` items; marked lines are prefixed with `*`.
pub struct StdUi {
    max_items: usize,
    state: Mutex<StdState>,
}

impl StdUi {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            state: Mutex::new(StdState::default()),
        }
    }

    /// Items currently held for rendering.
    pub fn items(&self) -> Vec<DduItem> {
        self.state.lock().items.clone()
    }

    /// Marked positions, ascending.
    pub fn selected(&self) -> Vec<usize> {
        self.state.lock().selected.iter().copied().collect()
    }

    /// Buffer lines for the current state.
    pub fn lines(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mark = if state.selected.contains(&i) { "*" } else { " " };
                format!("{}{}", mark, item.label())
            })
            .collect()
    }

    /// Number of the buffer named `buffer_name`, created when the host no
    /// longer has it.
    async fn ensure_buffer(&self, host: &dyn Host, buffer_name: &str) -> anyhow::Result<i64> {
        let exists = host.call("bufexists", vec![json!(buffer_name)]).await?;
        if exists.as_i64().unwrap_or(0) != 0 {
            return host
                .call("bufnr", vec![json!(buffer_name)])
                .await?
                .as_i64()
                .with_context(|| format!("bufnr returned no buffer number for {}", buffer_name));
        }

        let bufnr = host
            .call("bufadd", vec![json!(buffer_name)])
            .await?
            .as_i64()
            .with_context(|| format!("bufadd returned no buffer number for {}", buffer_name))?;
        host.call("bufload", vec![json!(bufnr)]).await?;
        host.cmd("syntax match deniteSelectedLine /^[*].*/ contains=deniteConcealedMark")
            .await?;
        host.cmd("syntax match deniteConcealedMark /^[ *]/ conceal contained")
            .await?;
        host.call("setbufvar", vec![json!(bufnr), json!("&filetype"), json!("ddu-std")])
            .await?;

        debug!(bufnr, buffer = %buffer_name, "Created std buffer");
        Ok(bufnr)
    }

    /// Zero-based index of the line under the cursor.
    async fn cursor_index(host: &dyn Host) -> anyhow::Result<Option<usize>> {
        let line = host.call("line", vec![json!(".")]).await?.as_i64().unwrap_or(0);
        Ok(usize::try_from(line - 1).ok())
    }

    async fn do_action_on_items(&self, args: &UiActionArgs) -> anyhow::Result<ActionFlags> {
        let params: DoActionParams = match &args.action_params {
            Value::Null => DoActionParams::default(),
            value => serde_json::from_value(value.clone()).context("invalid doAction params")?,
        };

        let items: Vec<DduItem> = {
            let cursor = Self::cursor_index(args.host.as_ref()).await?;
            let state = self.state.lock();
            if state.selected.is_empty() {
                cursor
                    .and_then(|idx| state.items.get(idx))
                    .cloned()
                    .into_iter()
                    .collect()
            } else {
                state
                    .selected
                    .iter()
                    .filter_map(|idx| state.items.get(*idx))
                    .cloned()
                    .collect()
            }
        };

        if items.is_empty() {
            return Ok(ActionFlags::NONE);
        }

        args.host
            .call(
                "ddu#item_action",
                vec![
                    json!(args.options.name),
                    json!(params.name.unwrap_or_else(|| "default".to_string())),
                    serde_json::to_value(items)?,
                    params.params.unwrap_or_else(|| json!({})),
                ],
            )
            .await?;

        Ok(ActionFlags::NONE)
    }

    async fn toggle_select(&self, args: &UiActionArgs) -> anyhow::Result<ActionFlags> {
        let Some(idx) = Self::cursor_index(args.host.as_ref()).await? else {
            return Ok(ActionFlags::NONE);
        };

        let mut state = self.state.lock();
        if idx >= state.items.len() {
            return Ok(ActionFlags::NONE);
        }
        if !state.selected.remove(&idx) {
            state.selected.insert(idx);
        }
        Ok(ActionFlags::REDRAW)
    }
}

#[async_trait]
impl Ui for StdUi {
    fn name(&self) -> &str {
        "std"
    }

    fn refresh_items(&self, items: Vec<DduItem>) {
        let mut state = self.state.lock();
        state.items = items.into_iter().take(self.max_items).collect();
        state.selected.clear();
    }

    async fn redraw(&self, args: &UiRedrawArgs) -> anyhow::Result<()> {
        let host = args.host.as_ref();
        let buffer_name = format!("ddu-std-{}", args.options.name);
        let bufnr = self.ensure_buffer(host, &buffer_name).await?;

        host.call("setbufvar", vec![json!(bufnr), json!("&modifiable"), json!(1)])
            .await?;

        let windows = host.call("win_findbuf", vec![json!(bufnr)]).await?;
        if windows.as_array().map_or(true, |ids| ids.is_empty()) {
            host.cmd(&format!("buffer {}", bufnr)).await?;
        }

        let lines = self.lines();
        host.call("ddu#ui#std#update_buffer", vec![json!(bufnr), json!(lines)])
            .await?;
        host.call(
            "setbufvar",
            vec![json!(bufnr), json!("ddu_ui_name"), json!(args.options.name)],
        )
        .await?;
        host.call(
            "ddu#ui#std#filter#_open",
            vec![json!(args.options.name), json!(args.options.input)],
        )
        .await?;

        Ok(())
    }

    fn action_names(&self) -> Vec<String> {
        vec![ACTION_DO.to_string(), ACTION_TOGGLE.to_string()]
    }

    async fn do_action(&self, name: &str, args: &UiActionArgs) -> anyhow::Result<ActionFlags> {
        match name {
            ACTION_DO => self.do_action_on_items(args).await,
            ACTION_TOGGLE => self.toggle_select(args).await,
            other => anyhow::bail!("std UI has no action '{}'", other),
        }
    }

    fn params(&self) -> Params {
        Params::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddu_core::{Context, DduOptions, UiOptions};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Host that reports a fixed cursor line, keeps a buffer table and
    /// records every call.
    struct CursorHost {
        line: i64,
        buffers: Mutex<HashMap<String, i64>>,
        next_bufnr: Mutex<i64>,
        calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl CursorHost {
        fn new(line: i64) -> Arc<Self> {
            Arc::new(Self {
                line,
                buffers: Mutex::new(HashMap::new()),
                next_bufnr: Mutex::new(7),
                calls: Mutex::new(Vec::new()),
            })
        }

        /// Drop every buffer, as `:bwipeout` would.
        fn wipe_buffers(&self) {
            self.buffers.lock().clear();
        }

        fn calls_to(&self, func: &str) -> Vec<Vec<Value>> {
            self.calls
                .lock()
                .iter()
                .filter(|(f, _)| f == func)
                .map(|(_, args)| args.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Host for CursorHost {
        async fn call(&self, func: &str, args: Vec<Value>) -> anyhow::Result<Value> {
            self.calls.lock().push((func.to_string(), args.clone()));
            let name = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(match func {
                "line" => json!(self.line),
                "bufexists" => json!(i64::from(self.buffers.lock().contains_key(name))),
                "bufnr" => json!(self.buffers.lock().get(name).copied().unwrap_or(-1)),
                "bufadd" => {
                    let mut next = self.next_bufnr.lock();
                    let bufnr = *next;
                    *next += 1;
                    self.buffers.lock().insert(name.to_string(), bufnr);
                    json!(bufnr)
                }
                "setbufvar" => {
                    let bufnr = args.first().and_then(Value::as_i64).unwrap_or(-1);
                    if !self.buffers.lock().values().any(|b| *b == bufnr) {
                        anyhow::bail!("E158: Invalid buffer name: {}", bufnr);
                    }
                    Value::Null
                }
                "win_findbuf" => json!([]),
                _ => Value::Null,
            })
        }

        async fn cmd(&self, _command: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn items(n: usize) -> Vec<DduItem> {
        (0..n)
            .map(|i| DduItem {
                word: format!("item{}", i),
                index: i,
                ..Default::default()
            })
            .collect()
    }

    fn action_args(host: Arc<CursorHost>) -> UiActionArgs {
        UiActionArgs {
            host,
            context: Context::default(),
            options: DduOptions::default(),
            ui_options: UiOptions::default(),
            ui_params: Params::new(),
            action_params: Value::Null,
        }
    }

    #[test]
    fn test_refresh_caps_items() {
        let ui = StdUi::new(1000);
        ui.refresh_items(items(1500));
        assert_eq!(ui.items().len(), 1000);
        assert_eq!(ui.items()[999].word, "item999");
    }

    #[tokio::test]
    async fn test_refresh_clears_marks() {
        let ui = StdUi::new(1000);
        ui.refresh_items(items(3));

        let flags = ui
            .do_action(ACTION_TOGGLE, &action_args(CursorHost::new(2)))
            .await
            .unwrap();
        assert_eq!(flags, ActionFlags::REDRAW);
        assert_eq!(ui.selected(), vec![1]);
        assert_eq!(ui.lines()[1], "*item1");

        ui.refresh_items(items(1500));
        assert!(ui.selected().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_twice_unmarks() {
        let ui = StdUi::new(10);
        ui.refresh_items(items(2));
        let host = CursorHost::new(1);
        ui.do_action(ACTION_TOGGLE, &action_args(host.clone())).await.unwrap();
        ui.do_action(ACTION_TOGGLE, &action_args(host)).await.unwrap();
        assert!(ui.selected().is_empty());
    }

    fn redraw_args(host: Arc<CursorHost>) -> UiRedrawArgs {
        UiRedrawArgs {
            host,
            context: Context::default(),
            options: DduOptions::default(),
            ui_options: UiOptions::default(),
            ui_params: Params::new(),
        }
    }

    #[tokio::test]
    async fn test_redraw_creates_buffer_once() {
        let ui = StdUi::new(10);
        ui.refresh_items(items(2));
        let host = CursorHost::new(1);
        let args = redraw_args(host.clone());

        ui.redraw(&args).await.unwrap();
        ui.redraw(&args).await.unwrap();

        assert_eq!(host.calls_to("bufadd"), vec![vec![json!("ddu-std-default")]]);
        let updates = host.calls_to("ddu#ui#std#update_buffer");
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1], vec![json!(7), json!([" item0", " item1"])]);
    }

    #[tokio::test]
    async fn test_redraw_recreates_wiped_buffer() {
        let ui = StdUi::new(10);
        ui.refresh_items(items(1));
        let host = CursorHost::new(1);
        let args = redraw_args(host.clone());

        ui.redraw(&args).await.unwrap();
        host.wipe_buffers();
        ui.redraw(&args).await.unwrap();

        assert_eq!(host.calls_to("bufadd").len(), 2);
        let updates = host.calls_to("ddu#ui#std#update_buffer");
        assert_eq!(updates[1][0], json!(8));
    }

    #[tokio::test]
    async fn test_do_action_sends_cursor_item() {
        let ui = StdUi::new(10);
        ui.refresh_items(items(3));
        let host = CursorHost::new(3);
        let mut args = action_args(host.clone());
        args.action_params = json!({"name": "open"});

        let flags = ui.do_action(ACTION_DO, &args).await.unwrap();
        assert_eq!(flags, ActionFlags::NONE);

        let calls = host.calls_to("ddu#item_action");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][1], json!("open"));
        assert_eq!(calls[0][2][0]["word"], json!("item2"));
        assert_eq!(calls[0][3], json!({}));
    }

    #[tokio::test]
    async fn test_unknown_action_fails() {
        let ui = StdUi::new(10);
        let result = ui.do_action("quit", &action_args(CursorHost::new(1))).await;
        assert!(result.is_err());
    }
}
