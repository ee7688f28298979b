//! Scriptable extensions shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ddu_core::{ActionFlags, DduItem, Item, NullHost, UserOptions};
use ddu_engine::Dispatcher;
use ddu_ext::{
    ActionArgs, ExtensionRegistry, GatherArgs, ItemStream, Kind, Source, Ui, UiActionArgs,
    UiRedrawArgs,
};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

pub type Log = Arc<Mutex<Vec<String>>>;

/// What the mock UI saw.
#[derive(Default)]
pub struct UiProbe {
    pub refreshes: Mutex<Vec<Vec<String>>>,
    redraws: AtomicUsize,
    in_redraw: AtomicBool,
    overlaps: AtomicUsize,
}

impl UiProbe {
    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn last_refresh(&self) -> Vec<String> {
        self.refreshes.lock().last().cloned().unwrap_or_default()
    }
}

pub struct MockUi {
    probe: Arc<UiProbe>,
}

#[async_trait]
impl Ui for MockUi {
    fn name(&self) -> &str {
        "mock"
    }

    fn refresh_items(&self, items: Vec<DduItem>) {
        self.probe.refreshes.lock().push(words(&items));
    }

    async fn redraw(&self, _args: &UiRedrawArgs) -> anyhow::Result<()> {
        if self.probe.in_redraw.swap(true, Ordering::SeqCst) {
            self.probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.probe.in_redraw.store(false, Ordering::SeqCst);
        self.probe.redraws.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn action_names(&self) -> Vec<String> {
        vec!["toggle".into(), "reload".into(), "noop".into()]
    }

    async fn do_action(&self, name: &str, _args: &UiActionArgs) -> anyhow::Result<ActionFlags> {
        Ok(match name {
            "toggle" => ActionFlags::REDRAW,
            "reload" => ActionFlags::REFRESH_ITEMS,
            _ => ActionFlags::NONE,
        })
    }
}

/// Source behavior, read from its params.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Script {
    /// Batches to yield, in order
    batches: Vec<Vec<String>>,
    /// Sleep before each batch
    delay_ms: u64,
    /// Yield an error after the batches
    fail: bool,
    /// Never finish after the batches
    hang: bool,
    kind: Option<String>,
}

pub struct ScriptSource {
    name: String,
    actions: Vec<String>,
    gathers: Arc<AtomicUsize>,
    log: Log,
}

#[async_trait]
impl Source for ScriptSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "file"
    }

    fn gather(&self, args: GatherArgs) -> ItemStream {
        self.gathers.fetch_add(1, Ordering::SeqCst);
        let script: Script =
            serde_json::from_value(Value::Object(args.source_params)).unwrap_or_default();

        let kind = script.kind;
        let batches: Vec<Vec<Item>> = script
            .batches
            .into_iter()
            .map(|batch| {
                batch
                    .into_iter()
                    .map(|word| {
                        let item = Item::new(word);
                        match &kind {
                            Some(kind) => item.with_kind(kind.clone()),
                            None => item,
                        }
                    })
                    .collect()
            })
            .collect();

        let delay = Duration::from_millis(script.delay_ms);
        let produced = stream::iter(batches).then(move |batch| async move {
            tokio::time::sleep(delay).await;
            Ok::<_, anyhow::Error>(batch)
        });

        let tail: ItemStream = if script.fail {
            stream::once(async { Err::<Vec<Item>, _>(anyhow::anyhow!("script failed")) }).boxed()
        } else if script.hang {
            stream::pending().boxed()
        } else {
            stream::empty().boxed()
        };

        produced.chain(tail).boxed()
    }

    fn action_names(&self) -> Vec<String> {
        self.actions.clone()
    }

    async fn do_action(&self, name: &str, args: &ActionArgs) -> anyhow::Result<ActionFlags> {
        self.log
            .lock()
            .push(format!("source:{}:{}:{}", self.name, name, words(&args.items).join(",")));
        Ok(ActionFlags::NONE)
    }
}

pub struct MockKind {
    name: String,
    actions: Vec<String>,
    log: Log,
}

#[async_trait]
impl Kind for MockKind {
    fn name(&self) -> &str {
        &self.name
    }

    fn action_names(&self) -> Vec<String> {
        self.actions.clone()
    }

    async fn do_action(&self, name: &str, args: &ActionArgs) -> anyhow::Result<ActionFlags> {
        if name == "delete" {
            anyhow::bail!("read-only");
        }
        self.log
            .lock()
            .push(format!("kind:{}:{}:{}", self.name, name, words(&args.items).join(",")));
        Ok(ActionFlags::NONE)
    }
}

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub ui: Arc<UiProbe>,
    pub gathers: Arc<AtomicUsize>,
    pub log: Log,
}

impl Harness {
    pub fn gathers(&self) -> usize {
        self.gathers.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

/// Dispatcher with the built-ins plus:
/// - `mock` UI
/// - `script` source (no actions) and `opener` source (action `open`)
/// - `file` kind (`open`, `delete`) and `dir` kind (`open`, `rename`)
pub fn harness() -> Harness {
    let ui = Arc::new(UiProbe::default());
    let gathers = Arc::new(AtomicUsize::new(0));
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut registry = ExtensionRegistry::with_builtins();
    {
        let ui = ui.clone();
        registry.register_ui("mock", move || Arc::new(MockUi { probe: ui.clone() }));
    }
    for (name, actions) in [("script", vec![]), ("opener", vec!["open"])] {
        let gathers = gathers.clone();
        let log = log.clone();
        registry.register_source(name, move || {
            Arc::new(ScriptSource {
                name: name.to_string(),
                actions: actions.iter().map(|a| a.to_string()).collect(),
                gathers: gathers.clone(),
                log: log.clone(),
            })
        });
    }
    for (name, actions) in [("file", ["open", "delete"]), ("dir", ["open", "rename"])] {
        let log = log.clone();
        registry.register_kind(name, move || {
            Arc::new(MockKind {
                name: name.to_string(),
                actions: actions.iter().map(|a| a.to_string()).collect(),
                log: log.clone(),
            })
        });
    }

    Harness {
        dispatcher: Arc::new(Dispatcher::new(Arc::new(NullHost), registry)),
        ui,
        gathers,
        log,
    }
}

pub fn opts(value: Value) -> UserOptions {
    value.as_object().cloned().expect("options must be an object")
}

pub fn words(items: &[DduItem]) -> Vec<String> {
    items.iter().map(|item| item.word.clone()).collect()
}

/// Poll `condition` until it holds, failing after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

/// Item handle as a UI would report it back.
pub fn at(index: usize) -> DduItem {
    DduItem {
        index,
        ..Default::default()
    }
}
