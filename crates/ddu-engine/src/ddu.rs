//! Session engine.
//!
//! A [`Ddu`] owns one item collection. It drives its sources concurrently,
//! pipes every arriving batch through the filters, and hands the result to
//! its UI.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──► Gathering ──all sources done──► Ready
//!                     ▲                             │
//!                     └─────────refresh─────────────┘
//! any ──quit──► Quitting ──close/cancel event──► Terminated
//! ```
//!
//! Once quitting, batches still in flight are dropped and nothing reaches
//! the UI again.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ddu_core::options::merge_options;
use ddu_core::{
    ActionFlags, Context, DduEvent, DduItem, DduOptions, Error, ExtType, Host, Item,
    KindOptions, Params, Result, SourceOptions, UserOptions,
};
use ddu_ext::{
    ActionArgs, AliasTable, ExtensionRegistry, GatherArgs, Kind, Source, SourceEventArgs,
    SourceInitArgs, Ui, UiActionArgs, UiRedrawArgs,
};
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pipeline::{build_collection, FilterSet, SourceBatch};

// ============================================================================
// State
// ============================================================================

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, never started
    Idle,
    /// At least one source is still producing
    Gathering,
    /// Every source finished its current pass
    Ready,
    /// Quit requested; waiting for the terminal event
    Quitting,
    /// Closed or cancelled; the session is never drawn again
    Terminated,
}

impl SessionStatus {
    pub fn is_quitted(self) -> bool {
        matches!(self, SessionStatus::Quitting | SessionStatus::Terminated)
    }
}

#[derive(Clone)]
struct LoadedUi {
    name: String,
    ui: Arc<dyn Ui>,
}

/// One declared source for the current pass, with its raw stamped items.
struct SourceEntry {
    name: String,
    source: Arc<dyn Source>,
    options: SourceOptions,
    params: Params,
    items: Vec<DduItem>,
}

struct State {
    status: SessionStatus,
    /// Bumped on every gather pass; batches of older passes are dropped
    generation: u64,
    /// Cancelled when a newer pass starts or the session quits
    pass: CancellationToken,
    options: DduOptions,
    user_options: UserOptions,
    context: Context,
    ui: Option<LoadedUi>,
    sources: Vec<SourceEntry>,
    source_cache: HashMap<String, Arc<dyn Source>>,
    filters: FilterSet,
    kinds: HashMap<String, Arc<dyn Kind>>,
    /// Collection last handed to the UI
    items: Vec<DduItem>,
}

struct Inner {
    host: Arc<dyn Host>,
    registry: Arc<ExtensionRegistry>,
    aliases: Arc<AliasTable>,
    state: Mutex<State>,
    /// Serializes collection updates with UI redraws
    redraw_gate: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

/// A picker session. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Ddu {
    inner: Arc<Inner>,
}

// ============================================================================
// Session
// ============================================================================

impl Ddu {
    pub fn new(
        host: Arc<dyn Host>,
        registry: Arc<ExtensionRegistry>,
        aliases: Arc<AliasTable>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let state = State {
            status: SessionStatus::Idle,
            generation: 0,
            pass: cancel.child_token(),
            options: DduOptions::default(),
            user_options: UserOptions::new(),
            context: Context::default(),
            ui: None,
            sources: Vec::new(),
            source_cache: HashMap::new(),
            filters: FilterSet::new(),
            kinds: HashMap::new(),
            items: Vec::new(),
        };

        Self {
            inner: Arc::new(Inner {
                host,
                registry,
                aliases,
                state: Mutex::new(state),
                redraw_gate: tokio::sync::Mutex::new(()),
                cancel,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock()
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status
    }

    pub fn is_quitted(&self) -> bool {
        self.status().is_quitted()
    }

    pub fn options(&self) -> DduOptions {
        self.state().options.clone()
    }

    /// Copy of the user options recorded by the last start.
    pub fn user_options(&self) -> UserOptions {
        self.state().user_options.clone()
    }

    pub fn context(&self) -> Context {
        self.state().context.clone()
    }

    /// Collection last handed to the UI.
    pub fn items(&self) -> Vec<DduItem> {
        self.state().items.clone()
    }

    /// Whether both handles refer to the same session.
    pub fn same_session(&self, other: &Ddu) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn ui(&self) -> Option<Arc<dyn Ui>> {
        self.state().ui.as_ref().map(|loaded| loaded.ui.clone())
    }

    /// Start, or resume, the session.
    ///
    /// A resume of an already started session patches its options with
    /// `user_options` and redraws, or re-gathers when `options.refresh` is
    /// set. Anything else loads the UI and sources and gathers from scratch.
    /// Returns once every source has finished or the session quit.
    pub async fn start(
        &self,
        context: Context,
        options: DduOptions,
        user_options: UserOptions,
    ) -> Result<()> {
        let resume = {
            let state = self.state();
            if state.status.is_quitted() {
                return Err(Error::SessionTerminated(state.options.name.clone()));
            }
            options.resume && state.status != SessionStatus::Idle
        };

        if resume {
            {
                let mut state = self.state();
                merge_options(&mut state.user_options, &user_options);
                state.options.patch(&user_options)?;
                state.context.input = state.options.input.clone();
            }
            info!(name = %options.name, refresh = options.refresh, "Resuming session");
            return if options.refresh {
                self.refresh().await
            } else {
                self.redraw().await
            };
        }

        info!(name = %options.name, sources = options.sources.len(), "Starting session");
        let ui = self.load_ui(&options)?;
        let sources = self.prepare_sources(&options).await?;

        {
            let mut state = self.state();
            if state.status.is_quitted() {
                return Err(Error::SessionTerminated(options.name));
            }
            state.options = options;
            state.user_options = user_options;
            state.context = context;
            state.ui = Some(ui);
            state.sources = sources;
            state.items.clear();
        }
        self.load_filters();
        self.gather().await
    }

    /// Re-gather every source with the current options.
    pub async fn refresh(&self) -> Result<()> {
        let options = {
            let state = self.state();
            if state.status.is_quitted() || state.status == SessionStatus::Idle {
                debug!(status = ?state.status, "Ignoring refresh");
                return Ok(());
            }
            state.options.clone()
        };

        let sources = self.prepare_sources(&options).await?;
        self.state().sources = sources;
        self.load_filters();
        self.gather().await
    }

    /// Re-run the filters over the gathered items and redraw, without
    /// gathering again.
    pub async fn redraw(&self) -> Result<()> {
        self.render(None, true).await
    }

    pub fn set_input(&self, input: &str) {
        let mut state = self.state();
        state.options.input = input.to_string();
        state.context.input = input.to_string();
    }

    /// Patch the effective options. Takes effect on the next refresh.
    pub fn update_options(&self, patch: &UserOptions) -> Result<()> {
        let mut state = self.state();
        state.options.patch(patch)?;
        state.context.input = state.options.input.clone();
        Ok(())
    }

    /// Run a UI-level action.
    ///
    /// The redraw gate is not held while the UI runs, so the action may
    /// call back into the session.
    pub async fn ui_action(&self, name: &str, params: Value) -> Result<()> {
        let loaded = {
            let state = self.state();
            if state.status.is_quitted() {
                return Err(Error::SessionTerminated(state.options.name.clone()));
            }
            self.ui_context(&state)?
        };
        let Some((ui, redraw_args)) = loaded else {
            return Err(Error::no_such_action(name));
        };

        if !ui.ui.action_names().iter().any(|action| action == name) {
            return Err(Error::no_such_action(name));
        }

        let args = UiActionArgs {
            host: redraw_args.host,
            context: redraw_args.context,
            options: redraw_args.options,
            ui_options: redraw_args.ui_options,
            ui_params: redraw_args.ui_params,
            action_params: params,
        };

        debug!(ui = %ui.name, action = name, "Running UI action");
        let flags = ui
            .ui
            .do_action(name, &args)
            .await
            .map_err(|e| Error::extension(ExtType::Ui, &ui.name, e))?;
        self.handle_flags(flags).await
    }

    /// Run an item action on `items`.
    ///
    /// Items are resolved by index against the collection last handed to
    /// the UI. The first item's source and kind decide how `name` resolves:
    /// `default` maps to the source's, then the kind's, `defaultAction`, and
    /// `actions` tables in source then kind options rename it. Source
    /// actions win over kind actions of the same name.
    pub async fn item_action(&self, name: &str, items: Vec<DduItem>, params: Value) -> Result<()> {
        let (items, options, source) = {
            let state = self.state();
            if state.status.is_quitted() {
                return Err(Error::SessionTerminated(state.options.name.clone()));
            }
            let items = resolve_items(&state, items);
            let Some(first) = items.first() else {
                debug!(action = name, "No items to act on");
                return Ok(());
            };
            let source = state
                .sources
                .get(first.source_index)
                .map(|entry| (entry.source.clone(), entry.options.clone()));
            (items, state.options.clone(), source)
        };

        let kind_name = items[0].kind.clone();
        let kind = self.load_kind(&kind_name)?;
        let kind_options = options.kind_options(&kind_name)?;
        let source_options = source
            .as_ref()
            .map(|(_, source_options)| source_options.clone())
            .unwrap_or_default();
        let action = resolve_action_name(name, &source_options, &kind_options)?;

        let args = ActionArgs {
            host: self.inner.host.clone(),
            kind_params: options.kind_params(&kind_name, kind.params()),
            options,
            kind_options,
            action_params: params,
            items,
        };

        debug!(action = %action, kind = %kind_name, items = args.items.len(), "Running item action");
        let flags = match source {
            Some((source, _)) if source.action_names().contains(&action) => source
                .do_action(&action, &args)
                .await
                .map_err(|e| Error::extension(ExtType::Source, source.name(), e))?,
            _ if kind.action_names().contains(&action) => kind
                .do_action(&action, &args)
                .await
                .map_err(|e| Error::extension(ExtType::Kind, &kind_name, e))?,
            _ => return Err(Error::no_such_action(name)),
        };
        self.handle_flags(flags).await
    }

    /// Action names every one of `items` supports, sorted.
    pub async fn get_item_actions(&self, items: Vec<DduItem>) -> Result<Vec<String>> {
        let resolved: Vec<(DduItem, Option<Arc<dyn Source>>)> = {
            let state = self.state();
            resolve_items(&state, items)
                .into_iter()
                .map(|item| {
                    let source = state
                        .sources
                        .get(item.source_index)
                        .map(|entry| entry.source.clone());
                    (item, source)
                })
                .collect()
        };

        let mut common: Option<BTreeSet<String>> = None;
        for (item, source) in resolved {
            let kind = self.load_kind(&item.kind)?;
            let mut names: BTreeSet<String> = kind.action_names().into_iter().collect();
            if let Some(source) = source {
                names.extend(source.action_names());
            }
            common = Some(match common {
                None => names,
                Some(common) => common.intersection(&names).cloned().collect(),
            });
        }

        Ok(common.unwrap_or_default().into_iter().collect())
    }

    /// Forward a lifecycle event to every source and the UI.
    ///
    /// A terminal event finishes a quitting session.
    pub async fn on_event(&self, event: &DduEvent) {
        let (sources, ui) = {
            let state = self.state();
            let sources: Vec<_> = state
                .sources
                .iter()
                .map(|entry| {
                    (
                        entry.name.clone(),
                        entry.source.clone(),
                        entry.options.clone(),
                        entry.params.clone(),
                    )
                })
                .collect();
            (sources, state.ui.clone())
        };

        for (name, source, source_options, source_params) in sources {
            let args = SourceEventArgs {
                host: self.inner.host.clone(),
                source_options,
                source_params,
                event: event.clone(),
            };
            if let Err(e) = source.on_event(&args).await {
                warn!(source = %name, event = event.as_str(), error = %format!("{:#}", e), "Source event handler failed");
            }
        }

        if let Some(ui) = ui {
            if let Err(e) = ui.ui.on_event(self.inner.host.clone(), event).await {
                warn!(ui = %ui.name, event = event.as_str(), error = %format!("{:#}", e), "UI event handler failed");
            }
        }

        if event.is_terminal() {
            let mut state = self.state();
            if state.status == SessionStatus::Quitting {
                state.status = SessionStatus::Terminated;
                info!(name = %state.options.name, event = event.as_str(), "Session terminated");
            }
        }
    }

    /// Stop the session. In-flight gathering stops at its next batch and
    /// the UI is not drawn again.
    pub fn quit(&self) {
        {
            let mut state = self.state();
            if !state.status.is_quitted() {
                state.status = SessionStatus::Quitting;
                info!(name = %state.options.name, "Quitting session");
            }
        }
        self.inner.cancel.cancel();
    }

    // ========================================================================
    // Loading
    // ========================================================================

    fn load_ui(&self, options: &DduOptions) -> Result<LoadedUi> {
        if options.ui.is_empty() {
            return Err(Error::InvalidOptions("no UI is configured".into()));
        }

        let cached = self.state().ui.clone();
        if let Some(loaded) = cached.filter(|loaded| loaded.name == options.ui) {
            return Ok(loaded);
        }

        let ui = self.inner.registry.load_ui(&self.inner.aliases, &options.ui)?;
        Ok(LoadedUi {
            name: options.ui.clone(),
            ui,
        })
    }

    /// Resolve the declared sources, instantiating and initializing the
    /// ones this session has not seen yet.
    async fn prepare_sources(&self, options: &DduOptions) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::with_capacity(options.sources.len());

        for user_source in &options.sources {
            let name = user_source.name();
            let cached = self.state().source_cache.get(name).cloned();
            let (source, fresh) = match cached {
                Some(source) => (source, false),
                None => (
                    self.inner
                        .registry
                        .load_source(&self.inner.aliases, name)?,
                    true,
                ),
            };

            let source_options = options.source_options(user_source)?;
            let source_params = options.source_params(user_source, source.params());

            if fresh {
                let args = SourceInitArgs {
                    host: self.inner.host.clone(),
                    source_options: source_options.clone(),
                    source_params: source_params.clone(),
                };
                if let Err(e) = source.on_init(&args).await {
                    warn!(source = %name, error = %format!("{:#}", e), "Source initialization failed");
                }
                self.state()
                    .source_cache
                    .insert(name.to_string(), source.clone());
            }

            entries.push(SourceEntry {
                name: name.to_string(),
                source,
                options: source_options,
                params: source_params,
                items: Vec::new(),
            });
        }

        Ok(entries)
    }

    /// Load every filter the current sources name. Unknown names are
    /// reported once per pass and skipped by the pipeline.
    fn load_filters(&self) {
        let mut state = self.state();
        let names: Vec<String> = state
            .sources
            .iter()
            .flat_map(|entry| {
                entry
                    .options
                    .converters
                    .iter()
                    .chain(&entry.options.matchers)
                    .chain(&entry.options.sorters)
                    .cloned()
            })
            .collect();

        for name in names {
            if state.filters.contains_key(&name) {
                continue;
            }
            match self.inner.registry.load_filter(&self.inner.aliases, &name) {
                Ok(filter) => {
                    state.filters.insert(name, filter);
                }
                Err(e) => warn!(filter = %name, error = %e, "Filter not loaded, skipping"),
            }
        }
    }

    fn load_kind(&self, name: &str) -> Result<Arc<dyn Kind>> {
        let cached = self.state().kinds.get(name).cloned();
        if let Some(kind) = cached {
            return Ok(kind);
        }

        let kind = self.inner.registry.load_kind(&self.inner.aliases, name)?;
        self.state().kinds.insert(name.to_string(), kind.clone());
        Ok(kind)
    }

    // ========================================================================
    // Gathering
    // ========================================================================

    /// One gather pass over all sources.
    ///
    /// Sources run concurrently; whichever yields first is merged first.
    /// The collection itself is always rebuilt in declaration order.
    async fn gather(&self) -> Result<()> {
        let (generation, pass, streams) = {
            let mut guard = self.state();
            let state = &mut *guard;
            if state.status.is_quitted() {
                return Ok(());
            }

            state.pass.cancel();
            state.pass = self.inner.cancel.child_token();
            state.generation += 1;
            state.status = SessionStatus::Gathering;
            state.context.input = state.options.input.clone();
            state.context.done = false;
            state.context.max_items = 0;

            let mut streams = Vec::with_capacity(state.sources.len());
            for (idx, entry) in state.sources.iter_mut().enumerate() {
                entry.items.clear();
                let args = GatherArgs {
                    host: self.inner.host.clone(),
                    context: state.context.clone(),
                    options: state.options.clone(),
                    source_options: entry.options.clone(),
                    source_params: entry.params.clone(),
                    input: state.options.input.clone(),
                };
                streams.push(entry.source.gather(args).map(move |batch| (idx, batch)).boxed());
            }
            (state.generation, state.pass.clone(), streams)
        };

        debug!(generation, sources = streams.len(), "Gathering");
        let mut batches = stream::select_all(streams);
        loop {
            let next = tokio::select! {
                _ = pass.cancelled() => None,
                next = batches.next() => next,
            };
            let Some((idx, batch)) = next else { break };

            if !self.is_current(generation) {
                break;
            }
            match batch {
                Ok(items) => {
                    self.append(generation, idx, items);
                    self.render_pass(generation).await;
                }
                Err(e) => {
                    let name = self.source_name(idx);
                    warn!(source = %name, error = %format!("{:#}", e), "Source failed");
                }
            }
        }

        if !self.is_current(generation) {
            debug!(generation, "Dropped a superseded pass");
            return Ok(());
        }

        {
            let mut state = self.state();
            state.status = SessionStatus::Ready;
            state.context.done = true;
        }
        self.render_pass(generation).await;
        debug!(generation, items = self.state().items.len(), "Gather finished");
        Ok(())
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state();
        !self.inner.cancel.is_cancelled()
            && !state.status.is_quitted()
            && state.generation == generation
    }

    fn source_name(&self, idx: usize) -> String {
        self.state()
            .sources
            .get(idx)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }

    fn append(&self, generation: u64, idx: usize, batch: Vec<Item>) {
        let mut guard = self.state();
        let state = &mut *guard;
        if state.generation != generation {
            return;
        }

        if let Some(entry) = state.sources.get_mut(idx) {
            let kind = entry.source.kind().to_string();
            let stamped: Vec<DduItem> = batch
                .into_iter()
                .map(|item| {
                    DduItem::from_item(item, &entry.name, idx, &kind, &entry.options.matcher_key)
                })
                .collect();
            entry.items.extend(stamped);
        }
        state.context.max_items = state.sources.iter().map(|entry| entry.items.len()).sum();
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    async fn render_pass(&self, generation: u64) {
        if let Err(e) = self.render(Some(generation), true).await {
            warn!(generation, error = %e, "Redraw failed");
        }
    }

    /// Push the collection to the UI and redraw it.
    ///
    /// With `refilter` the collection is rebuilt from the raw source
    /// buffers first. A `generation` that is no longer current makes this
    /// a no-op, as does a quitted session.
    async fn render(&self, generation: Option<u64>, refilter: bool) -> Result<()> {
        let _gate = self.inner.redraw_gate.lock().await;

        let (collection, loaded) = {
            let mut guard = self.state();
            let state = &mut *guard;
            if state.status.is_quitted() || generation.is_some_and(|g| g != state.generation) {
                return Ok(());
            }

            let collection = if refilter {
                let batches: Vec<SourceBatch<'_>> = state
                    .sources
                    .iter()
                    .map(|entry| SourceBatch {
                        source_options: &entry.options,
                        items: &entry.items,
                    })
                    .collect();
                let collection =
                    build_collection(&state.filters, &state.context, &state.options, &batches);
                state.items = collection.clone();
                Some(collection)
            } else {
                None
            };
            (collection, self.ui_context(state)?)
        };

        let Some((ui, args)) = loaded else {
            return Ok(());
        };
        if let Some(collection) = collection {
            ui.ui.refresh_items(collection);
        }
        ui.ui
            .redraw(&args)
            .await
            .map_err(|e| Error::extension(ExtType::Ui, &ui.name, e))
    }

    fn ui_context(&self, state: &State) -> Result<Option<(LoadedUi, UiRedrawArgs)>> {
        let Some(ui) = state.ui.clone() else {
            return Ok(None);
        };
        let args = UiRedrawArgs {
            host: self.inner.host.clone(),
            context: state.context.clone(),
            options: state.options.clone(),
            ui_options: state.options.ui_options(&ui.name)?,
            ui_params: state.options.ui_params(&ui.name, ui.ui.params()),
        };
        Ok(Some((ui, args)))
    }

    async fn handle_flags(&self, flags: ActionFlags) -> Result<()> {
        if flags.contains(ActionFlags::REFRESH_ITEMS) {
            self.refresh().await
        } else if flags.contains(ActionFlags::REDRAW) {
            self.render(None, false).await
        } else {
            Ok(())
        }
    }
}

/// Map reported items onto the live collection by index. Indices past the
/// end of the collection are stale and dropped.
fn resolve_items(state: &State, items: Vec<DduItem>) -> Vec<DduItem> {
    items
        .into_iter()
        .filter_map(|item| match state.items.get(item.index) {
            Some(live) => Some(live.clone()),
            None => {
                debug!(index = item.index, "Dropping stale item");
                None
            }
        })
        .collect()
}

fn resolve_action_name(
    name: &str,
    source_options: &SourceOptions,
    kind_options: &KindOptions,
) -> Result<String> {
    let name = if name == "default" {
        [&source_options.default_action, &kind_options.default_action]
            .into_iter()
            .find(|action| !action.is_empty())
            .cloned()
            .ok_or(Error::NoDefaultAction)?
    } else {
        name.to_string()
    };

    Ok(source_options
        .actions
        .get(&name)
        .or_else(|| kind_options.actions.get(&name))
        .cloned()
        .unwrap_or(name))
}
