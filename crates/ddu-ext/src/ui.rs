//! UI contract.

use std::sync::Arc;

use async_trait::async_trait;
use ddu_core::{ActionFlags, Context, DduEvent, DduItem, DduOptions, Host, Params, UiOptions};
use serde_json::Value;

/// Arguments for [`Ui::redraw`].
#[derive(Clone)]
pub struct UiRedrawArgs {
    pub host: Arc<dyn Host>,
    pub context: Context,
    pub options: DduOptions,
    pub ui_options: UiOptions,
    pub ui_params: Params,
}

/// Arguments for [`Ui::do_action`].
#[derive(Clone)]
pub struct UiActionArgs {
    pub host: Arc<dyn Host>,
    pub context: Context,
    pub options: DduOptions,
    pub ui_options: UiOptions,
    pub ui_params: Params,
    pub action_params: Value,
}

/// A pluggable renderer of the session's item collection.
///
/// Methods take `&self`; implementations keep their own state behind a lock
/// and must not hold it across an `.await`. The engine never runs two
/// `redraw` calls of one session at the same time.
#[async_trait]
pub trait Ui: Send + Sync {
    fn name(&self) -> &str;

    /// Take the current collection. Marks from earlier collections must be
    /// dropped: indices no longer name the same items.
    fn refresh_items(&self, items: Vec<DduItem>);

    /// Render. Repeated calls with unchanged items must be harmless.
    async fn redraw(&self, args: &UiRedrawArgs) -> anyhow::Result<()>;

    /// Names accepted by [`Ui::do_action`].
    fn action_names(&self) -> Vec<String>;

    async fn do_action(&self, name: &str, args: &UiActionArgs) -> anyhow::Result<ActionFlags>;

    async fn on_event(&self, _host: Arc<dyn Host>, _event: &DduEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn params(&self) -> Params {
        Params::new()
    }
}
