//! Source contract.

use std::sync::Arc;

use async_trait::async_trait;
use ddu_core::{ActionFlags, Context, DduEvent, DduOptions, Host, Item, Params, SourceOptions};
use futures::stream::BoxStream;

use crate::kind::ActionArgs;

/// Lazy sequence of item batches produced by one gather call.
///
/// Single pass: a new call to [`Source::gather`] is needed to gather again.
/// Batch boundaries carry no meaning beyond scheduling.
pub type ItemStream = BoxStream<'static, anyhow::Result<Vec<Item>>>;

/// Arguments for [`Source::on_init`].
#[derive(Clone)]
pub struct SourceInitArgs {
    pub host: Arc<dyn Host>,
    pub source_options: SourceOptions,
    pub source_params: Params,
}

/// Arguments for [`Source::on_event`].
#[derive(Clone)]
pub struct SourceEventArgs {
    pub host: Arc<dyn Host>,
    pub source_options: SourceOptions,
    pub source_params: Params,
    pub event: DduEvent,
}

/// Arguments for [`Source::gather`]. Owned, since the returned stream
/// outlives the call.
#[derive(Clone)]
pub struct GatherArgs {
    pub host: Arc<dyn Host>,
    pub context: Context,
    pub options: DduOptions,
    pub source_options: SourceOptions,
    pub source_params: Params,
    pub input: String,
}

/// A pluggable producer of candidate items.
#[async_trait]
pub trait Source: Send + Sync {
    /// Implementation name.
    fn name(&self) -> &str;

    /// Kind assigned to items that do not name one.
    fn kind(&self) -> &str {
        "base"
    }

    /// One-time setup before the first gather of this instance.
    async fn on_init(&self, _args: &SourceInitArgs) -> anyhow::Result<()> {
        Ok(())
    }

    /// Session lifecycle notification. Must accept events it does not use.
    async fn on_event(&self, _args: &SourceEventArgs) -> anyhow::Result<()> {
        Ok(())
    }

    /// Start producing items for `args.input`.
    fn gather(&self, args: GatherArgs) -> ItemStream;

    /// Default parameter values.
    fn params(&self) -> Params {
        Params::new()
    }

    /// Actions this source adds on top of its items' kinds.
    fn action_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run one of [`Source::action_names`].
    async fn do_action(&self, name: &str, _args: &ActionArgs) -> anyhow::Result<ActionFlags> {
        anyhow::bail!("source '{}' has no action '{}'", self.name(), name)
    }
}
