//! Kind contract: action tables for categories of items.

use std::sync::Arc;

use async_trait::async_trait;
use ddu_core::{ActionFlags, DduItem, DduOptions, Host, KindOptions, Params};
use serde_json::Value;

/// Arguments for an item action, whether served by a kind or a source.
#[derive(Clone)]
pub struct ActionArgs {
    pub host: Arc<dyn Host>,
    pub options: DduOptions,
    pub kind_options: KindOptions,
    pub kind_params: Params,
    pub action_params: Value,
    pub items: Vec<DduItem>,
}

#[async_trait]
pub trait Kind: Send + Sync {
    fn name(&self) -> &str;

    /// Names accepted by [`Kind::do_action`].
    fn action_names(&self) -> Vec<String>;

    async fn do_action(&self, name: &str, args: &ActionArgs) -> anyhow::Result<ActionFlags>;

    fn params(&self) -> Params {
        Params::new()
    }
}
