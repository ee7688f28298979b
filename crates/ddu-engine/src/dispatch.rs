//! Host-facing dispatcher.
//!
//! [`Dispatcher`] is the single entry point the host calls into. Every
//! operation has a typed method; [`Dispatcher::dispatch`] additionally
//! accepts the method name and untyped arguments as they arrive from the
//! host and validates them before forwarding.

use std::str::FromStr;
use std::sync::Arc;

use ddu_core::options::ensure_object;
use ddu_core::{Config, DduEvent, DduItem, Error, ExtType, Host, Result, UserOptions};
use ddu_ext::{AliasTable, ExtensionRegistry};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::context::ContextBuilder;
use crate::ddu::Ddu;
use crate::stack::{Popped, SessionStacks};

/// Options for [`Dispatcher::redraw`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedrawOptions {
    /// New query string
    pub input: Option<String>,
    /// Re-gather instead of only redrawing
    pub refresh_items: bool,
    /// Patch for the session's effective options; implies a re-gather
    pub update_options: Option<UserOptions>,
}

pub struct Dispatcher {
    registry: Arc<ExtensionRegistry>,
    aliases: Arc<AliasTable>,
    builder: Mutex<ContextBuilder>,
    stacks: Mutex<SessionStacks>,
}

impl Dispatcher {
    pub fn new(host: Arc<dyn Host>, registry: ExtensionRegistry) -> Self {
        Self::with_builder(host, registry, ContextBuilder::new())
    }

    /// Dispatcher whose option layers start from process configuration.
    pub fn from_config(
        host: Arc<dyn Host>,
        registry: ExtensionRegistry,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self::with_builder(
            host,
            registry,
            ContextBuilder::from_config(config)?,
        ))
    }

    fn with_builder(
        host: Arc<dyn Host>,
        registry: ExtensionRegistry,
        builder: ContextBuilder,
    ) -> Self {
        let registry = Arc::new(registry);
        let aliases = Arc::new(AliasTable::new());
        let stacks = SessionStacks::new(host, registry.clone(), aliases.clone());
        Self {
            registry,
            aliases,
            builder: Mutex::new(builder),
            stacks: Mutex::new(stacks),
        }
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    // ------------------------------------------------------------------------
    // Option layers
    // ------------------------------------------------------------------------

    pub fn set_global(&self, options: UserOptions) -> Result<()> {
        self.builder.lock().set_global(options)
    }

    pub fn set_local(&self, name: &str, options: UserOptions) -> Result<()> {
        self.builder.lock().set_local(name, options)
    }

    pub fn patch_global(&self, options: &UserOptions) -> Result<()> {
        self.builder.lock().patch_global(options)
    }

    pub fn patch_local(&self, name: &str, options: &UserOptions) -> Result<()> {
        self.builder.lock().patch_local(name, options)
    }

    pub fn get_global(&self) -> UserOptions {
        self.builder.lock().global()
    }

    pub fn get_local(&self, name: &str) -> UserOptions {
        self.builder.lock().local(name)
    }

    pub fn get_default_options(&self) -> UserOptions {
        self.builder.lock().default_options()
    }

    pub fn alias(&self, ext_type: ExtType, alias: &str, base: &str) {
        self.aliases.register(ext_type, alias, base);
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    /// Top session of `name`, created on first access.
    pub fn session(&self, name: &str) -> Ddu {
        self.stacks.lock().get(name)
    }

    /// Number of sessions stacked under `name`.
    pub fn depth(&self, name: &str) -> usize {
        self.stacks.lock().depth(name)
    }

    /// Start a session and return it. With `push` set, a nested session is
    /// opened on top of the current one and inherits its user options.
    pub async fn start(&self, user_options: UserOptions) -> Result<Ddu> {
        let (_, options) = self.builder.lock().get(&user_options)?;

        let (ddu, user_options) = {
            let mut stacks = self.stacks.lock();
            if options.push {
                stacks.push(&options.name, &user_options)
            } else {
                (stacks.get(&options.name), user_options)
            }
        };

        // Inherited options can change anything, so resolve again
        let (context, options) = self.builder.lock().get(&user_options)?;
        let result = ddu.start(context, options, user_options).await;
        if let Err(Error::Internal(message)) = &result {
            warn!(error = %message, "Internal error, terminating session");
            ddu.quit();
        }
        result.map(|()| ddu)
    }

    /// Update the query or options of a running session and redraw it.
    ///
    /// The session re-gathers when it is volatile, when `refresh_items` is
    /// set, or when options were updated; otherwise it only refilters.
    pub async fn redraw(&self, name: &str, opts: RedrawOptions) -> Result<()> {
        let ddu = self.session(name);

        if let Some(input) = &opts.input {
            ddu.set_input(input);
        }
        if let Some(patch) = &opts.update_options {
            ddu.update_options(patch)?;
        }

        if ddu.options().volatile || opts.refresh_items || opts.update_options.is_some() {
            ddu.refresh().await
        } else {
            ddu.redraw().await
        }
    }

    /// Deliver a lifecycle event. `close` and `cancel` quit the session
    /// first.
    pub async fn event(&self, name: &str, event: DduEvent) -> Result<()> {
        let ddu = self.session(name);
        if event.is_terminal() {
            ddu.quit();
        }
        ddu.on_event(&event).await;
        Ok(())
    }

    /// Leave the top session of `name`.
    ///
    /// With a session below it, the top is terminated and the one below is
    /// resumed with a re-gather. The last session is terminated in place.
    pub async fn pop(&self, name: &str) -> Result<()> {
        let popped = self.stacks.lock().pop(name);
        match popped {
            Popped::Empty => Ok(()),
            Popped::Last(ddu) => {
                info!(name, "Closing last session");
                ddu.quit();
                ddu.on_event(&DduEvent::Cancel).await;
                Ok(())
            }
            Popped::Resume { removed, top } => {
                removed.quit();
                removed.on_event(&DduEvent::Cancel).await;

                let mut user_options = UserOptions::new();
                user_options.insert("name".into(), json!(name));
                user_options.insert("refresh".into(), json!(true));
                user_options.insert("resume".into(), json!(true));

                info!(name, "Resuming previous session");
                let (context, options) = self.builder.lock().get(&user_options)?;
                top.start(context, options, user_options).await
            }
        }
    }

    pub async fn ui_action(&self, name: &str, action: &str, params: Value) -> Result<()> {
        self.session(name).ui_action(action, params).await
    }

    pub async fn item_action(
        &self,
        name: &str,
        action: &str,
        items: Vec<DduItem>,
        params: Value,
    ) -> Result<()> {
        self.session(name).item_action(action, items, params).await
    }

    pub async fn get_item_actions(&self, name: &str, items: Vec<DduItem>) -> Result<Vec<String>> {
        self.session(name).get_item_actions(items).await
    }

    // ------------------------------------------------------------------------
    // Untyped entry point
    // ------------------------------------------------------------------------

    /// Run a host request given by method name and positional arguments.
    ///
    /// Argument order follows the host's calling convention, e.g.
    /// `setLocal(options, name)`. Missing trailing arguments are null;
    /// a null where options are expected means no options.
    pub async fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        debug!(method, args = args.len(), "Dispatching");
        let mut args = args.into_iter();
        let mut next = move || args.next().unwrap_or(Value::Null);

        match method {
            "setGlobal" => {
                self.set_global(ensure_object(next(), "options")?)?;
                Ok(Value::Null)
            }
            "setLocal" => {
                let options = ensure_object(next(), "options")?;
                self.set_local(&ensure_string(next(), "name")?, options)?;
                Ok(Value::Null)
            }
            "patchGlobal" => {
                self.patch_global(&ensure_object(next(), "options")?)?;
                Ok(Value::Null)
            }
            "patchLocal" => {
                let options = ensure_object(next(), "options")?;
                self.patch_local(&ensure_string(next(), "name")?, &options)?;
                Ok(Value::Null)
            }
            "getGlobal" => Ok(Value::Object(self.get_global())),
            "getLocal" => Ok(Value::Object(
                self.get_local(&ensure_string(next(), "name")?),
            )),
            "getDefaultOptions" => Ok(Value::Object(self.get_default_options())),
            "alias" => {
                let ext_type = ensure_string(next(), "extType")?;
                let ext_type = ExtType::from_str(&ext_type).map_err(Error::InvalidOptions)?;
                let alias = ensure_string(next(), "alias")?;
                let base = ensure_string(next(), "base")?;
                self.alias(ext_type, &alias, &base);
                Ok(Value::Null)
            }
            "start" => {
                self.start(ensure_object(next(), "options")?).await?;
                Ok(Value::Null)
            }
            "redraw" => {
                let name = ensure_string(next(), "name")?;
                let opts = ensure_object(next(), "redraw options")?;
                let opts: RedrawOptions = serde_json::from_value(Value::Object(opts))
                    .map_err(|e| Error::InvalidOptions(e.to_string()))?;
                self.redraw(&name, opts).await?;
                Ok(Value::Null)
            }
            "event" => {
                let name = ensure_string(next(), "name")?;
                let event = DduEvent::from(ensure_string(next(), "event")?);
                self.event(&name, event).await?;
                Ok(Value::Null)
            }
            "pop" => {
                self.pop(&ensure_string(next(), "name")?).await?;
                Ok(Value::Null)
            }
            "uiAction" => {
                let name = ensure_string(next(), "name")?;
                let action = ensure_string(next(), "action")?;
                let params = Value::Object(ensure_object(next(), "params")?);
                self.ui_action(&name, &action, params).await?;
                Ok(Value::Null)
            }
            "itemAction" => {
                let name = ensure_string(next(), "name")?;
                let action = ensure_string(next(), "action")?;
                let items = ensure_items(next())?;
                let params = Value::Object(ensure_object(next(), "params")?);
                self.item_action(&name, &action, items, params).await?;
                Ok(Value::Null)
            }
            "getItemActions" => {
                let name = ensure_string(next(), "name")?;
                let items = ensure_items(next())?;
                Ok(json!(self.get_item_actions(&name, items).await?))
            }
            other => Err(Error::InvalidOptions(format!("unknown method '{}'", other))),
        }
    }
}

fn ensure_string(value: Value, what: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(Error::InvalidOptions(format!(
            "{} must be a string, got {}",
            what, other
        ))),
    }
}

fn ensure_items(value: Value) -> Result<Vec<DduItem>> {
    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| Error::InvalidOptions(format!("invalid items: {}", e))),
        other => Err(Error::InvalidOptions(format!(
            "items must be a list, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddu_core::NullHost;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(NullHost), ExtensionRegistry::with_builtins())
    }

    #[tokio::test]
    async fn test_layer_methods() {
        let d = dispatcher();
        d.dispatch("setGlobal", vec![json!({"ui": "std"})]).await.unwrap();
        d.dispatch("patchLocal", vec![json!({"input": "x"}), json!("files")])
            .await
            .unwrap();

        assert_eq!(
            d.dispatch("getGlobal", vec![]).await.unwrap(),
            json!({"ui": "std"})
        );
        assert_eq!(
            d.dispatch("getLocal", vec![json!("files")]).await.unwrap(),
            json!({"input": "x"})
        );
        let defaults = d.dispatch("getDefaultOptions", vec![]).await.unwrap();
        assert_eq!(defaults["name"], json!("default"));
    }

    #[tokio::test]
    async fn test_argument_validation() {
        let d = dispatcher();
        assert!(matches!(
            d.dispatch("setGlobal", vec![json!([1, 2])]).await,
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            d.dispatch("pop", vec![json!(3)]).await,
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            d.dispatch("alias", vec![json!("widget"), json!("a"), json!("b")]).await,
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            d.dispatch("itemAction", vec![json!("x"), json!("open"), json!({}), json!({})]).await,
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            d.dispatch("frobnicate", vec![]).await,
            Err(Error::InvalidOptions(_))
        ));
    }

    #[tokio::test]
    async fn test_null_options_are_empty() {
        let d = dispatcher();
        d.dispatch("setGlobal", vec![Value::Null]).await.unwrap();
        assert_eq!(d.get_global(), UserOptions::new());
    }

    #[tokio::test]
    async fn test_alias_dispatch() {
        let d = dispatcher();
        d.dispatch("alias", vec![json!("filter"), json!("fuzzy"), json!("matcher_substring")])
            .await
            .unwrap();
        assert_eq!(
            d.aliases().get(ExtType::Filter, "fuzzy").as_deref(),
            Some("matcher_substring")
        );
    }

    #[tokio::test]
    async fn test_pop_without_sessions() {
        let d = dispatcher();
        d.pop("nothing").await.unwrap();
        assert_eq!(d.depth("nothing"), 0);
    }
}
