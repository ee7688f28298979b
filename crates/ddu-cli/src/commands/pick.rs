//! One-shot picking from a file.

use std::sync::Arc;

use ddu_core::{Config, UserOptions};
use ddu_engine::Dispatcher;
use ddu_ext::ExtensionRegistry;
use serde_json::{json, Value};
use tracing::info;

use crate::host::TerminalHost;
use crate::PickArgs;

pub async fn run(args: &PickArgs, config: &Config) -> anyhow::Result<()> {
    for line in pick(args, config).await? {
        println!("{}", line);
    }
    Ok(())
}

/// Gather the file through the `lines` source and the `std` UI, and return
/// the final buffer lines, or one JSON item per line with `--json`.
pub async fn pick(args: &PickArgs, config: &Config) -> anyhow::Result<Vec<String>> {
    let host = Arc::new(TerminalHost::new());
    let dispatcher = Dispatcher::from_config(
        host.clone(),
        ExtensionRegistry::from_config(config),
        config,
    )?;

    let options = start_options(args);
    info!(path = %args.path.display(), input = %args.input, "Picking");
    let session = dispatcher.start(options).await?;

    if args.json {
        return session
            .items()
            .iter()
            .map(|item| serde_json::to_string(item).map_err(Into::into))
            .collect();
    }

    Ok(host.buffer())
}

fn start_options(args: &PickArgs) -> UserOptions {
    let options = json!({
        "ui": "std",
        "input": args.input,
        "sources": [{
            "name": "lines",
            "params": {"path": args.path.to_string_lossy()},
        }],
        "sourceOptions": {
            "lines": {
                "matchers": args.matchers,
                "sorters": args.sorters,
            },
        },
    });

    match options {
        Value::Object(map) => map,
        _ => UserOptions::new(),
    }
}
