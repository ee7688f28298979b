//! Print the default options.

use ddu_core::Config;
use ddu_engine::ContextBuilder;
use serde_json::Value;

pub fn run(config: &Config) -> anyhow::Result<()> {
    let builder = ContextBuilder::from_config(config)?;
    let defaults = Value::Object(builder.default_options());
    println!("{}", serde_json::to_string_pretty(&defaults)?);
    Ok(())
}
