//! Configuration display.

use ddu_core::config::IssueSeverity;
use ddu_core::{Config, ExtType};
use ddu_ext::ExtensionRegistry;

/// Show the configuration as loaded, before validation rejects anything.
pub fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("# Config file: {}", Config::config_dir().join("config.toml").display());
    println!("{}", config.to_toml()?);

    for line in extension_lines(&ExtensionRegistry::from_config(&config)) {
        println!("{}", line);
    }

    let result = config.validate();
    if result.issues.is_empty() {
        println!("# No issues found");
        return Ok(());
    }

    for issue in &result.issues {
        let label = match issue.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        println!("# {}: {}: {}", label, issue.field, issue.message);
    }
    Ok(())
}

/// One comment line per extension type naming the registered extensions.
fn extension_lines(registry: &ExtensionRegistry) -> Vec<String> {
    ExtType::ALL
        .iter()
        .map(|ext_type| format!("# {}: {}", ext_type, registry.list(*ext_type).join(", ")))
        .collect()
}
