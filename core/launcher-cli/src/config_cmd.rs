//! `config`: print the effective configuration, optionally writing defaults.

use launcher_core::{read_config, save_config, LauncherConfig, StorageConfig};

pub fn run(storage: &StorageConfig, config: &LauncherConfig, init: bool) -> Result<(), String> {
    let path = storage.config_file();

    if init {
        if read_config(&path).map_err(String::from)?.is_some() {
            println!("Config already exists: {}", path.display());
        } else {
            save_config(storage, &LauncherConfig::default()).map_err(String::from)?;
            tracing::info!(path = %path.display(), "Wrote default configuration");
            println!("Wrote {}", path.display());
        }
    }

    let payload = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize configuration: {}", e))?;
    println!("# data dir: {}", storage.root().display());
    println!("# config:   {}", path.display());
    println!("{}", payload);
    Ok(())
}
