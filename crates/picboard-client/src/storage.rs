//! LocalStorage persistence for the sandbox configuration.

use picboard_core::SandboxConfig;

const CONFIG_KEY: &str = "picboard/config";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Stored configuration, or the default if it fails to parse. On first run
/// the default is written back so it can be edited in place.
pub fn load_config() -> SandboxConfig {
    let stored = local_storage().and_then(|storage| storage.get_item(CONFIG_KEY).ok().flatten());
    let Some(json) = stored else {
        let config = SandboxConfig::default();
        if !save_config(&config) {
            tracing::debug!("LocalStorage unavailable, config not saved");
        }
        return config;
    };
    match SandboxConfig::from_json(&json) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring stored config: {}", e);
            SandboxConfig::default()
        }
    }
}

/// Save the configuration to LocalStorage.
pub fn save_config(config: &SandboxConfig) -> bool {
    let Some(storage) = local_storage() else {
        return false;
    };
    let Ok(json) = config.to_json() else {
        return false;
    };
    storage.set_item(CONFIG_KEY, &json).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use picboard_core::ManipulatorMode;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_config_survives_storage() {
        let config = SandboxConfig {
            mode: ManipulatorMode::Move,
            ..SandboxConfig::default()
        };
        assert!(save_config(&config));
        assert_eq!(load_config(), config);

        if let Some(storage) = local_storage() {
            storage.set_item(CONFIG_KEY, "not json").unwrap();
            assert_eq!(load_config(), SandboxConfig::default());

            storage.remove_item(CONFIG_KEY).unwrap();
            assert_eq!(load_config(), SandboxConfig::default());
            assert!(storage.get_item(CONFIG_KEY).unwrap().is_some());
        }
    }
}
