use std::borrow::Cow;

use rust_embed::RustEmbed;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

pub const DEFAULT_CONFIG_ASSET: &str = "/assets/default_config.json";

/// Returns the bundled configuration tables as JSON text.
pub fn default_config_json() -> Option<String> {
    load_text(DEFAULT_CONFIG_ASSET)
}

fn load_text(path: &str) -> Option<String> {
    let asset = load_asset(path)?;
    String::from_utf8(asset.into_owned()).ok()
}

fn load_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    let canonical = canonical_asset_path(path);
    EmbeddedAssets::get(&canonical).map(|file| file.data)
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
