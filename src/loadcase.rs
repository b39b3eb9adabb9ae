use crate::error::InputError;
use crate::network::NetworkDescription;
use std::fs;
use std::path::Path;

/// Reads a TOML network description. A missing `name` defaults to the file
/// stem.
pub fn load_network(path: &Path) -> Result<NetworkDescription, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut net = parse_network(&text, &path.display().to_string())?;
    if net.name.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            net.name = stem.to_string();
        }
    }
    log::debug!("loaded network description from {}", path.display());
    Ok(net)
}

/// Parses a TOML network description; `origin` names the source in errors.
pub fn parse_network(text: &str, origin: &str) -> Result<NetworkDescription, InputError> {
    toml::from_str(text).map_err(|source| InputError::Parse {
        path: origin.to_string(),
        source,
    })
}
