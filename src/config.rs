use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuildhallConfig {
    pub databases: Option<String>,
    pub port: Option<u16>,
    pub frontend: Option<String>,
}

pub const DEFAULT_PORT: u16 = 5001;

pub fn default_config_path() -> PathBuf {
    PathBuf::from("guildhall.toml")
}

pub fn default_database_dir() -> PathBuf {
    PathBuf::from("databases")
}

pub fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend").join("build")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<GuildhallConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: GuildhallConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &GuildhallConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
