use anyhow::Result;

use crate::config::Config;

pub(crate) fn show_config(config: &Config) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
