use std::time::Duration;

use pagesnap_lib::{CaptureError, Config, WriteMode};

use crate::cli::Cli;

/// Load the config file (if any) and layer the command-line flags on top.
pub fn resolve_config(cli: &Cli) -> Result<Config, CaptureError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);
    config.validate().map_err(CaptureError::Config)?;
    Ok(config)
}

/// CLI flags win over the file; unset flags leave the file's values alone.
pub fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(viewport) = cli.viewport {
        config.render.viewport = viewport;
    }
    if let Some(secs) = cli.fetch_timeout {
        config.fetch.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.render_deadline {
        config.render.deadline = Duration::from_secs(secs);
    }
    if cli.headed {
        config.render.headless = false;
    }
    if let Some(chrome) = &cli.chrome {
        config.render.chrome_executable = Some(chrome.clone());
    }
    if cli.atomic_writes {
        config.write_mode = WriteMode::Atomic;
    }
}
