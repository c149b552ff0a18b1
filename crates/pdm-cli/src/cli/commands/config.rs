use anyhow::Result;
use pdm_core::config::{self, EngineConfig};

/// Print where the config lives and the values the engine will use.
pub fn run_config(cfg: &EngineConfig) -> Result<()> {
    let retry = cfg.retry_policy();
    println!("config file: {}", config::config_path()?.display());
    println!("threads: {}", cfg.threads_or_default());
    println!("min_part_size: {} bytes", cfg.min_part_size);
    println!("buffer_size: {} bytes", cfg.buffer_size);
    println!("connect_timeout: {}s", cfg.connect_timeout_secs);
    println!(
        "user_agent: {}",
        cfg.user_agent.as_deref().unwrap_or("(libcurl default)")
    );
    println!(
        "retry: {} attempts, backoff {:?} .. {:?}",
        retry.max_attempts, retry.base_delay, retry.max_delay
    );
    Ok(())
}
