use anyhow::Result;
use owo_colors::OwoColorize;
use schedir_core::config::SchedirConfig;

pub fn run(config: &SchedirConfig) -> Result<()> {
    let path = SchedirConfig::config_path()?;

    println!("{}", format!("Config: {}", path.display()).dimmed());
    println!();
    println!("  store_dir      {}", config.store_path().display());
    println!("  locale         {}", config.locale);
    println!("  default_view   {}", config.default_view);
    println!("  week_start     {}", config.week_start()?);
    println!("  store_timeout  {}", config.store_timeout);

    Ok(())
}
