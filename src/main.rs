use anyhow::{bail, Context};
use env_logger::Env;

use adt_convert_lib::convert::config::{Command, Config, USAGE};
use adt_convert_lib::convert::watch::Watcher;
use adt_convert_lib::Converter;

fn usage_and_exit(error: Option<&str>) -> ! {
    if let Some(error) = error {
        eprintln!("Error: {}", error);
        eprintln!();
    }
    eprintln!("{}", USAGE);
    std::process::exit(if error.is_some() { 1 } else { 0 });
}

fn run(config: &Config) -> anyhow::Result<()> {
    if !config.input.exists() {
        bail!("Input file or directory {} not found", config.input.display());
    }
    if config.watch && !config.input.is_dir() {
        bail!("Watch mode needs a directory, {} is not one", config.input.display());
    }
    if let Some(out) = &config.output {
        if !out.is_dir() {
            bail!("Output directory {} not found", out.display());
        }
    }

    let mut converter = Converter::new(config);
    if config.watch {
        Watcher::new(converter).run(|| false);
        return Ok(());
    }

    let summary = converter
        .run()
        .with_context(|| format!("Converting {}", config.input.display()))?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if summary.failed > 0 {
        bail!("{} of {} tiles failed", summary.failed, summary.failed + summary.converted);
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::from_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => usage_and_exit(None),
        Err(e) => usage_and_exit(Some(&e)),
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level().as_str()))
        .format_timestamp(None)
        .init();
    log::debug!("Config: {}", serde_json::to_string(&config).unwrap_or_default());

    if let Err(e) = run(&config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
