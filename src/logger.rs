//! Process logging via `log4rs`.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const RETENTION: u32 = 7;

/// Initializes the logging system from a log4rs YAML config file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Builds the programmatic config: stderr always, plus `{dir}/mongopod.log` rolling at 10 MiB
/// when `dir` is given.
///
/// # Errors
/// Returns an error if the log directory or roller cannot be set up.
pub fn build_config(
    dir: Option<&Path>,
    level: LevelFilter,
) -> Result<Config, Box<dyn std::error::Error>> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let mut builder =
        Config::builder().appender(Appender::builder().build("stderr", Box::new(console)));
    let mut root = Root::builder().appender("stderr");
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        let roller = FixedWindowRoller::builder()
            .build(&format!("{}", dir.join("mongopod.{}.log").display()), RETENTION)?;
        let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
        let file = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(dir.join("mongopod.log"), Box::new(policy))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }
    Ok(builder.build(root.build(level))?)
}

/// Installs the programmatic config globally.
///
/// # Errors
/// Returns an error if the config cannot be built or a logger is already installed.
pub fn configure(dir: Option<&Path>, level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, parse_level(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
