//! Initializes `tracing` output from the [`config::Logger`] section.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{config, Error, Result};

// Filter applied when the environment and the configuration name none.
const MODULE_WHITELIST: &[&str] = &["ldt_rs", "tower_http", "axum"];

static NONBLOCKING_WORK_GUARD_KEEP: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber.
///
/// The filter is `RUST_LOG` when set, else the configured `override_filter`,
/// else the configured level for this crate and the HTTP stack.
///
/// # Errors
///
/// Fails when a global subscriber is already installed or the filter does
/// not parse.
pub fn init(config: &config::Logger) -> Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

    if let Some(file_appender_config) = config.file_appender.as_ref() {
        if file_appender_config.enable {
            let dir = file_appender_config
                .dir
                .as_ref()
                .map_or_else(|| "./logs".to_string(), ToString::to_string);

            let mut rolling_builder = tracing_appender::rolling::Builder::default()
                .max_log_files(file_appender_config.max_log_files);

            rolling_builder = match file_appender_config.rotation {
                config::Rotation::Minutely => {
                    rolling_builder.rotation(tracing_appender::rolling::Rotation::MINUTELY)
                }
                config::Rotation::Hourly => {
                    rolling_builder.rotation(tracing_appender::rolling::Rotation::HOURLY)
                }
                config::Rotation::Daily => {
                    rolling_builder.rotation(tracing_appender::rolling::Rotation::DAILY)
                }
                config::Rotation::Never => {
                    rolling_builder.rotation(tracing_appender::rolling::Rotation::NEVER)
                }
            };

            let file_appender = rolling_builder
                .filename_prefix(
                    file_appender_config
                        .filename_prefix
                        .as_ref()
                        .map_or_else(String::new, ToString::to_string),
                )
                .filename_suffix(
                    file_appender_config
                        .filename_suffix
                        .as_ref()
                        .map_or_else(String::new, ToString::to_string),
                )
                .build(dir)
                .map_err(|err| Error::Logger(err.to_string()))?;

            let file_appender_layer = if file_appender_config.non_blocking {
                let (non_blocking_file_appender, work_guard) =
                    tracing_appender::non_blocking(file_appender);
                if NONBLOCKING_WORK_GUARD_KEEP.set(work_guard).is_err() {
                    return Err(Error::Logger("file appender is already initialized".to_string()));
                }
                init_layer(
                    non_blocking_file_appender,
                    file_appender_config.format,
                    false,
                )
            } else {
                init_layer(file_appender, file_appender_config.format, false)
            };
            layers.push(file_appender_layer);
        }
    }

    if config.enable {
        layers.push(init_layer(std::io::stdout, config.format, true));
    }

    if !layers.is_empty() {
        tracing_subscriber::registry()
            .with(layers)
            .with(init_env_filter(config.override_filter.as_ref(), config.level)?)
            .try_init()
            .map_err(|err| Error::Logger(err.to_string()))?;
    }
    Ok(())
}

fn init_env_filter(override_filter: Option<&String>, level: config::LogLevel) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = override_filter.cloned().unwrap_or_else(|| {
        MODULE_WHITELIST
            .iter()
            .map(|module| format!("{module}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    });
    EnvFilter::try_new(directives).map_err(|err| Error::Logger(err.to_string()))
}

fn init_layer<W2>(
    make_writer: W2,
    format: config::Format,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Sync + Send>
where
    W2: for<'writer> MakeWriter<'writer> + Sync + Send + 'static,
{
    match format {
        config::Format::Compact => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .compact()
            .boxed(),
        config::Format::Pretty => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .pretty()
            .boxed(),
        config::Format::Json => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .json()
            .boxed(),
    }
}
