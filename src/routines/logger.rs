use std::time::Instant;

use crate::routines::output::OutputFile;
use crate::routines::settings::Settings;
use anyhow::Result;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Setup logging for the library
///
/// This function sets up logging for the library. It uses the `tracing` crate, and the `tracing-subscriber` crate for formatting.
///
/// The log level is defined in the configuration file, and defaults to `INFO`.
///
/// If `log.write` is set in the configuration file, a log file with the name given by `log.file` is created in the output folder.
///
/// Log messages are always written to stdout.
///
/// Only the first call installs a subscriber; later calls leave the existing one, and its log
/// file, in place.
pub fn setup_log(settings: &Settings) -> Result<()> {
    // Opening the file truncates it, so leave an installed subscriber and its file alone
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("A global subscriber is already installed");
        return Ok(());
    }

    // Use the log level defined in configuration file
    let log_level = settings.log.level.as_str();
    let env_filter = EnvFilter::try_new(log_level)?;

    let timestamper = CompactTimestamp {
        start: Instant::now(),
    };

    // Define a registry with that level as an environment filter
    let subscriber = Registry::default().with(env_filter);

    // Define layer for file
    let file_layer = match settings.log.write {
        true => {
            let outputfile = OutputFile::new(&settings.output.path, &settings.log.file)?;
            let layer = fmt::layer()
                .with_writer(outputfile.file_owned())
                .with_ansi(false)
                .with_timer(timestamper.clone());
            Some(layer)
        }
        false => None,
    };

    // Define layer for stdout
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(timestamper.clone());

    // Combine layers with subscriber
    if subscriber
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("A global subscriber is already installed");
    }
    tracing::debug!("Logging is configured with level: {}", log_level);

    Ok(())
}

#[derive(Clone)]
struct CompactTimestamp {
    start: Instant,
}

impl FormatTime for CompactTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        let elapsed = self.start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        let seconds = elapsed.as_secs() % 60;

        write!(w, "{:02}h {:02}m {:02}s", hours, minutes, seconds)
    }
}
