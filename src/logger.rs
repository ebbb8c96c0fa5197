use std::time::SystemTime;

use colored::{Color, Colorize};
use log::{Level, LevelFilter};

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Magenta,
    }
}

pub fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level().to_string().color(level_color(record.level())),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("rental_ingest", level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
