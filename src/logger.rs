use std::path::Path;

use anyhow::Result;
use fern::Dispatch;
use log::LevelFilter;

pub fn init(level: LevelFilter, logfile: Option<&Path>) -> Result<()> {
    let mut logger = Dispatch::new()
        .level(level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] - ({}) - {}",
                record.level(),
                record.file_static().unwrap_or("*"),
                message
            ))
        })
        .chain(std::io::stdout());

    if let Some(path) = logfile {
        logger = logger.chain(fern::log_file(path)?);
    }

    logger.apply()?;

    Ok(())
}
