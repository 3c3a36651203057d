use log::{LevelFilter, Log, Metadata, Record};

static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            #[cfg(test)]
            capture::record(record);
            eprintln!("[agentverse] {}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

pub fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the stderr logger. Safe to call more than once; only the first
/// call installs, later calls just adjust the level.
pub fn init(debug: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level_for(debug));
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_level() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Warn);
    }

    #[test]
    fn init_is_repeatable() {
        init(false);
        init(true);
        assert_eq!(log::max_level(), LevelFilter::Debug);
        init(false);
    }

    #[test]
    fn capture_collects_this_thread_only() {
        capture::start();
        log::warn!("captured here");
        std::thread::spawn(|| log::warn!("elsewhere")).join().unwrap();

        assert_eq!(capture::warnings(), vec!["captured here".to_string()]);
        assert!(capture::take().is_empty());
    }
}
