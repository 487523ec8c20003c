/*!

Configures the `log` facade for the crate. Callers opt in: logging is off
until `enable_logging()` or `set_log_level()` is called, after which records
are written to standard error through a `log4rs` console appender (standard
error so that consumers writing data to standard output stay clean).

The macros are re-exported here so that crate modules and downstream callers
can `use seir_core::log::trace;` without depending on the facade directly.

*/

use std::sync::{LazyLock, Mutex};

use log::LevelFilter;
pub use log::{debug, error, info, trace, warn};
use log4rs::Handle;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l})} [{M}] {m}{n}";

struct LogConfiguration {
    root_level: LevelFilter,
    // `log4rs::init_config` may only run once per process; afterwards the
    // handle is the only way to swap configurations.
    handle: Option<Handle>,
}

impl LogConfiguration {
    fn build_config(&self) -> Config {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();

        Config::builder()
            .appender(Appender::builder().build("stderr", Box::new(stderr)))
            .build(Root::builder().appender("stderr").build(self.root_level))
            .unwrap() // Will never panic: the configuration is static and well-formed
    }

    fn apply(&mut self) {
        let config = self.build_config();
        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => {
                self.handle = Some(
                    log4rs::init_config(config)
                        .expect("a logger was already installed by the host"),
                );
            }
        }
    }
}

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(|| {
    Mutex::new(LogConfiguration {
        root_level: LevelFilter::Off,
        handle: None,
    })
});

/// Enables logging of all messages, including trace diagnostics from the
/// integration driver.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Silences all logging without uninstalling the logger.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the root verbosity level, installing the logger on first use.
pub fn set_log_level(level: LevelFilter) {
    let mut configuration = LOG_CONFIGURATION.lock().unwrap();
    configuration.root_level = level;
    configuration.apply();
}
