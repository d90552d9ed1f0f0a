//! Bridge from the [`log`] facade to a host-supplied leveled logger.
//!
//! Cluster frameworks embedding this plugin usually own the process-wide
//! logging facility.  [`LogBridge`] implements [`log::Log`] and forwards
//! every record emitted by this crate (and anything else using the
//! facade) into the host's sink, mapping levels one to one.  Standalone
//! setups skip the bridge entirely and install `env_logger` instead.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Leveled log sink exposed by the host framework.
pub trait LogSink: Send + Sync {
    /// Whether the sink wants records at this level.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }

    /// Consumes one formatted message.
    fn log(&self, level: Level, target: &str, message: &str);
}

/// `log::Log` adapter delegating to a [`LogSink`].
pub struct LogBridge<S> {
    sink: S,
}

impl<S: LogSink> LogBridge<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Installs the bridge as the process-wide logger.  Can only succeed
    /// once per process; the host decides whether that is this bridge or
    /// its own logger.
    pub fn install(sink: S, max_level: LevelFilter) -> Result<(), SetLoggerError>
    where
        S: 'static,
    {
        log::set_boxed_logger(Box::new(Self::new(sink)))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl<S: LogSink> Log for LogBridge<S> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.sink.enabled(metadata.level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.sink
                .log(record.level(), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CaptureSink {
        lines: Arc<Mutex<Vec<(Level, String, String)>>>,
        min_level: Option<Level>,
    }

    impl LogSink for CaptureSink {
        fn enabled(&self, level: Level) -> bool {
            match self.min_level {
                Some(min) => level <= min,
                None => true,
            }
        }

        fn log(&self, level: Level, target: &str, message: &str) {
            self.lines
                .lock()
                .unwrap()
                .push((level, target.to_string(), message.to_string()));
        }
    }

    fn emit(bridge: &LogBridge<CaptureSink>, level: Level, message: &str) {
        bridge.log(
            &Record::builder()
                .level(level)
                .target("nimbus_discovery::test")
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn records_are_forwarded_with_level_and_target() {
        let sink = CaptureSink::default();
        let bridge = LogBridge::new(sink.clone());

        emit(&bridge, Level::Warn, "no running nodes");
        emit(&bridge, Level::Trace, "discovered 3 nodes");

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Level::Warn);
        assert_eq!(lines[0].1, "nimbus_discovery::test");
        assert_eq!(lines[0].2, "no running nodes");
        assert_eq!(lines[1].0, Level::Trace);
    }

    #[test]
    fn disabled_levels_are_dropped() {
        let sink = CaptureSink {
            min_level: Some(Level::Info),
            ..Default::default()
        };
        let bridge = LogBridge::new(sink.clone());

        emit(&bridge, Level::Debug, "ignored");
        emit(&bridge, Level::Error, "kept");

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].2, "kept");
    }
}
