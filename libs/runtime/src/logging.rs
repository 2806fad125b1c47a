use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_MAX_SIZE_MB: u64 = 100;

// -------- level helpers --------

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if `target` is `prefix` itself or lives under `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

type DefaultFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Filter for the "default" section: everything not claimed by an explicit subsystem.
fn default_filter(claimed: &[String], max_level: Level) -> DefaultFilter {
    let claimed = claimed.to_vec();
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        if claimed.iter().any(|c| matches_prefix(meta.target(), c)) {
            return false;
        }
        meta.level() <= &max_level
    }))
}

// -------- rotating file writers --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut f) => f.write(buf),
            // A panicked writer must not take logging down with it.
            Err(poisoned) => poisoned.into_inner().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut f) => f.flush(),
            Err(poisoned) => poisoned.into_inner().flush(),
        }
    }
}

/// Writer that silently drops records with no configured destination.
struct MaybeWriter(Option<RotWriter>);

impl Write for MaybeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes records to per-subsystem files by target prefix, falling back to
/// the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeWriter(self.resolve(meta.target()))
    }
}

/// Relative paths are joined with `base_dir` (the server home).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(log_path: &Path, max_bytes: usize) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::Age(chrono::Duration::days(1))),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn writer_for_section(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize) {
        Ok(w) => Some(w),
        Err(e) => {
            // The subscriber isn't installed yet, so stderr is all we have.
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- plan --------

/// Logging configuration split into the default section and explicit subsystems.
struct LogPlan<'a> {
    default: Option<&'a Section>,
    subsystems: Vec<(String, &'a Section)>,
}

impl<'a> LogPlan<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut subsystems: Vec<(String, &Section)> = cfg
            .iter()
            .filter(|(k, _)| k.as_str() != "default")
            .map(|(k, v)| (k.clone(), v))
            .collect();
        // Longest prefix first so nested subsystems win over their parents.
        subsystems.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            default: cfg.get("default"),
            subsystems,
        }
    }

    fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|(n, _)| n.clone()).collect()
    }

    fn console_targets(&self) -> Targets {
        self.subsystems
            .iter()
            .filter_map(|(name, s)| {
                parse_tracing_level(&s.console_level).map(|l| (name.clone(), LevelFilter::from_level(l)))
            })
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, lvl)| {
                t.with_target(name, lvl)
            })
    }

    fn file_targets(&self) -> Targets {
        self.subsystems
            .iter()
            .filter(|(_, s)| !s.file.trim().is_empty())
            .filter_map(|(name, s)| {
                parse_tracing_level(&s.file_level).map(|l| (name.clone(), LevelFilter::from_level(l)))
            })
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, lvl)| {
                t.with_target(name, lvl)
            })
    }

    fn file_router(&self, base_dir: &Path) -> FileRouter {
        let mut router = FileRouter {
            default: self
                .default
                .and_then(|s| writer_for_section("default", s, base_dir)),
            by_prefix: HashMap::new(),
        };
        for (name, section) in &self.subsystems {
            if let Some(w) = writer_for_section(name, section, base_dir) {
                router.by_prefix.insert(name.clone(), w);
            }
        }
        router
    }
}

// -------- public init --------

/// Install the global subscriber from `cfg`; relative log files resolve against `base_dir`.
/// Calling it twice is harmless: the second install is ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let plan = LogPlan::from_config(cfg);
    let claimed = plan.subsystem_names();
    let router = plan.file_router(base_dir);
    let ansi = std::io::stdout().is_terminal();

    let console_explicit = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console_targets());

    let console_default = plan
        .default
        .and_then(|s| parse_tracing_level(&s.console_level))
        .map(|level| {
            fmt::layer()
                .with_ansi(ansi)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(default_filter(&claimed, level))
        });

    let (file_explicit, file_default) = if router.is_empty() {
        (None, None)
    } else {
        let explicit = fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router.clone())
            .with_filter(plan.file_targets());

        let default = plan
            .default
            .filter(|_| router.default.is_some())
            .and_then(|s| parse_tracing_level(&s.file_level))
            .map(|level| {
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(router.clone())
                    .with_filter(default_filter(&claimed, level))
            });
        (Some(explicit), default)
    };

    let _ = Registry::default()
        .with(console_explicit)
        .with(console_default)
        .with(file_explicit)
        .with(file_default)
        .try_init();
}
