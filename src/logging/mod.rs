//! 日志初始化.
//!
//! 控制台与文件两个输出层共用一种事件格式, 控制台带颜色, 过滤级别各自独立.
//! 库 crate 通过 `log` 门面输出的记录经 tracing-log 桥接汇入同一订阅器, 并还原原始 target.
//! 文件按本地日期命名 `<prefix>.<YYYY-MM-DD>.log`, 跨日后首次写入时切换到新文件.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_log::NormalizeEvent;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件层过滤表达式, 语法同 `RUST_LOG`
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_true() -> bool {
    true
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 安装全局订阅器, 进程内只能成功调用一次
pub fn init(config: LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("创建日志目录失败, path={}", config.directory))?;

    let file_appender = DailyFileWriter::new(Path::new(&config.directory), &config.file_prefix)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(EventFormatter { ansi: false })
        .with_filter(EnvFilter::new(&config.level));

    let console_layer = config.console.then(|| {
        fmt::Layer::default()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .event_format(EventFormatter { ansi: true })
            .with_filter(EnvFilter::new("debug"))
    });

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("全局日志订阅器已安装")?;

    Ok(())
}

struct DailyFileWriter {
    directory: PathBuf,
    prefix: String,
    date: NaiveDate,
    file: File,
}

impl DailyFileWriter {
    fn new(directory: &Path, prefix: &str) -> Result<Self> {
        let today = Local::now().date_naive();
        let file = open_append_file(&build_current_log_path(directory, prefix, today))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            date: today,
            file,
        })
    }

    fn reopen_if_new_day(&mut self) -> std::io::Result<()> {
        let today = Local::now().date_naive();
        if today == self.date {
            return Ok(());
        }
        let file_path = build_current_log_path(&self.directory, &self.prefix, today);
        self.file = open_append_file(&file_path).map_err(std::io::Error::other)?;
        self.date = today;
        Ok(())
    }
}

impl Write for DailyFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.reopen_if_new_day()?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn open_append_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败, path={}", path.display()))
}

/// 指定日期的日志文件路径
pub fn build_current_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

/// 控制台与文件共用的事件格式
///
/// `[MM-DD HH:MM:SS.mmm] LEVEL 模块 span1:span2 > 字段`, 模块去掉 `vvc_` crate 前缀,
/// 经 log 门面转发的记录取其原始 target.
struct EventFormatter {
    ansi: bool,
}

impl EventFormatter {
    fn level_color(level: tracing::Level) -> &'static str {
        match level {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        }
    }
}

/// `vvc_codec::ps::pps` 显示为 `codec::ps::pps`, 其余 target 原样保留
fn short_target(target: &str) -> &str {
    target.strip_prefix("vvc_").unwrap_or(target)
}

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let normalized = event.normalized_metadata();
        let meta = normalized.as_ref().unwrap_or_else(|| event.metadata());
        let now = Local::now();
        write!(writer, "[{}] ", now.format("%m-%d %H:%M:%S%.3f"))?;
        if self.ansi {
            write!(writer, "{}{:5}\x1b[0m ", Self::level_color(*meta.level()), meta.level().as_str())?;
        } else {
            write!(writer, "{:5} ", meta.level().as_str())?;
        }
        write!(writer, "{}", short_target(meta.target()))?;

        if let Some(scope) = ctx.event_scope() {
            let mut sep = ' ';
            for span in scope.from_root() {
                write!(writer, "{}{}", sep, span.name())?;
                sep = ':';
            }
        }
        write!(writer, " > ")?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
