//! Colorful console output for resolver builds.
//!
//! Provides a custom `tracing` layer that formats TreeForge events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Build lifecycle (start, cache hit/miss, compose, compile, end)
//! - **WARN**: Cache corruption and failed cache writes
//! - **DEBUG**: One line per composed function

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the TreeForge banner and sets up tracing; `RUST_LOG` overrides
/// the default `treeforge_jit=info`.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,treeforge_jit=info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(TreeForgeConsoleLayer)
            .try_init();
    });
}

// Seconds since `init`.
fn elapsed_secs() -> f64 {
    EPOCH.get().map_or(0.0, |epoch| epoch.elapsed().as_secs_f64())
}

fn print_banner() {
    let banner = r#"
 _____              _____
|_   _| __ ___  ___|  ___|__  _ __ __ _  ___
  | || '__/ _ \/ _ \ |_ / _ \| '__/ _` |/ _ \
  | || | |  __/  __/  _| (_) | | | (_| |  __/
  |_||_|  \___|\___|_|  \___/|_|  \__, |\___|
                                  |___/
"#;

    let version_line = format!("              v{} - Decision Tree JIT\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_green());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats resolver build events with colors.
pub struct TreeForgeConsoleLayer;

impl<S: Subscriber> Layer<S> for TreeForgeConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("treeforge") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{} {}", format_elapsed(), output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    entry: Option<String>,
    message: Option<String>,
    error: Option<String>,
    tree_depth: Option<u64>,
    feature_count: Option<u64>,
    function_depth: Option<u64>,
    switch_depth: Option<u64>,
    functions: Option<u64>,
    emitted_functions: Option<u64>,
    cases: Option<u64>,
    root: Option<u64>,
    switches: Option<u64>,
    predicates: Option<u64>,
    duration_ms: Option<u64>,
    cache_hit: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "entry" => self.entry = Some(s),
            "message" => self.message = Some(s),
            "error" => self.error = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "tree_depth" => self.tree_depth = Some(value),
            "feature_count" => self.feature_count = Some(value),
            "function_depth" => self.function_depth = Some(value),
            "switch_depth" => self.switch_depth = Some(value),
            "functions" => self.functions = Some(value),
            "emitted_functions" => self.emitted_functions = Some(value),
            "cases" => self.cases = Some(value),
            "root" => self.root = Some(value),
            "switches" => self.switches = Some(value),
            "predicates" => self.predicates = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "cache_hit" {
            self.cache_hit = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_debug(field, &value);
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "build_start" => format_build_start(v),
        "build_end" => format_build_end(v),
        "cache_hit" => format_cache(v, "cache hit", true),
        "cache_miss" => format_cache(v, "cache miss", false),
        "cache_stale" => format_cache(v, "cache stale", false),
        "cache_store" => format_cache(v, "cache stored", true),
        "cache_corruption" | "cache_write_failed" => format_cache_warning(v),
        "compose_end" => format_phase(v, "Compose", "cases", v.cases),
        "compile_end" => format_phase(v, "Compile", "functions", v.functions),
        "function_composed" if level >= Level::DEBUG => format_function(v),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_build_start(v: &EventVisitor) -> String {
    format!(
        "{} Building │ depth {} │ {} features │ F={} S={} │ {} functions",
        "▶".bright_green().bold(),
        v.tree_depth.unwrap_or(0).bright_yellow(),
        count(v.feature_count).bright_yellow(),
        v.function_depth.unwrap_or(0),
        v.switch_depth.unwrap_or(0),
        count(v.functions).bright_magenta(),
    )
}

fn format_build_end(v: &EventVisitor) -> String {
    let source = if v.cache_hit.unwrap_or(false) {
        "from cache".bright_cyan().to_string()
    } else {
        format!("{} emitted", count(v.emitted_functions)).white().to_string()
    };
    format!(
        "{} Build complete │ {} │ {}",
        "■".bright_cyan().bold(),
        source,
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    )
}

fn format_cache(v: &EventVisitor, label: &str, good: bool) -> String {
    let label = if good {
        label.bright_green().to_string()
    } else {
        label.yellow().to_string()
    };
    format!(
        "{} {} │ {}",
        "◆".bright_blue(),
        label,
        v.entry.as_deref().unwrap_or("?").bright_black()
    )
}

fn format_cache_warning(v: &EventVisitor) -> String {
    let reason = v
        .message
        .as_deref()
        .or(v.error.as_deref())
        .unwrap_or("unknown");
    format!(
        "{} {} │ {} │ {}",
        "!".bright_red().bold(),
        v.event.as_deref().unwrap_or("").replace('_', " ").bright_red(),
        v.entry.as_deref().unwrap_or("?"),
        reason
    )
}

fn format_phase(v: &EventVisitor, phase: &str, unit: &str, amount: Option<u64>) -> String {
    format!(
        "{} {} │ {} {} │ {}",
        "◀".bright_blue(),
        phase.white().bold(),
        count(amount).bright_magenta().bold(),
        unit,
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    )
}

fn format_function(v: &EventVisitor) -> String {
    format!(
        "  {} node_evaluator_{} │ {} switches │ {} cases │ {} predicates",
        "·".bright_black(),
        v.root.unwrap_or(0),
        count(v.switches),
        count(v.cases),
        count(v.predicates),
    )
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration_ms(12), "12ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_events_are_silent() {
        let v = EventVisitor {
            event: Some("switch".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
    }

    #[test]
    fn test_function_lines_need_debug() {
        let v = EventVisitor {
            event: Some("function_composed".to_string()),
            root: Some(7),
            cases: Some(128),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
        assert!(format_event(&v, Level::DEBUG).contains("node_evaluator_7"));
    }

    #[test]
    fn test_counts_use_separators() {
        assert_eq!(count(Some(32768)), "32,768");
        assert_eq!(count(None), "0");
    }
}
