use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "checkout_wizard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

/// Directive used when `RUST_LOG` is not set.
fn default_directive(level: &str, verbose: bool) -> String {
    if verbose {
        format!("{}=debug,info", CRATE_TARGET)
    } else {
        format!("{}={}", CRATE_TARGET, level)
    }
}

fn install(directive: String, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    install(default_directive("info", verbose), LogFormat::Compact);
}

/// JSON lines for log shippers; `level` usually comes from the `[logging]` section.
pub fn init_json_logger(level: &str) {
    install(default_directive(level, false), LogFormat::Json);
}
