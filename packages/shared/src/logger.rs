//! Logging setup utilities for the Kyodo binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the library crates and the binary itself log at `default_log_level`
/// unless the `RUST_LOG` environment variable says otherwise.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kyodo_server", "kyodo_client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kyodo_shared::logger::setup_logger;
///
/// setup_logger("kyodo_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    format!(
        "kyodo_shared={level},kyodo_server={level},kyodo_client={level},{binary_target}={level},tower_http={level}",
        level = default_log_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_all_workspace_crates() {
        // テスト項目: デフォルトのフィルタが全ワークスペースクレートとバイナリを含む
        // given (前提条件):
        let binary_name = "kyodo-server";

        // when (操作):
        let directives = default_directives(binary_name, "info");

        // then (期待する結果):
        assert!(directives.contains("kyodo_server=info"));
        assert!(directives.contains("kyodo_client=info"));
        assert!(directives.contains("kyodo_shared=info"));
        assert!(directives.contains("tower_http=info"));
        assert!(!directives.contains('-'));
    }
}
