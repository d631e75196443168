/*
 *   Copyright (c) 2024 Fabric Contributors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Diagnostics wiring for sample programs built on the fabric (SPEC_FULL
//! §10). None of this lives in the core crates: every layer upstream only
//! emits `tracing` events and returns `FabricError`s, the same "no sink
//! baked into the library" split the teacher draws between `core`'s
//! tracing helpers and `cmdr`'s binaries that actually install them
//! (ground: `core/src/tracing_logging/init_tracing.rs`,
//! `tui/src/core/common/miette_setup_global_report_handler.rs`).

use std::env;
use std::time::Duration;

use fabric_core::FabricConfig;
use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` `fmt` layer reading its level from
/// `RUST_LOG` (default `info`), plus a `miette` fancy report handler so a
/// sample binary's `main() -> miette::Result<()>` prints a readable
/// diagnostic instead of `Debug`-formatting a `FabricError`.
pub fn install_diagnostics() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let _ = miette::set_hook(Box::new(|_report| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .width(100)
                .wrap_lines(true)
                .context_lines(3)
                .with_cause_chain()
                .build(),
        )
    }));
}

/// Loads [`FabricConfig`] overrides from environment variables, falling
/// back to [`FabricConfig::default`] for anything unset or unparsable
/// (ground: the `env::var(...).is_ok_and(...)` idiom in
/// `tui/src/core/ansi/detect_color_support.rs`). The core has no opinion
/// on configuration sources (SPEC_FULL §11); this is purely a
/// hosting-application convenience.
#[must_use]
pub fn config_from_env() -> FabricConfig {
    let mut config = FabricConfig::default();

    if let Some(capacity) = env_parse::<usize>("FABRIC_QUEUE_CAPACITY") {
        config.default_queue_capacity = Some(capacity);
    }
    if let Some(ms) = env_parse::<u64>("FABRIC_WATCHDOG_MS") {
        config.default_watchdog = Some(Duration::from_millis(ms));
    }
    if let Some(retries) = env_parse::<u32>("FABRIC_RETRY_COUNT") {
        config.default_retry_count = retries;
    }
    if let Some(ms) = env_parse::<u64>("FABRIC_ACK_TIMEOUT_MS") {
        config.default_ack_timeout = Duration::from_millis(ms);
    }
    if let Some(mult) = env_parse::<u32>("FABRIC_TIMER_RESYNC_THRESHOLD") {
        config.timer_resync_threshold = mult;
    }

    config
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn unset_env_falls_back_to_defaults() {
        env::remove_var("FABRIC_RETRY_COUNT");
        let config = config_from_env();
        assert_eq!(config.default_retry_count, FabricConfig::default().default_retry_count);
    }

    #[test]
    #[serial]
    fn set_env_overrides_default() {
        env::set_var("FABRIC_RETRY_COUNT", "9");
        let config = config_from_env();
        assert_eq!(config.default_retry_count, 9);
        env::remove_var("FABRIC_RETRY_COUNT");
    }

    #[test]
    #[serial]
    fn unparsable_env_is_ignored() {
        env::set_var("FABRIC_RETRY_COUNT", "not-a-number");
        let config = config_from_env();
        assert_eq!(config.default_retry_count, FabricConfig::default().default_retry_count);
        env::remove_var("FABRIC_RETRY_COUNT");
    }
}
