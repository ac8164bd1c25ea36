// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::backtrace::Backtrace;
use std::panic;
use std::sync::Once;

use serde::Deserialize;
use tracing::error;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_LEVEL_ENV: &str = "GT_LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Target directives such as `info` or `greptimedb_row_ingester=debug`
    pub level: Option<String>,
}

/// Install the global tracing subscriber once.
///
/// The level is taken from `opts`, then from `GT_LOG_LEVEL`, then defaults
/// to `info`. If the host process already installed a subscriber it is left
/// in place.
pub fn init_logger(opts: &LoggingOptions) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let level = resolve_level(opts, std::env::var(LOG_LEVEL_ENV).ok());
        let filter = parse_targets(&level);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}

fn resolve_level(opts: &LoggingOptions, env_level: Option<String>) -> String {
    opts.level
        .clone()
        .or(env_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn parse_targets(level: &str) -> Targets {
    level
        .parse::<Targets>()
        .unwrap_or_else(|_| Targets::new().with_default(LevelFilter::INFO))
}

/// Route panics through tracing before the previous hook runs.
pub fn set_panic_hook() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic| {
            let backtrace = Backtrace::force_capture();
            if let Some(location) = panic.location() {
                error!(
                    "Panic: {}, file: {}, line: {}, col: {}, backtrace: {}",
                    panic,
                    location.file(),
                    location.line(),
                    location.column(),
                    backtrace,
                );
            } else {
                error!("Panic: {}, backtrace: {}", panic, backtrace);
            }

            default_hook(panic);
        }));
    });
}
