//! Generates `constants.rs` from an optional `trimode.toml`.
//!
//! Lookup order: `TRIMODE_CONFIG_PATH`, then `trimode.toml` next to the workspace
//! `Cargo.toml`, then built-in defaults. Every key is optional.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use serde_derive::Deserialize;

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TrimodeToml {
    #[serde(default)]
    queue: QueueToml,
    #[serde(default)]
    debounce: DebounceToml,
    #[serde(default)]
    link: LinkToml,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, default)]
struct QueueToml {
    mode_event_queue_size: usize,
    link_event_queue_size: usize,
}

impl Default for QueueToml {
    fn default() -> Self {
        Self {
            mode_event_queue_size: 4,
            link_event_queue_size: 8,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, default)]
struct DebounceToml {
    tick_ms: u64,
    insert_confirm_samples: u8,
    insert_max_ticks: u8,
    remove_confirm_samples: u8,
    remove_max_ticks: u8,
}

impl Default for DebounceToml {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            insert_confirm_samples: 5,
            insert_max_ticks: 40,
            remove_confirm_samples: 6,
            remove_max_ticks: 60,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, default)]
struct LinkToml {
    connect_interval_us: u32,
    heartbeat_interval_us: u32,
    tx_power_dbm: i8,
    pair_attempts_max: u8,
    reconnect_attempts_max: u8,
    no_activity_timeout_ms: u64,
    no_activity_reconnect_threshold: u8,
}

impl Default for LinkToml {
    fn default() -> Self {
        Self {
            connect_interval_us: 1000,
            heartbeat_interval_us: 250_000,
            tx_power_dbm: 4,
            pair_attempts_max: 30,
            reconnect_attempts_max: 4,
            no_activity_timeout_ms: 1000,
            no_activity_reconnect_threshold: 2,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("TRIMODE_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?);
    let candidate = manifest_dir.parent()?.join("trimode.toml");
    candidate.exists().then_some(candidate)
}

fn check(config: &TrimodeToml) -> Result<(), String> {
    let q = &config.queue;
    if q.mode_event_queue_size == 0 || q.link_event_queue_size == 0 {
        return Err("queue sizes must be at least 1".into());
    }
    let d = &config.debounce;
    if d.tick_ms == 0 {
        return Err("debounce.tick_ms must be non-zero".into());
    }
    if d.insert_confirm_samples == 0 || d.insert_confirm_samples > d.insert_max_ticks {
        return Err("debounce.insert_confirm_samples must be in 1..=insert_max_ticks".into());
    }
    if d.remove_confirm_samples == 0 || d.remove_confirm_samples > d.remove_max_ticks {
        return Err("debounce.remove_confirm_samples must be in 1..=remove_max_ticks".into());
    }
    let l = &config.link;
    if l.pair_attempts_max == 0 || l.reconnect_attempts_max == 0 {
        return Err("link retry caps must be at least 1".into());
    }
    if l.no_activity_timeout_ms == 0 {
        return Err("link.no_activity_timeout_ms must be non-zero".into());
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-env-changed=TRIMODE_CONFIG_PATH");
    println!("cargo:rerun-if-changed=build.rs");

    let config = match config_path() {
        Some(path) => {
            println!("cargo:rerun-if-changed={}", path.display());
            let text = fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
            toml::from_str::<TrimodeToml>(&text)
                .unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
        }
        None => TrimodeToml::default(),
    };

    if let Err(msg) = check(&config) {
        panic!("invalid trimode configuration: {}", msg);
    }

    let mut out = String::new();
    let q = &config.queue;
    let d = &config.debounce;
    let l = &config.link;
    let _ = writeln!(out, "// Generated by build.rs, do not edit.");
    let _ = writeln!(out, "pub const MODE_EVENT_QUEUE_SIZE: usize = {};", q.mode_event_queue_size);
    let _ = writeln!(out, "pub const LINK_EVENT_QUEUE_SIZE: usize = {};", q.link_event_queue_size);
    let _ = writeln!(out, "pub(crate) const DEBOUNCE_TICK_MS: u64 = {};", d.tick_ms);
    let _ = writeln!(out, "pub(crate) const INSERT_CONFIRM_SAMPLES: u8 = {};", d.insert_confirm_samples);
    let _ = writeln!(out, "pub(crate) const INSERT_MAX_TICKS: u8 = {};", d.insert_max_ticks);
    let _ = writeln!(out, "pub(crate) const REMOVE_CONFIRM_SAMPLES: u8 = {};", d.remove_confirm_samples);
    let _ = writeln!(out, "pub(crate) const REMOVE_MAX_TICKS: u8 = {};", d.remove_max_ticks);
    let _ = writeln!(out, "pub(crate) const CONNECT_INTERVAL_US: u32 = {};", l.connect_interval_us);
    let _ = writeln!(out, "pub(crate) const HEARTBEAT_INTERVAL_US: u32 = {};", l.heartbeat_interval_us);
    let _ = writeln!(out, "pub(crate) const TX_POWER_DBM: i8 = {};", l.tx_power_dbm);
    let _ = writeln!(out, "pub(crate) const PAIR_ATTEMPTS_MAX: u8 = {};", l.pair_attempts_max);
    let _ = writeln!(out, "pub(crate) const RECONNECT_ATTEMPTS_MAX: u8 = {};", l.reconnect_attempts_max);
    let _ = writeln!(out, "pub(crate) const NO_ACTIVITY_TIMEOUT_MS: u64 = {};", l.no_activity_timeout_ms);
    let _ = writeln!(
        out,
        "pub(crate) const NO_ACTIVITY_RECONNECT_THRESHOLD: u8 = {};",
        l.no_activity_reconnect_threshold
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("constants.rs"), out).expect("failed to write constants.rs");
}
