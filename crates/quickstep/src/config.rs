//! Runtime configuration for quickstep.
//!
//! Two process-wide settings are read from the environment, each with an
//! in-process override for tests:
//!
//! - `QUICKSTEP_FEATURE_ROOT`: directory that feature-file identifiers are
//!   resolved against. Defaults to `CARGO_MANIFEST_DIR`, then the current
//!   directory.
//! - `QUICKSTEP_FAIL_ON_CLEANUP`: when truthy, a cleanup fault fails a
//!   scenario whose steps all passed.

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{LazyLock, PoisonError, RwLock};

/// Environment variable naming the feature root directory.
pub const FEATURE_ROOT_ENV: &str = "QUICKSTEP_FEATURE_ROOT";

/// Environment variable controlling whether cleanup faults fail scenarios.
pub const FAIL_ON_CLEANUP_ENV: &str = "QUICKSTEP_FAIL_ON_CLEANUP";

/// A boolean setting read from the environment unless overridden in process.
struct Flag {
    env: &'static str,
    default: bool,
    /// `0` when unset, otherwise `1 + value`.
    forced: AtomicU8,
}

impl Flag {
    const fn new(env: &'static str, default: bool) -> Self {
        Self {
            env,
            default,
            forced: AtomicU8::new(0),
        }
    }

    fn get(&self) -> bool {
        match self.forced.load(Ordering::Relaxed) {
            0 => std::env::var(self.env)
                .ok()
                .as_deref()
                .and_then(parse_env_bool)
                .unwrap_or(self.default),
            forced => forced == 2,
        }
    }

    fn force(&self, value: bool) {
        self.forced.store(1 + u8::from(value), Ordering::Relaxed);
    }

    fn release(&self) {
        self.forced.store(0, Ordering::Relaxed);
    }
}

/// Cleanup faults are reported on the scenario but only fail it when this
/// flag is on. A scenario whose steps failed keeps its step error either way.
static FAIL_ON_CLEANUP: Flag = Flag::new(FAIL_ON_CLEANUP_ENV, false);

static FEATURE_ROOT_OVERRIDE: LazyLock<RwLock<Option<Utf8PathBuf>>> =
    LazyLock::new(|| RwLock::new(None));

fn parse_env_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    let is = |words: [&str; 4]| words.iter().any(|word| word.eq_ignore_ascii_case(value));
    if is(["1", "true", "yes", "on"]) {
        Some(true)
    } else if is(["0", "false", "no", "off"]) {
        Some(false)
    } else {
        None
    }
}

/// Whether a cleanup fault fails a scenario whose steps all passed.
///
/// Reads [`FAIL_ON_CLEANUP_ENV`] unless [`set_fail_on_cleanup`] is in effect.
#[must_use]
pub fn fail_on_cleanup() -> bool {
    FAIL_ON_CLEANUP.get()
}

/// Decide in process whether cleanup faults fail passing scenarios.
pub fn set_fail_on_cleanup(enabled: bool) {
    FAIL_ON_CLEANUP.force(enabled);
}

/// Go back to reading [`FAIL_ON_CLEANUP_ENV`].
pub fn clear_fail_on_cleanup_override() {
    FAIL_ON_CLEANUP.release();
}

fn env_path(name: &str) -> Option<Utf8PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Utf8PathBuf::from)
}

/// Directory that relative feature-file identifiers are resolved against.
#[must_use]
pub fn feature_root() -> Utf8PathBuf {
    FEATURE_ROOT_OVERRIDE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .or_else(|| env_path(FEATURE_ROOT_ENV))
        .or_else(|| env_path("CARGO_MANIFEST_DIR"))
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

/// Override the feature root for the current process.
pub fn set_feature_root(root: impl Into<Utf8PathBuf>) {
    *FEATURE_ROOT_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(root.into());
}

/// Remove any in-process override for the feature root.
pub fn clear_feature_root_override() {
    *FEATURE_ROOT_OVERRIDE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Resolve a feature-file identifier against [`feature_root`].
///
/// Absolute identifiers are returned unchanged.
#[must_use]
pub fn resolve_feature_path(identifier: &Utf8Path) -> Utf8PathBuf {
    if identifier.is_absolute() {
        identifier.to_path_buf()
    } else {
        feature_root().join(identifier)
    }
}
