//! Test utilities used across integration and unit tests.
//!
//! Environment variables are process-wide, so every mutation goes through a
//! shared mutex to keep parallel tests from racing.

use std::env;
use std::ffi::OsStr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Set an environment variable while holding the global lock.
pub fn set_var<K: AsRef<OsStr>, V: AsRef<OsStr>>(key: K, value: V) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::set_var(key, value) };
}

/// Remove an environment variable while holding the global lock.
pub fn remove_var<K: AsRef<OsStr>>(key: K) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::remove_var(key) };
}

/// Read an environment variable while holding the global lock.
///
/// # Errors
///
/// Returns [`env::VarError`] when the variable is unset or not Unicode.
pub fn var<K: AsRef<OsStr>>(key: K) -> Result<String, env::VarError> {
    let _guard = lock();
    env::var(key)
}

/// Clears a set of variables on creation and again on drop.
///
/// ```
/// use effconf::test_utils::{EnvGuard, set_var, var};
///
/// {
///     let _guard = EnvGuard::new(&["EFFCONF_DOC_GUARD"]);
///     set_var("EFFCONF_DOC_GUARD", "1");
/// }
/// assert!(var("EFFCONF_DOC_GUARD").is_err());
/// ```
#[derive(Debug)]
pub struct EnvGuard {
    keys: Vec<&'static str>,
}

impl EnvGuard {
    #[must_use]
    pub fn new(keys: &[&'static str]) -> Self {
        for key in keys {
            remove_var(key);
        }
        Self {
            keys: keys.to_vec(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            remove_var(key);
        }
    }
}
