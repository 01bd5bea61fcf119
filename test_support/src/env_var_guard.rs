//! Guard for temporarily modifying environment variables in tests.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because they
//! mutate process-global state. Acquire an [`EnvLock`](crate::env_lock::EnvLock)
//! before using the constructors; the guard restores the previous value on
//! drop.
//!
//! ```rust,ignore
//! use test_support::{EnvLock, EnvVarGuard};
//!
//! let _lock = EnvLock::acquire();
//! let _guard = EnvVarGuard::set("MUSUBI_VERBOSE", "true");
//! ```
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
};

/// RAII guard that resets an environment variable to its previous value on drop.
#[derive(Debug)]
pub struct EnvVarGuard {
    name: Cow<'static, str>,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    /// Set `name` to `value` until the guard drops.
    #[must_use]
    pub fn set(name: impl Into<Cow<'static, str>>, value: impl AsRef<OsStr>) -> Self {
        let key = name.into();
        let prev = std::env::var_os(&*key);
        // SAFETY: callers hold `EnvLock`, serialising environment mutation.
        unsafe { std::env::set_var(&*key, value) };
        Self { name: key, prev }
    }

    /// Remove `name` until the guard drops.
    #[must_use]
    pub fn remove(name: impl Into<Cow<'static, str>>) -> Self {
        let key = name.into();
        let prev = std::env::var_os(&*key);
        // SAFETY: callers hold `EnvLock`, serialising environment mutation.
        unsafe { std::env::remove_var(&*key) };
        Self { name: key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held while the prior value is restored.
        unsafe {
            match &self.prev {
                Some(value) => std::env::set_var(&*self.name, value),
                None => std::env::remove_var(&*self.name),
            }
        }
    }
}
