//! Test-only helpers for the `MOFU_*` environment variables read by [`crate::MofuConfig`].

/// Sets or removes an environment variable until dropped, then restores the old value.
pub struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    /// Sets `key` to `val` for the guard's lifetime.
    ///
    /// # Safety
    ///
    /// Mutating the environment races with other threads; only call from tests
    /// marked `#[serial(env)]`.
    #[must_use]
    pub fn set(key: &'static str, val: &str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env access with #[serial(env)]
        unsafe { std::env::set_var(key, val) };
        Self { key, prev }
    }

    /// Unsets `key` for the guard's lifetime.
    ///
    /// # Safety
    ///
    /// Same caveat as [`EnvGuard::set`].
    #[must_use]
    pub fn remove(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env access with #[serial(env)]
        unsafe { std::env::remove_var(key) };
        Self { key, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: dropped inside the same #[serial(env)] test that created the guard
        match self.prev.take() {
            Some(v) => unsafe { std::env::set_var(self.key, v) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}
