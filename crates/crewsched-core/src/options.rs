//! Engine construction options.
//!
//! Environment knobs are captured once here and never read at call
//! sites, so two engines built in the same process can disagree about
//! debug output without racing on the environment.

/// Options captured at [`crate::Engine`] construction.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Emit per-iteration diagnostic logs at `debug` level.
    ///
    /// Off by default; enabled via `ENABLE_SCHEDULE_DEBUG`.
    pub debug: bool,
}

impl EngineOptions {
    /// Read options from the process environment.
    ///
    /// `ENABLE_SCHEDULE_DEBUG` is truthy when set to anything other
    /// than the empty string, `"0"` or `"false"`.
    pub fn from_env() -> Self {
        let debug = std::env::var("ENABLE_SCHEDULE_DEBUG")
            .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false);
        Self { debug }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet() {
        assert!(!EngineOptions::default().debug);
    }
}
