//! Selection of the passes a run applies.

use tracing::warn;

pub const AST_NORMALIZE: &str = "ast-normalize";
pub const CANONICAL_CHECK: &str = "canonical-check";

/// Environment variable holding a comma-separated list of passes to skip.
pub const SKIP_PASSES_ENV: &str = "AVM2_NORMALIZE_SKIP_PASSES";

/// Which passes run. Everything is enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    pub ast_normalize: bool,
    pub canonical_check: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        PassConfig { ast_normalize: true, canonical_check: true }
    }
}

impl PassConfig {
    /// Defaults with the named passes turned off. Unknown names are logged
    /// and ignored.
    pub fn from_skip_list<S: AsRef<str>>(skips: &[S]) -> Self {
        let mut config = PassConfig::default();
        for name in skips {
            config.skip(name.as_ref());
        }
        config
    }

    /// Builds the configuration from, in order:
    /// 1. the defaults
    /// 2. passes listed in `AVM2_NORMALIZE_SKIP_PASSES`
    /// 3. the explicit `skips` (e.g. repeated `--skip-pass` flags)
    pub fn from_env_or_default<S: AsRef<str>>(skips: &[S]) -> Self {
        let env = std::env::var(SKIP_PASSES_ENV).ok();
        Self::from_sources(env.as_deref(), skips)
    }

    fn from_sources<S: AsRef<str>>(env: Option<&str>, skips: &[S]) -> Self {
        let mut config = PassConfig::default();
        if let Some(list) = env {
            for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                config.skip(name);
            }
        }
        for name in skips {
            config.skip(name.as_ref());
        }
        config
    }

    /// Turns the canonical check back on when a caller needs its verdict,
    /// whatever the skip lists said.
    pub fn require_canonical_check(mut self) -> Self {
        if !self.canonical_check {
            warn!("Pass '{}' was skipped but a check was requested, running it anyway", CANONICAL_CHECK);
            self.canonical_check = true;
        }
        self
    }

    fn skip(&mut self, name: &str) {
        match name.trim().to_lowercase().as_str() {
            AST_NORMALIZE => self.ast_normalize = false,
            CANONICAL_CHECK => self.canonical_check = false,
            other => warn!("Unknown pass '{}' in skip list, ignoring", other),
        }
    }
}
