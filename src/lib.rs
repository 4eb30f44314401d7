//! azctl: Azure resource strategies and StorSimple migration commands.

pub mod azure;
pub mod commands;
pub mod config;
pub mod output;
pub mod storsimple;
pub mod strategy;

/// Version injected at compile time via AZCTL_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AZCTL_VERSION") {
    Some(v) => v,
    None => "dev",
};
