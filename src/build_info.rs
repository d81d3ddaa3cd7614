//! Build metadata embedded by `build.rs`

use serde::Serialize;

/// Version, build counter and compile time of the running binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_number: build_number(option_env!("COACHPLAN_BUILD_NUMBER")),
            build_timestamp: option_env!("COACHPLAN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        }
    }
}

/// Missing or malformed counters read as build 0
fn build_number(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("CoachPlan nutrition planner v{} (build {}, {})", info.version, info.build_number, info.build_timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_number() {
        assert_eq!(build_number(Some("42")), 42);
        assert_eq!(build_number(Some("4a")), 0);
        assert_eq!(build_number(None), 0);
    }
}
