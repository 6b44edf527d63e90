// Copyright (c) 2024 Mike Tsao. All rights reserved.

/// A string that's useful for displaying build information to end users.
/// Release builds can set `GIT_DESCRIBE` or `GIT_REV_PARSE` at compile time;
/// otherwise this is the package version.
pub fn app_version() -> &'static str {
    option_env!("GIT_DESCRIBE")
        .or(option_env!("GIT_REV_PARSE"))
        .unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_never_empty() {
        assert!(!app_version().is_empty());
    }
}
