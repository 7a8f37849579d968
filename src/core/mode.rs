//! Development/production switch.

/// Environment variable selecting the mode.
pub const MODE_ENV: &str = "KILN_ENV";

/// Runtime mode.
///
/// Production minifies bundles, reads them from the embedded snapshot when one
/// is registered, and never injects the hot reload script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Read the mode from `KILN_ENV`.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(MODE_ENV).ok().as_deref())
    }

    /// `production` selects production; anything else is development.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    #[inline]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value() {
        assert_eq!(Mode::from_value(Some("production")), Mode::Production);
        assert_eq!(Mode::from_value(Some(" Production ")), Mode::Production);
        assert_eq!(Mode::from_value(Some("prod")), Mode::Development);
        assert_eq!(Mode::from_value(Some("")), Mode::Development);
        assert_eq!(Mode::from_value(None), Mode::Development);
    }

    #[test]
    fn test_predicates() {
        assert!(Mode::Production.is_production());
        assert!(Mode::Development.is_dev());
        assert_eq!(Mode::default(), Mode::Development);
    }
}
