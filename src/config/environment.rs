//! Application environment detection.

/// Environment variable selecting the application environment.
const APP_ENV: &str = "COURIER_APP_ENV";

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Resolve the environment from `COURIER_APP_ENV`, defaulting to production.
    pub fn from_env() -> Self {
        match std::env::var(APP_ENV).as_deref() {
            Ok("development") | Ok("dev") => Environment::Development,
            Ok("test") => Environment::Test,
            _ => Environment::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_production() {
        assert_eq!(Environment::default(), Environment::Production);
        assert_eq!(Environment::Production.as_str(), "production");
    }
}
