use std::{env, error, fmt, time::Duration};

use log::error;

/// Environment variable naming how long a falling edge is delayed.
pub const ENV_DEBOUNCE: &str = "NETBUSY_DEBOUNCE";

/// Environment variable holding the `env_logger` filter.
pub const ENV_LOG: &str = "NETBUSY_LOG";

pub const DEFAULT_LOG: &str = "warn";

/// Tracks runtime configuration for the activity indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// How long the indicator stays on after activity drops to zero.
    pub debounce: Duration,
}

/// Source of configuration strings.
pub trait Strings {
    fn get(&self, key: &'static str) -> Result<Option<String>, Error>;
}

/// Reads configuration from the process environment.
pub struct Env;

/// Errors produced when loading a `Config`.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    InvalidEnvVar { key: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    NotADuration,
}

// ===== impl Config =====

impl Default for Config {
    fn default() -> Self {
        Config {
            debounce: netbusy_counter::DEFAULT_DEBOUNCE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::load(&Env)
    }

    /// Builds a config from `strings`, using defaults for unset keys.
    pub fn load<S: Strings>(strings: &S) -> Result<Self, Error> {
        let debounce = parse(strings, ENV_DEBOUNCE, parse_duration)?;

        Ok(Config {
            debounce: debounce.unwrap_or(netbusy_counter::DEFAULT_DEBOUNCE),
        })
    }
}

// ===== impl Env =====

impl Strings for Env {
    fn get(&self, key: &'static str) -> Result<Option<String>, Error> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                error!("{} is not valid unicode", key);
                Err(Error::InvalidEnvVar { key })
            }
        }
    }
}

// ===== impl Error =====

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidEnvVar { key } => write!(f, "invalid environment variable {}", key),
        }
    }
}

impl error::Error for Error {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::NotADuration => f.pad("not a duration"),
        }
    }
}

impl error::Error for ParseError {}

// ===== Parsing =====

fn parse<S, T, Parse>(strings: &S, key: &'static str, parse: Parse) -> Result<Option<T>, Error>
where
    S: Strings,
    Parse: FnOnce(&str) -> Result<T, ParseError>,
{
    match strings.get(key)? {
        Some(ref s) => {
            let r = parse(s).map_err(|parse_error| {
                error!("{}={:?} is not valid: {}", key, s, parse_error);
                Error::InvalidEnvVar { key }
            })?;
            Ok(Some(r))
        }
        None => Ok(None),
    }
}

/// Parses a `humantime` duration such as `170ms`, `2s` or `1m 30s`. A bare
/// number is milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration, ParseError> {
    let s = s.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let millis: u64 = s.parse().map_err(|_| ParseError::NotADuration)?;
        return Ok(Duration::from_millis(millis));
    }

    humantime::parse_duration(s).map_err(|_| ParseError::NotADuration)
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::collections::HashMap;

    use super::{Error, Strings};

    #[derive(Default)]
    pub struct TestEnv {
        values: HashMap<&'static str, String>,
    }

    impl TestEnv {
        pub fn put(&mut self, key: &'static str, value: &str) {
            self.values.insert(key, value.to_owned());
        }
    }

    impl Strings for TestEnv {
        fn get(&self, key: &'static str) -> Result<Option<String>, Error> {
            Ok(self.values.get(key).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::test_util::TestEnv;
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("170"), Ok(Duration::from_millis(170)));
        assert_eq!(parse_duration("170ms"), Ok(Duration::from_millis(170)));
        assert_eq!(parse_duration(" 2s "), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m 30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("3m"), Ok(Duration::from_secs(180)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3_600)));
        assert_eq!(parse_duration("1d"), Ok(Duration::from_secs(86_400)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), Err(ParseError::NotADuration));
        assert_eq!(parse_duration("-5ms"), Err(ParseError::NotADuration));
        assert_eq!(parse_duration("1.5s"), Err(ParseError::NotADuration));
        assert_eq!(parse_duration("10 parsecs"), Err(ParseError::NotADuration));
        assert_eq!(
            parse_duration("99999999999999999999"),
            Err(ParseError::NotADuration)
        );
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::load(&TestEnv::default()).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.debounce, Duration::from_millis(170));
    }

    #[test]
    fn reads_debounce() {
        let mut env = TestEnv::default();
        env.put(ENV_DEBOUNCE, "250ms");
        let config = Config::load(&env).expect("config");
        assert_eq!(config.debounce, Duration::from_millis(250));
    }

    #[test]
    fn invalid_debounce_names_the_key() {
        let mut env = TestEnv::default();
        env.put(ENV_DEBOUNCE, "soon");
        assert_eq!(
            Config::load(&env),
            Err(Error::InvalidEnvVar { key: ENV_DEBOUNCE })
        );
    }
}
