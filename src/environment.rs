use std::{collections::HashMap, env, hash::BuildHasher};

/// A set value that is not valid Unicode, carrying its lossy rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotUnicode(pub String);

/// A read-only source of environment values, looked up by exact key
///
/// An empty value is indistinguishable from an unset one: implementations
/// return `Ok(None)` for both.
pub trait EnvSource {
    fn get(&self, key: &str) -> Result<Option<String>, NotUnicode>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Result<Option<String>, NotUnicode> {
        // env::var_os panics on these
        if key.is_empty() || key.contains(['=', '\0']) {
            return Ok(None);
        }

        match env::var_os(key) {
            None => Ok(None),
            Some(value) => match value.into_string() {
                Ok(value) if value.is_empty() => Ok(None),
                Ok(value) => Ok(Some(value)),
                Err(raw) => Err(NotUnicode(raw.to_string_lossy().into_owned())),
            },
        }
    }
}

/// An environment with nothing set
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnv;

impl EnvSource for EmptyEnv {
    fn get(&self, _key: &str) -> Result<Option<String>, NotUnicode> {
        Ok(None)
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Result<Option<String>, NotUnicode> {
        Ok(HashMap::get(self, key)
            .filter(|value| !value.is_empty())
            .cloned())
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn get(&self, key: &str) -> Result<Option<String>, NotUnicode> {
        (**self).get(key)
    }
}

/// Load a `.env` file from the working directory into the process environment
///
/// Returns whether a file was loaded. A missing file is not an error; a file
/// that exists but cannot be parsed is logged and otherwise ignored.
pub fn load_dotenv() -> bool {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded environment file");
            true
        }
        Err(err) if err.not_found() => false,
        Err(err) => {
            tracing::warn!(error = %err, "failed to load environment file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_lookup() {
        let env = map(&[("HTTP_PORT", "8080")]);
        assert_eq!(EnvSource::get(&env, "HTTP_PORT"), Ok(Some("8080".to_string())));
    }

    #[test]
    fn test_map_lookup_is_case_sensitive() {
        let env = map(&[("HTTP_PORT", "8080")]);
        assert_eq!(EnvSource::get(&env, "http_port"), Ok(None));
    }

    #[test]
    fn test_map_empty_value_is_unset() {
        let env = map(&[("DB_CONN_STRING", "")]);
        assert_eq!(EnvSource::get(&env, "DB_CONN_STRING"), Ok(None));
    }

    #[test]
    fn test_empty_env() {
        assert_eq!(EmptyEnv.get("ANYTHING"), Ok(None));
    }

    #[test]
    fn test_process_env_unset_key() {
        assert_eq!(ProcessEnv.get("ENVBIND_SURELY_UNSET_KEY_4711"), Ok(None));
    }

    #[test]
    fn test_process_env_invalid_keys_are_unset() {
        assert_eq!(ProcessEnv.get(""), Ok(None));
        assert_eq!(ProcessEnv.get("A=B"), Ok(None));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_env_non_unicode_value_is_reported() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        unsafe {
            env::set_var("ENVBIND_NON_UNICODE_LOOKUP", OsStr::from_bytes(&[0xff, b'A']));
        }

        assert_eq!(
            ProcessEnv.get("ENVBIND_NON_UNICODE_LOOKUP"),
            Err(NotUnicode("\u{FFFD}A".to_string()))
        );

        unsafe {
            env::remove_var("ENVBIND_NON_UNICODE_LOOKUP");
        }
    }

    #[test]
    fn test_reference_forwards() {
        let env = map(&[("KEY", "value")]);
        let by_ref: &dyn EnvSource = &env;
        assert_eq!((&by_ref).get("KEY"), Ok(Some("value".to_string())));
    }
}
