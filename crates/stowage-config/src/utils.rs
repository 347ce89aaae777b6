use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{ConfigError, Result};

pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Returns `$XDG_CONFIG_HOME`, or `$HOME/.config` when unset.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns `$XDG_DATA_HOME`, or `$HOME/.local/share` when unset.
pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Expands `~` and `$VAR` / `${VAR}` in a path and makes it absolute.
///
/// `:memory:` is passed through untouched so an in-memory store can be
/// configured like any other path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ConfigError::EmptyStorePath);
    }
    if path == ":memory:" {
        return Ok(PathBuf::from(path));
    }

    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                let braced = chars.peek() == Some(&'{');
                if braced {
                    chars.next();
                }
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if braced && c == '}' {
                        chars.next();
                        break;
                    }
                    if !braced && !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    result.push('$');
                    continue;
                }
                let value = env::var(&name).map_err(|_| {
                    ConfigError::MissingEnvVar {
                        var: name.clone(),
                        input: path.to_string(),
                    }
                })?;
                result.push_str(&value);
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    let resolved = PathBuf::from(result);
    if resolved.is_absolute() {
        Ok(resolved)
    } else {
        Ok(env::current_dir()?.join(resolved))
    }
}

/// Parses a duration string such as `1h30m`, `45s` or `250ms`.
///
/// Returns `None` for empty input, unknown units or overflow.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    let mut chars = input.trim().chars().peekable();

    chars.peek()?;

    while chars.peek().is_some() {
        let mut number = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                number.push(chars.next()?);
            } else {
                break;
            }
        }
        if number.is_empty() {
            return None;
        }
        let number: u64 = number.parse().ok()?;

        let multiplier = match chars.next()? {
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            's' => 1000,
            'm' => 60 * 1000,
            'h' => 60 * 60 * 1000,
            'd' => 24 * 60 * 60 * 1000,
            _ => return None,
        };

        total = total.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(Duration::from_millis(total))
}

pub fn is_memory_path(path: &Path) -> bool {
    path.as_os_str() == ":memory:"
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::test_utils::with_env;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1s"), Some(Duration::from_secs(1)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("1x"), None);
    }

    #[test]
    #[serial]
    fn test_resolve_path_expands_variables() {
        with_env(vec![("STOWAGE_TEST_DIR", "/var/lib/stowage")], || {
            let path = resolve_path("$STOWAGE_TEST_DIR/store.db").unwrap();
            assert_eq!(path, PathBuf::from("/var/lib/stowage/store.db"));

            let path = resolve_path("${STOWAGE_TEST_DIR}/x.db").unwrap();
            assert_eq!(path, PathBuf::from("/var/lib/stowage/x.db"));
        });
    }

    #[test]
    #[serial]
    fn test_resolve_path_home() {
        with_env(vec![("HOME", "/home/stowage")], || {
            let path = resolve_path("~/data/store.db").unwrap();
            assert_eq!(path, PathBuf::from("/home/stowage/data/store.db"));
        });
    }

    #[test]
    fn test_resolve_path_errors() {
        assert!(matches!(resolve_path("  "), Err(ConfigError::EmptyStorePath)));
        assert!(matches!(
            resolve_path("$STOWAGE_SURELY_UNDEFINED_VAR/a"),
            Err(ConfigError::MissingEnvVar { .. })
        ));
    }

    #[test]
    fn test_memory_path_passthrough() {
        let path = resolve_path(":memory:").unwrap();
        assert!(is_memory_path(&path));
    }
}
