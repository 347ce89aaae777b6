#[cfg(test)]
pub fn with_env<F>(vars: Vec<(&str, &str)>, f: F)
where
    F: FnOnce(),
{
    let old_vars: Vec<_> = vars
        .iter()
        .map(|(k, _)| (*k, std::env::var(k).ok()))
        .collect();

    for (key, value) in &vars {
        std::env::set_var(key, value);
    }

    f();

    for (key, old_value) in old_vars {
        match old_value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}

#[cfg(test)]
pub fn without_env<F>(keys: &[&str], f: F)
where
    F: FnOnce(),
{
    let old_vars: Vec<_> = keys.iter().map(|k| (*k, std::env::var(k).ok())).collect();

    for key in keys {
        std::env::remove_var(key);
    }

    f();

    for (key, old_value) in old_vars {
        if let Some(v) = old_value {
            std::env::set_var(key, v);
        }
    }
}
