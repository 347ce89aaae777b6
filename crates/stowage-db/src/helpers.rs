/// Quotes an identifier with ANSI double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the `index`th bound parameter, e.g. `:p0`.
pub fn placeholder(index: usize) -> String {
    format!(":p{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("channelName"), "\"channelName\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(placeholder(0), ":p0");
        assert_eq!(placeholder(12), ":p12");
    }
}
