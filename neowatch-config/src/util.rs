/// Read and parse a variable. Unset or blank is `None`; a value that fails to
/// parse is reported by name so the caller can surface it.
pub fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, &'static str> {
    match non_empty_var(name) {
        Some(raw) => raw.parse().map(Some).map_err(|_| name),
        None => Ok(None),
    }
}

pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
