use url::Url;

use crate::error::ConfigError;

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub fn parse_endpoint(input: &str) -> Result<Url, ConfigError> {
    if input.trim().is_empty() {
        return Err(ConfigError::MissingEndpoint);
    }
    let normalized = normalize_url(input);
    Url::parse(&normalized).map_err(|_| ConfigError::InvalidEndpoint(input.trim().to_string()))
}

pub fn strip_bom(header: &str) -> &str {
    header.trim_start_matches('\u{feff}')
}
