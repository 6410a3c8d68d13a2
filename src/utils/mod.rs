use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::domain::AppError;

/// Check that the input parses as an absolute http(s) URL with a host
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Resolve an href against the page it was found on.
/// Absolute hrefs come back unchanged.
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    if Url::parse(href).is_ok() {
        return Some(href.to_string());
    }
    page_url.join(href).ok().map(String::from)
}

/// Validate the destination folder entered by the user
pub fn validate_folder_name(name: &str) -> Result<PathBuf, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidFolder("folder name is empty".to_string()));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    if name
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '\\' | '|' | '?' | '*'))
    {
        return Err(AppError::InvalidFolder(format!(
            "'{}' contains characters not allowed in a folder name",
            name
        )));
    }

    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(AppError::InvalidFolder(format!(
            "'{}' must not contain '.' or '..'",
            name
        )));
    }

    Ok(path.to_path_buf())
}
