//! Input validation utilities

use regex::Regex;
use once_cell::sync::Lazy;

/// Regex for validating host names and IP addresses
static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\[][a-zA-Z0-9._:\[\]-]*$").unwrap()
});

/// Regex for validating property names
static PROPERTY_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9._-]*$").unwrap()
});

/// Validate a host name (DNS name, IPv4 or bracketed/plain IPv6 address)
pub fn validate_hostname(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.len() <= 255 && HOSTNAME_REGEX.is_match(hostname)
}

/// Validate a single group name (one path segment)
pub fn validate_group_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 255 && !name.contains('/')
}

/// Validate a property name
pub fn validate_property_name(name: &str) -> bool {
    name.len() <= 255 && PROPERTY_NAME_REGEX.is_match(name)
}

/// Whether a CSV row is commented out (its first cell starts with `#`)
pub fn is_comment_cell(cell: &str) -> bool {
    cell.trim_start().starts_with('#')
}
