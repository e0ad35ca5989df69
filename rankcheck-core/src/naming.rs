//! Tenant name rules.
//!
//! Tenant names become host names (`{name}.{domain}`), so only lowercase
//! ASCII letters, digits and inner hyphens are allowed, 2 to 63 characters,
//! starting with a letter.

use std::sync::LazyLock;

use regex::Regex;

static TENANT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{0,61}[a-z0-9]$").unwrap());

pub fn is_valid_tenant_name(name: &str) -> bool {
    TENANT_NAME_RE.is_match(name)
}

/// Derive the per-run tenant name from a prefix and run sequence number.
pub fn run_tenant_name(prefix: &str, run: u64) -> String {
    format!("{prefix}-{run}")
}
