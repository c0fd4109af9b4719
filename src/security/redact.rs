//! Redaction of SAS credentials from messages.
//!
//! Request URLs carry the SAS token as their query string, and HTTP client
//! errors print the URL they failed on. Every message that may end up in
//! the terminal or in the uploaded run log is passed through
//! [`redact_sas`] first.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SAS_PATTERNS: Vec<(Regex, &'static str)> = vec![
        // Signature: the only part of a SAS token that grants access
        (Regex::new(r"(?i)\b(sig)=([^&\s'\x22)]+)").unwrap(),
         "$1=<REDACTED>"),

        // Delegation key fields of user-delegation SAS tokens
        (Regex::new(r"(?i)\b(skoid|sktid|skv)=([^&\s'\x22)]+)").unwrap(),
         "$1=<REDACTED>"),

        // Basic auth in URLs
        (Regex::new(r"(https?://)([^:/\s]+):([^@\s]+)@").unwrap(),
         "$1<REDACTED_USER>:<REDACTED_PASS>@"),
    ];
}

/// Replace SAS signatures and URL credentials in `input` with placeholders.
///
/// ```
/// use disk_uploader::security::redact::redact_sas;
///
/// let input = "error sending request for url (https://acct.blob.core.windows.net/host?sv=2021-08-06&sig=abc%2Bdef)";
/// assert_eq!(
///     redact_sas(input),
///     "error sending request for url (https://acct.blob.core.windows.net/host?sv=2021-08-06&sig=<REDACTED>)"
/// );
/// ```
pub fn redact_sas(input: &str) -> String {
    let mut result = input.to_string();

    for (pattern, replacement) in SAS_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    result
}

/// Format `context: error` with credentials redacted.
pub fn safe_error_message(context: &str, error: &impl std::fmt::Display) -> String {
    redact_sas(&format!("{}: {}", context, error))
}
