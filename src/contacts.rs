//! Contact-channel helpers shared by the script generator and the channel
//! recommender.

use crate::models::RawLead;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::OnceLock;

/// True when the value is present and not just whitespace.
pub fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Validate and normalize Brazilian phone number
///
/// Parses with the BR region and returns the E.164 form (+5511987654321).
///
/// Returns: (is_valid, normalized_phone_or_error_msg)
pub fn validate_br_phone(raw: &str) -> (bool, String) {
    if raw.trim().is_empty() || raw.len() < 8 {
        return (false, "Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::BR), raw) {
        Ok(number) => {
            if phonenumber::is_valid(&number) {
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("Valid BR phone: {} -> {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::debug!("Invalid BR phone number: {}", raw);
                (false, "Invalid Brazilian phone number".to_string())
            }
        }
        Err(e) => {
            tracing::debug!("Failed to parse BR phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// Click-to-chat link for the lead's WhatsApp, falling back to its phone.
///
/// Returns `None` when neither number validates as Brazilian.
pub fn whatsapp_link(lead: &RawLead) -> Option<String> {
    [lead.whatsapp.as_deref(), lead.phone.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|raw| match validate_br_phone(raw) {
            (true, e164) => Some(format!("https://wa.me/{}", e164.trim_start_matches('+'))),
            _ => None,
        })
}

fn instagram_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?(?:instagram\.com/)?@?([A-Za-z0-9._]{1,30})/?(?:\?.*)?$")
            .expect("instagram pattern is valid")
    })
}

/// Normalizes an Instagram handle or profile URL to `@handle`.
pub fn normalize_instagram(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    instagram_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("@{}", m.as_str()))
}
