//! Verification-code issuance for external profile claims.
//!
//! The proof is deliberately weak: the user places a short-lived code in the
//! public biography of the claimed profile, and we check for it as a
//! substring. It proves control of the account without credentials or an API
//! integration; anyone who can edit the bio during the 24-hour window can
//! pass it. That tradeoff is part of the contract, not something to upgrade.

use chrono::{DateTime, Duration, Utc};

use crate::token::random_token;

/// Prefix every verification code carries.
pub const CODE_PREFIX: &str = "solvetrack";

/// How long an issued code stays valid.
pub const CODE_TTL_HOURS: i64 = 24;

/// A fresh code: `solvetrack-<6 lowercase alphanumerics>-<unix millis>`.
/// The random token makes it unguessable, the timestamp makes it unique per
/// issuance.
pub fn generate_verification_code() -> String {
    format!(
        "{CODE_PREFIX}-{}-{}",
        random_token(6),
        Utc::now().timestamp_millis()
    )
}

/// Expiry timestamp for a code issued now.
pub fn code_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::hours(CODE_TTL_HOURS)
}

/// Steps shown to the user after initiating verification.
pub fn verification_instructions() -> Vec<String> {
    [
        "1. Go to your profile settings on the practice site",
        "2. Add this verification code to your profile bio or summary",
        "3. Save your profile changes",
        "4. Come back here and click \"Verify Profile\"",
        "",
        "Note: You can remove the code from your bio after verification is complete.",
        "This verification code expires in 24 hours.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
