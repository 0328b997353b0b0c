//! HMAC-signed confirmation codes.
//!
//! A code reads `<issued-at, base36>-<hmac, hex>`. The MAC covers the issue
//! time plus the user's identity, role and last login, so a code stops
//! verifying once any of those change. Nothing is stored server-side.

use chrono::{DateTime, Duration, Utc};
use domains::{ConfirmationCodes, User};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters of the MAC kept in the code.
const MAC_HEX_LEN: usize = 20;

pub struct HmacCodes {
    secret: Vec<u8>,
    ttl: Duration,
}

impl HmacCodes {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    fn mac(&self, user: &User, issued_at: i64) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        let last_login = user
            .last_login
            .map(|t| t.timestamp_micros().to_string())
            .unwrap_or_default();
        mac.update(
            format!(
                "{}|{}|{}|{}|{}|{}",
                user.id, user.username, user.email, user.role, last_login, issued_at
            )
            .as_bytes(),
        );
        Some(mac)
    }

    pub fn make_code_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let issued_at = now.timestamp();
        let digest = self
            .mac(user, issued_at)
            .map(|m| hex::encode(m.finalize().into_bytes()))
            .unwrap_or_default();
        let short = digest.get(..MAC_HEX_LEN).unwrap_or_default();
        format!("{}-{}", to_base36(issued_at.unsigned_abs()), short)
    }

    pub fn check_code_at(&self, user: &User, code: &str, now: DateTime<Utc>) -> bool {
        let Some((stamp, digest)) = code.split_once('-') else {
            return false;
        };
        let Some(issued_at) = from_base36(stamp).and_then(|t| i64::try_from(t).ok()) else {
            return false;
        };
        let Ok(expected) = hex::decode(digest) else {
            return false;
        };
        if digest.len() != MAC_HEX_LEN {
            return false;
        }
        let Some(mac) = self.mac(user, issued_at) else {
            return false;
        };
        if mac.verify_truncated_left(&expected).is_err() {
            tracing::debug!(user_id = user.id, "confirmation code signature mismatch");
            return false;
        }
        let age = now.timestamp() - issued_at;
        if age < 0 || age > self.ttl.num_seconds() {
            tracing::debug!(user_id = user.id, age, "confirmation code expired");
            return false;
        }
        true
    }
}

impl ConfirmationCodes for HmacCodes {
    fn make_code(&self, user: &User) -> String {
        self.make_code_at(user, Utc::now())
    }

    fn check_code(&self, user: &User, code: &str) -> bool {
        self.check_code_at(user, code, Utc::now())
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(text: &str) -> Option<u64> {
    if text.is_empty() || text.len() > 13 {
        return None;
    }
    u64::from_str_radix(text, 36).ok()
}
