//! Stateless confirmation codes.
//!
//! Code format: `<issued-at, base36 seconds>-<tag>` where `tag` is the first
//! 16 bytes of HMAC-SHA256 over the account fields below and the issue time,
//! base64url-encoded without padding. Nothing is stored; a code is valid while
//! it is younger than the TTL and the account fields still match. Token
//! exchange stamps `last_login`, which retires every earlier code.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::repository::ConfirmationCodes;
use crate::domain::types::User;

const TAG_LENGTH: usize = 16;

/// Codes issued up to this many seconds in the future are still accepted.
const CLOCK_SKEW_SECS: i64 = 60;

#[derive(Clone)]
pub struct HmacConfirmationCodes {
    mac: Arc<Hmac<Sha256>>,
    ttl_secs: i64,
}

impl HmacConfirmationCodes {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: Arc::new(Hmac::<Sha256>::new_from_slice(secret)?),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    fn keyed(&self, user: &User, issued_at: i64) -> Hmac<Sha256> {
        let mut mac = (*self.mac).clone();
        let id = user.id.to_string();
        let last_login = user
            .last_login
            .map(|t| t.timestamp_micros().to_string())
            .unwrap_or_default();
        let issued_at = issued_at.to_string();
        for field in [
            id.as_str(),
            user.username.as_str(),
            user.email.as_str(),
            last_login.as_str(),
            issued_at.as_str(),
        ] {
            mac.update(field.as_bytes());
            mac.update(&[0]);
        }
        mac
    }
}

impl ConfirmationCodes for HmacConfirmationCodes {
    fn issue(&self, user: &User, now: DateTime<Utc>) -> String {
        let issued_at = now.timestamp().max(0);
        let tag = self.keyed(user, issued_at).finalize().into_bytes();
        format!(
            "{}-{}",
            to_base36(issued_at as u64),
            URL_SAFE_NO_PAD.encode(&tag[..TAG_LENGTH])
        )
    }

    fn verify(&self, user: &User, code: &str, now: DateTime<Utc>) -> bool {
        let Some((stamp, tag)) = code.split_once('-') else {
            return false;
        };
        let Some(issued_at) = u64::from_str_radix(stamp, 36)
            .ok()
            .and_then(|v| i64::try_from(v).ok())
        else {
            return false;
        };
        let age = now.timestamp() - issued_at;
        if age > self.ttl_secs || age < -CLOCK_SKEW_SECS {
            return false;
        }
        let Ok(tag) = URL_SAFE_NO_PAD.decode(tag) else {
            return false;
        };
        if tag.len() != TAG_LENGTH {
            return false;
        }
        self.keyed(user, issued_at)
            .verify_truncated_left(&tag)
            .is_ok()
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
