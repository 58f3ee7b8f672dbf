//! Bearer-token helpers for integration tests.
//!
//! Mints real access tokens with a test secret so requests go through the
//! same `Caller` extraction as production traffic.

use http::{HeaderName, HeaderValue, header::AUTHORIZATION};

use yamdb_auth_types::token::issue_access_token;

/// Secret shared between the app under test and [`TestAuth`].
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

/// Identity injected into test requests.
///
/// The token names an account only; seed the account first, since its role is
/// read from storage on every request.
pub struct TestAuth {
    pub user_id: i32,
}

impl TestAuth {
    pub fn new(user_id: i32) -> Self {
        Self { user_id }
    }

    pub fn token(&self) -> String {
        let (token, _) = issue_access_token(self.user_id, TEST_JWT_SECRET, 3600)
            .expect("sign test token");
        token
    }

    /// `Authorization: Bearer <token>` header pair.
    pub fn header(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token()))
            .expect("bearer header value");
        (AUTHORIZATION, value)
    }
}
