use serde::{Deserialize, Serialize};

use fieldops_core::{OrganizationId, UserId};

/// Kind of a session token.
///
/// Access and refresh tokens are structurally identical; the kind is the only
/// thing that stops one being used in place of the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried inside a signed session token.
///
/// Never persisted. `iat` and `exp` are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    /// Role name at issue time.
    pub role: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id; two tokens issued in the same second still differ.
    pub jti: String,
}

impl Claims {
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenKind::Access
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenKind::Refresh
    }
}
