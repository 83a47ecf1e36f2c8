use actix_web::{http::header::HeaderValue, HttpRequest};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::num::ParseIntError;

use crate::schemas::UserId;

type HmacSha256 = Hmac<Sha256>;

/// The identity the out-of-scope auth service vouched for. The engine only
/// ever sees this explicit value, never ambient session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct AuthToken {
    user_id: String,
    name: String,
    hmac: String,
}

/// Verify the signed identity in the `Authorization` header. The token is
/// a JSON object `{userId, name, hmac}` minted by the auth service, where
/// `hmac` is hex HMAC-SHA256 over the canonical field lines with a key
/// derived from the shared secret.
pub fn authenticated_user(request: &HttpRequest, secret: &str) -> Option<AuthenticatedUser> {
    let authorization = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    verify_token(authorization, secret)
}

pub fn verify_token(token: &str, secret: &str) -> Option<AuthenticatedUser> {
    let token: AuthToken = serde_json::from_str(token).ok()?;
    let signature = token
        .hmac
        .chars()
        .collect::<Vec<_>>()
        .chunks(2)
        .map(|n| u8::from_str_radix(&String::from_iter(n), 16))
        .collect::<Result<Vec<u8>, ParseIntError>>()
        .ok()?;
    if compute_signature(&token.user_id, &token.name, secret) == signature {
        Some(AuthenticatedUser {
            id: token.user_id,
            name: token.name,
        })
    } else {
        None
    }
}

/// Build the header value the auth service would mint for this user. The
/// server side only needs it for local tooling and tests.
pub fn mint_token(user_id: &str, name: &str, secret: &str) -> String {
    let signature = compute_signature(user_id, name, secret)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    serde_json::json!({
        "userId": user_id,
        "name": name,
        "hmac": signature,
    })
    .to_string()
}

fn compute_signature(user_id: &str, name: &str, secret: &str) -> Vec<u8> {
    // Fields are signed as "key=value" lines in alphabetical order.
    let content = format!("name={name}\nuserId={user_id}");
    let mut sha256_hasher = Sha256::new();
    sha256_hasher.update(secret.as_bytes());
    let key = sha256_hasher.finalize();

    let mut hmac_hasher =
        HmacSha256::new_from_slice(&key).expect("hmac can take a key of any size");
    hmac_hasher.update(content.as_bytes());
    hmac_hasher.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_verify() {
        let token = mint_token("alice", "Alice", "secret");
        let user = verify_token(&token, "secret").unwrap();
        assert_eq!(user.id, "alice");
        assert_eq!(user.name, "Alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint_token("alice", "Alice", "secret");
        assert_eq!(verify_token(&token, "other"), None);
    }

    #[test]
    fn tampered_identity_is_rejected() {
        let token = mint_token("alice", "Alice", "secret");
        let tampered = token.replace("alice", "mallory");
        assert_eq!(verify_token(&tampered, "secret"), None);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert_eq!(verify_token("not json", "secret"), None);
        assert_eq!(
            verify_token(r#"{"userId":"a","name":"A","hmac":"zz"}"#, "secret"),
            None
        );
    }
}
