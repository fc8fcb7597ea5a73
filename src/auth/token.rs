//! Encrypted, self-contained tokens
//!
//! Tokens are compact JWE envelopes using direct key agreement (`dir`) and
//! `A128CBC-HS256` content encryption:
//!
//! ```text
//! base64url(header) . "" . base64url(iv) . base64url(ciphertext) . base64url(tag)
//! ```
//!
//! The 256-bit key is derived from a passphrase with PBKDF2-HMAC-SHA1. Its
//! first half keys the HMAC-SHA-256 tag, the second half keys AES-128-CBC.

use super::error::TokenError;
use aes::Aes128;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::Sha256;
use std::fmt;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// JWE `alg` header value
pub const ALGORITHM: &str = "dir";
/// JWE `enc` header value
pub const ENCRYPTION: &str = "A128CBC-HS256";
/// Custom claim holding the principal's role strings
pub const ROLES_CLAIM: &str = "roles";

const KDF_ITERATIONS: u32 = 10;
const KEY_LEN: usize = 32;
const HALF_KEY_LEN: usize = KEY_LEN / 2;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;
const REGISTERED_CLAIMS: [&str; 5] = ["sub", "iss", "aud", "iat", "exp"];

/// Symmetric key material for the token envelope
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    fn mac_key(&self) -> &[u8] {
        &self.0[..HALF_KEY_LEN]
    }

    fn enc_key(&self) -> &[u8] {
        &self.0[HALF_KEY_LEN..]
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the envelope key from a passphrase
///
/// The passphrase doubles as the salt, so the same secret always yields the
/// same key on every node.
pub fn derive_key(secret: &str) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha1>(secret.as_bytes(), secret.as_bytes(), KDF_ITERATIONS, &mut key);
    DerivedKey(key)
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    enc: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

/// Claims carried inside a token
///
/// Timestamps are held at whole-second precision, which is what the wire
/// format preserves.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimsSet {
    subject: String,
    issuer: Option<String>,
    audience: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    custom: Map<String, Value>,
}

impl ClaimsSet {
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::default()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn custom_claims(&self) -> &Map<String, Value> {
        &self.custom
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Read a custom claim that must be a list of strings
    ///
    /// Absent or `null` gives `Ok(None)`; any other shape is an error.
    pub fn string_list_claim(&self, name: &str) -> Result<Option<Vec<String>>, TokenError> {
        match self.custom.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        TokenError::InvalidClaims(format!("claim '{}' must only contain strings", name))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(TokenError::InvalidClaims(format!("claim '{}' is not a list", name))),
        }
    }

    /// True when `exp` is not strictly after `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    fn to_payload(&self) -> Payload {
        Payload {
            sub: self.subject.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: self.issued_at.map(|t| t.timestamp()),
            exp: self.expires_at.timestamp(),
            custom: self.custom.clone(),
        }
    }

    fn from_payload(payload: Payload) -> Result<Self, TokenError> {
        ClaimsBuilder {
            subject: Some(payload.sub),
            issuer: payload.iss,
            audience: payload.aud,
            issued_at: payload.iat.map(from_epoch_seconds).transpose()?,
            expires_at: Some(from_epoch_seconds(payload.exp)?),
            custom: payload.custom,
        }
        .build()
    }
}

/// Fluent builder for [`ClaimsSet`]
#[derive(Debug, Default)]
pub struct ClaimsBuilder {
    subject: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    custom: Map<String, Value>,
}

impl ClaimsBuilder {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<ClaimsSet, TokenError> {
        let subject = self
            .subject
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TokenError::InvalidClaims("subject is required".to_string()))?;
        let issued_at = self.issued_at.map(truncate_to_seconds).transpose()?;
        let expires_at = self
            .expires_at
            .ok_or_else(|| TokenError::InvalidClaims("expiration time is required".to_string()))
            .and_then(truncate_to_seconds)?;

        if issued_at.is_some_and(|iat| expires_at <= iat) {
            return Err(TokenError::InvalidClaims(
                "expiration time must be after issued-at time".to_string(),
            ));
        }

        if let Some(name) = self.custom.keys().find(|k| REGISTERED_CLAIMS.contains(&k.as_str())) {
            return Err(TokenError::ReservedClaim(name.clone()));
        }

        Ok(ClaimsSet {
            subject,
            issuer: self.issuer,
            audience: self.audience,
            issued_at,
            expires_at,
            custom: self.custom,
        })
    }
}

/// Encrypt a claims set into a compact token
pub fn encrypt(claims: &ClaimsSet, key: &DerivedKey) -> Result<String, TokenError> {
    let header = serde_json::to_vec(&Header {
        alg: ALGORITHM.to_string(),
        enc: ENCRYPTION.to_string(),
    })?;
    let encoded_header = URL_SAFE_NO_PAD.encode(header);
    let plaintext = serde_json::to_vec(&claims.to_payload())?;

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes128CbcEnc::new_from_slices(key.enc_key(), &iv)
        .map_err(|e| TokenError::Encryption(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

    let tag = mac(key, encoded_header.as_bytes(), &iv, &ciphertext)?
        .finalize()
        .into_bytes();

    Ok(format!(
        "{}..{}.{}.{}",
        encoded_header,
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(&ciphertext),
        URL_SAFE_NO_PAD.encode(&tag[..TAG_LEN]),
    ))
}

/// Verify and decrypt a compact token back into its claims set
pub fn decrypt(token: &str, key: &DerivedKey) -> Result<ClaimsSet, TokenError> {
    let plaintext = open(token, key)?;
    let payload: Payload = serde_json::from_slice(&plaintext)?;
    ClaimsSet::from_payload(payload)
}

/// Verify the envelope and return the raw payload bytes
fn open(token: &str, key: &DerivedKey) -> Result<Vec<u8>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [encoded_header, encrypted_key, iv, ciphertext, tag] = segments.as_slice() else {
        return Err(TokenError::Malformed(format!(
            "expected 5 segments, found {}",
            segments.len()
        )));
    };

    let header: Header = serde_json::from_slice(&decode_segment("header", encoded_header)?)
        .map_err(|e| TokenError::Malformed(format!("invalid header: {}", e)))?;
    if header.alg != ALGORITHM || header.enc != ENCRYPTION {
        return Err(TokenError::UnsupportedHeader {
            alg: header.alg,
            enc: header.enc,
        });
    }

    if !encrypted_key.is_empty() {
        return Err(TokenError::Malformed(
            "encrypted key must be empty for direct encryption".to_string(),
        ));
    }

    let iv = decode_segment("iv", iv)?;
    if iv.len() != IV_LEN {
        return Err(TokenError::Malformed(format!("iv must be {} bytes", IV_LEN)));
    }
    let ciphertext = decode_segment("ciphertext", ciphertext)?;
    let tag = decode_segment("tag", tag)?;
    if tag.len() != TAG_LEN {
        return Err(TokenError::TagMismatch);
    }

    mac(key, encoded_header.as_bytes(), &iv, &ciphertext)?
        .verify_truncated_left(&tag)
        .map_err(|_| TokenError::TagMismatch)?;

    Aes128CbcDec::new_from_slices(key.enc_key(), &iv)
        .map_err(|_| TokenError::Decryption)?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| TokenError::Decryption)
}

/// HMAC over `AAD || IV || ciphertext || AL` where AL is the AAD bit length
fn mac(key: &DerivedKey, aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, TokenError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.mac_key())
        .map_err(|e| TokenError::Encryption(e.to_string()))?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&((aad.len() as u64) * 8).to_be_bytes());
    Ok(mac)
}

fn decode_segment(name: &str, value: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| TokenError::Malformed(format!("{} segment is not base64url", name)))
}

fn from_epoch_seconds(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| TokenError::InvalidClaims(format!("timestamp {} out of range", seconds)))
}

fn truncate_to_seconds(instant: DateTime<Utc>) -> Result<DateTime<Utc>, TokenError> {
    from_epoch_seconds(instant.timestamp())
}

/// Encrypts and decrypts tokens with one derived key
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: DerivedKey,
}

impl TokenCodec {
    pub fn new(key: DerivedKey) -> Self {
        Self { key }
    }

    /// Derive the key from a passphrase. CPU-bound; keep off async workers.
    pub fn from_secret(secret: &str) -> Self {
        Self::new(derive_key(secret))
    }

    pub fn encrypt(&self, claims: &ClaimsSet) -> Result<String, TokenError> {
        encrypt(claims, &self.key)
    }

    pub fn decrypt(&self, token: &str) -> Result<ClaimsSet, TokenError> {
        decrypt(token, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_claims() -> ClaimsSet {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        ClaimsSet::builder()
            .subject("u1")
            .issuer("users")
            .issued_at(now)
            .expires_at(now + Duration::hours(1))
            .claim(ROLES_CLAIM, vec!["ROLE_USER"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_encrypt_and_decrypt() {
        let codec = TokenCodec::from_secret("test-secret");
        let claims = sample_claims();

        let token = codec.encrypt(&claims).unwrap();
        let decrypted = codec.decrypt(&token).unwrap();

        assert_eq!(decrypted, claims);
        assert_eq!(
            decrypted.string_list_claim(ROLES_CLAIM).unwrap(),
            Some(vec!["ROLE_USER".to_string()])
        );
    }

    #[test]
    fn test_compact_envelope_shape() {
        let token = TokenCodec::from_secret("test-secret").encrypt(&sample_claims()).unwrap();
        let segments: Vec<&str> = token.split('.').collect();

        assert_eq!(segments.len(), 5);
        assert!(segments[1].is_empty());

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header, json!({"alg": "dir", "enc": "A128CBC-HS256"}));
        assert_eq!(URL_SAFE_NO_PAD.decode(segments[2]).unwrap().len(), IV_LEN);
        assert_eq!(URL_SAFE_NO_PAD.decode(segments[4]).unwrap().len(), TAG_LEN);
    }

    #[test]
    fn test_payload_uses_registered_claim_names() {
        let key = derive_key("test-secret");
        let token = encrypt(&sample_claims(), &key).unwrap();

        let payload: serde_json::Value = serde_json::from_slice(&open(&token, &key).unwrap()).unwrap();
        assert_eq!(payload["sub"], "u1");
        assert_eq!(payload["iss"], "users");
        assert_eq!(payload["iat"], 1_700_000_000);
        assert_eq!(payload["exp"], 1_700_003_600);
        assert_eq!(payload["roles"], json!(["ROLE_USER"]));
        assert!(payload.get("aud").is_none());
    }

    #[test]
    fn test_same_claims_encrypt_differently() {
        let codec = TokenCodec::from_secret("test-secret");
        let claims = sample_claims();
        assert_ne!(codec.encrypt(&claims).unwrap(), codec.encrypt(&claims).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let token = TokenCodec::from_secret("key-one").encrypt(&sample_claims()).unwrap();
        let result = TokenCodec::from_secret("key-two").decrypt(&token);
        assert!(matches!(result, Err(TokenError::TagMismatch)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let codec = TokenCodec::from_secret("test-secret");
        let token = codec.encrypt(&sample_claims()).unwrap();

        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut ciphertext = URL_SAFE_NO_PAD.decode(&segments[3]).unwrap();
        ciphertext[0] ^= 0x01;
        segments[3] = URL_SAFE_NO_PAD.encode(ciphertext);

        assert!(matches!(codec.decrypt(&segments.join(".")), Err(TokenError::TagMismatch)));
    }

    #[test]
    fn test_malformed_tokens_fail() {
        let codec = TokenCodec::from_secret("test-secret");

        assert!(matches!(codec.decrypt("garbage"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.decrypt("a.b.c.d.e"), Err(TokenError::Malformed(_))));
        assert!(codec.decrypt("").is_err());
    }

    #[test]
    fn test_unsupported_header_rejected() {
        let key = derive_key("test-secret");
        let token = encrypt(&sample_claims(), &key).unwrap();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RSA-OAEP","enc":"A256GCM"}"#);
        let forged = format!("{}{}", header, &token[token.find('.').unwrap()..]);

        assert!(matches!(
            decrypt(&forged, &key),
            Err(TokenError::UnsupportedHeader { .. })
        ));
    }

    #[test]
    fn test_key_derivation_is_deterministic() {
        assert_eq!(derive_key("secret"), derive_key("secret"));
        assert_ne!(derive_key("secret"), derive_key("Secret"));
    }

    #[test]
    fn test_builder_requires_expiry_after_issue() {
        let now = Utc::now();
        let result = ClaimsSet::builder()
            .subject("u1")
            .issued_at(now)
            .expires_at(now)
            .build();
        assert!(matches!(result, Err(TokenError::InvalidClaims(_))));

        let missing_subject = ClaimsSet::builder()
            .issued_at(now)
            .expires_at(now + Duration::minutes(1))
            .build();
        assert!(missing_subject.is_err());
    }

    #[test]
    fn test_builder_rejects_reserved_claims() {
        let now = Utc::now();
        let result = ClaimsSet::builder()
            .subject("u1")
            .issued_at(now)
            .expires_at(now + Duration::minutes(1))
            .claim("exp", 0)
            .build();
        assert!(matches!(result, Err(TokenError::ReservedClaim(name)) if name == "exp"));
    }

    #[test]
    fn test_sub_second_precision_is_dropped() {
        let now = Utc.timestamp_opt(1_700_000_000, 750_000_000).unwrap();
        let claims = ClaimsSet::builder()
            .subject("u1")
            .issued_at(now)
            .expires_at(now + Duration::seconds(10))
            .build()
            .unwrap();

        assert_eq!(claims.issued_at().unwrap().timestamp_subsec_nanos(), 0);
        assert_eq!(claims.expires_at().timestamp(), 1_700_000_010);
    }

    #[test]
    fn test_string_list_claim_shapes() {
        let now = Utc::now();
        let claims = ClaimsSet::builder()
            .subject("u1")
            .issued_at(now)
            .expires_at(now + Duration::minutes(1))
            .claim("numbers", json!([1, 2]))
            .claim("scalar", "ROLE_USER")
            .claim("empty", json!([]))
            .build()
            .unwrap();

        assert!(claims.string_list_claim("numbers").is_err());
        assert!(claims.string_list_claim("scalar").is_err());
        assert_eq!(claims.string_list_claim("empty").unwrap(), Some(vec![]));
        assert_eq!(claims.string_list_claim("missing").unwrap(), None);
    }

    #[test]
    fn test_issued_at_is_optional() {
        let key = derive_key("test-secret");
        let claims = ClaimsSet::builder()
            .subject("u1")
            .expires_at(Utc.timestamp_opt(1_700_003_600, 0).unwrap())
            .build()
            .unwrap();
        assert_eq!(claims.issued_at(), None);

        let token = encrypt(&claims, &key).unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&open(&token, &key).unwrap()).unwrap();
        assert!(payload.get("iat").is_none());
        assert_eq!(decrypt(&token, &key).unwrap(), claims);
    }
}
