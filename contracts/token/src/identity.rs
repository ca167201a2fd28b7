//! Caller identity.
//!
//! A [`Principal`] is the only authorization identity the ledger knows about.
//! Hosts turn whatever credential they receive into one through an
//! [`IdentityResolver`].

use crate::errors::{LedgerError, LedgerResult};
use ed25519_dalek::VerifyingKey;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use stellar_strkey::Strkey;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::parse_x509_certificate;

/// Resolved account identifier.
///
/// Never empty and never contains `\0`, which is reserved as the composite key
/// delimiter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> LedgerResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LedgerError::MalformedRequest(
                "principal must not be empty".to_string(),
            ));
        }
        if name.contains('\0') {
            return Err(LedgerError::MalformedRequest(
                "principal must not contain U+0000".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = LedgerError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns an opaque caller credential into a [`Principal`].
///
/// Implementations must be deterministic and side-effect free; every failure is
/// reported as [`LedgerError::Identity`].
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &[u8]) -> LedgerResult<Principal>;
}

fn identity_principal(name: String) -> LedgerResult<Principal> {
    Principal::new(name).map_err(|e| LedgerError::Identity(e.to_string()))
}

// ── Name credentials ──────────────────────────────────────────────────────────

/// The credential is the UTF-8 account name itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl IdentityResolver for NameResolver {
    fn resolve(&self, credential: &[u8]) -> LedgerResult<Principal> {
        let name = std::str::from_utf8(credential)
            .map_err(|_| LedgerError::Identity("credential is not valid UTF-8".to_string()))?;
        identity_principal(name.to_string())
    }
}

// ── Bearer tokens ─────────────────────────────────────────────────────────────

/// Claims carried by ledger bearer tokens. `sub` is the principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: u64,
    pub iat: u64,
}

/// Resolves HS256 JWTs signed with a shared secret.
///
/// The token's issuer must match and its expiry is enforced, so the same token
/// resolves to the same principal until it expires.
#[derive(Clone)]
pub struct JwtResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtResolver {
    pub fn new(secret: &[u8], issuer: &str) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[issuer]);
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl IdentityResolver for JwtResolver {
    fn resolve(&self, credential: &[u8]) -> LedgerResult<Principal> {
        let token = std::str::from_utf8(credential)
            .map_err(|_| LedgerError::Identity("token is not valid UTF-8".to_string()))?;
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| LedgerError::Identity(format!("invalid token: {e}")))?;
        identity_principal(data.claims.sub)
    }
}

// ── Ed25519 keys ──────────────────────────────────────────────────────────────

/// The credential is a raw 32-byte Ed25519 public key; the principal is its
/// Stellar account address (`G...`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyResolver;

impl IdentityResolver for Ed25519KeyResolver {
    fn resolve(&self, credential: &[u8]) -> LedgerResult<Principal> {
        let bytes = <[u8; 32]>::try_from(credential).map_err(|_| {
            LedgerError::Identity(format!(
                "expected a 32-byte public key, got {} bytes",
                credential.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| LedgerError::Identity(format!("invalid Ed25519 public key: {e}")))?;
        let address =
            Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(key.to_bytes()))
                .to_string();
        identity_principal(address)
    }
}

// ── X.509 certificates ────────────────────────────────────────────────────────

/// The credential is an X.509 certificate, PEM or DER encoded; the principal is
/// the subject's common name.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509CnResolver;

impl X509CnResolver {
    fn common_name(der: &[u8]) -> LedgerResult<Principal> {
        let (_, cert) = parse_x509_certificate(der)
            .map_err(|e| LedgerError::Identity(format!("failed to parse certificate: {e}")))?;
        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .ok_or_else(|| {
                LedgerError::Identity("certificate subject has no common name".to_string())
            })?
            .as_str()
            .map_err(|e| LedgerError::Identity(format!("unreadable common name: {e}")))?;
        identity_principal(cn.to_string())
    }
}

impl IdentityResolver for X509CnResolver {
    fn resolve(&self, credential: &[u8]) -> LedgerResult<Principal> {
        if credential.starts_with(b"-----BEGIN") {
            let (_, pem) = parse_x509_pem(credential).map_err(|e| {
                LedgerError::Identity(format!("failed to parse PEM certificate: {e}"))
            })?;
            Self::common_name(&pem.contents)
        } else {
            Self::common_name(credential)
        }
    }
}
