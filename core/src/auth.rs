use crate::config::AppConfig;
use crate::errors::AppError;
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stellar_strkey::Strkey;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use token_ledger::{Claims, Ed25519KeyResolver, IdentityResolver, JwtResolver, Principal};
use utoipa::ToSchema;

pub struct AuthState {
    pub jwt_secret: String,
    pub signing_key: SigningKey,
    pub server_public_key: [u8; 32],
    pub domain: String,
    pub challenge_expiry_secs: u64,
    pub jwt_expiry_secs: u64,
    resolver: JwtResolver,
}

impl AuthState {
    pub fn new(config: &AppConfig, seed: Option<[u8; 32]>) -> Self {
        let signing_key = match seed {
            Some(seed) => SigningKey::from_bytes(&seed),
            None => {
                let mut seed = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut seed);
                SigningKey::from_bytes(&seed)
            }
        };
        let server_public_key = signing_key.verifying_key().to_bytes();
        Self {
            jwt_secret: config.jwt_secret.clone(),
            signing_key,
            server_public_key,
            domain: config.auth_domain.clone(),
            challenge_expiry_secs: config.challenge_expiry_secs,
            jwt_expiry_secs: config.jwt_expiry_secs,
            resolver: JwtResolver::new(config.jwt_secret.as_bytes(), &config.auth_domain),
        }
    }

    pub fn server_stellar_address(&self) -> String {
        Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(self.server_public_key))
            .to_string()
    }

    /// Resolver that accepts the bearer tokens issued by [`AuthState::issue_token`].
    pub fn resolver(&self) -> JwtResolver {
        self.resolver.clone()
    }

    pub fn issue_token(&self, principal: &Principal) -> Result<String, AppError> {
        let now = now_secs()?;
        let claims = Claims {
            sub: principal.as_str().to_string(),
            iss: self.domain.clone(),
            iat: now,
            exp: now + self.jwt_expiry_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("JWT encode error: {e}")))
    }
}

/// Raw bearer token of the authenticated request, handed to the ledger as
/// the caller's credential.
#[derive(Debug, Clone)]
pub struct Credential(pub String);

#[derive(Deserialize, ToSchema)]
pub struct ChallengeRequest {
    #[schema(example = "GABC...XYZ")]
    pub account: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    #[schema(example = "tokenledger auth:GABC...XYZ:1700000300:9f2c...")]
    pub challenge: String,
    /// Base64 server signature over the SHA-256 of `challenge`.
    pub server_signature: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub account: String,
    pub challenge: String,
    pub server_signature: String,
    /// Base64 client signature over the SHA-256 of `challenge`.
    pub signature: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub token: String,
}

fn now_secs() -> Result<u64, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AppError::Internal(format!("system clock error: {e}")))
}

pub(crate) fn challenge_digest(challenge: &str) -> [u8; 32] {
    Sha256::digest(challenge.as_bytes()).into()
}

fn account_key(account: &str) -> Result<[u8; 32], AppError> {
    let strkey = Strkey::from_string(account)
        .map_err(|_| AppError::BadRequest("Invalid Stellar address".into()))?;

    match strkey {
        Strkey::PublicKeyEd25519(pk) => Ok(pk.0),
        _ => Err(AppError::BadRequest("Expected G... account address".into())),
    }
}

fn decode_signature(encoded: &str, what: &str) -> Result<Ed25519Signature, AppError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|_| AppError::BadRequest(format!("Invalid base64 in {what}")))?;
    Ed25519Signature::from_slice(&raw)
        .map_err(|_| AppError::BadRequest(format!("Malformed {what}")))
}

fn build_challenge(state: &AuthState, account: &str) -> Result<ChallengeResponse, AppError> {
    let expires_at = now_secs()? + state.challenge_expiry_secs;

    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);

    let challenge = format!(
        "{} auth:{}:{}:{}",
        state.domain,
        account,
        expires_at,
        hex::encode(nonce)
    );
    let sig = state.signing_key.sign(&challenge_digest(&challenge));

    Ok(ChallengeResponse {
        challenge,
        server_signature: BASE64.encode(sig.to_bytes()),
    })
}

fn verify_challenge(state: &AuthState, req: &VerifyRequest) -> Result<String, AppError> {
    let client_key = account_key(&req.account)?;

    let body = req
        .challenge
        .strip_prefix(&format!("{} auth:", state.domain))
        .ok_or_else(|| AppError::BadRequest("Challenge not issued for this domain".into()))?;

    // account:expires_at:nonce
    let mut parts = body.splitn(3, ':');
    let (Some(account), Some(expires_at), Some(_nonce)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::BadRequest("Malformed challenge".into()));
    };

    if account != req.account {
        return Err(AppError::BadRequest(
            "Challenge was issued to another account".into(),
        ));
    }

    let expires_at: u64 = expires_at
        .parse()
        .map_err(|_| AppError::BadRequest("Malformed challenge expiry".into()))?;
    if now_secs()? > expires_at {
        return Err(AppError::BadRequest("Challenge expired".into()));
    }

    let digest = challenge_digest(&req.challenge);

    let server_sig = decode_signature(&req.server_signature, "server signature")?;
    let server_vk = VerifyingKey::from_bytes(&state.server_public_key)
        .map_err(|e| AppError::Internal(format!("server key error: {e}")))?;
    if server_vk.verify(&digest, &server_sig).is_err() {
        return Err(AppError::Unauthorized(
            "Missing valid server signature".into(),
        ));
    }

    let client_sig = decode_signature(&req.signature, "signature")?;
    let client_vk = VerifyingKey::from_bytes(&client_key)
        .map_err(|_| AppError::BadRequest("Invalid account public key".into()))?;
    if client_vk.verify(&digest, &client_sig).is_err() {
        return Err(AppError::Unauthorized(
            "Missing valid client signature".into(),
        ));
    }

    let principal = Ed25519KeyResolver.resolve(&client_key)?;
    tracing::info!(principal = %principal, "challenge verified");
    state.issue_token(&principal)
}

#[utoipa::path(
    post,
    path = "/auth/challenge",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Signed login challenge", body = ChallengeResponse),
        (status = 400, description = "Invalid account")
    ),
    tag = "Auth"
)]
pub async fn challenge_handler(
    Extension(state): Extension<Arc<AuthState>>,
    Json(payload): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, AppError> {
    account_key(&payload.account)?;
    Ok(Json(build_challenge(&state, &payload.account)?))
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "JWT token issued", body = VerifyResponse),
        (status = 400, description = "Malformed or expired challenge"),
        (status = 401, description = "Authentication failed")
    ),
    tag = "Auth"
)]
pub async fn verify_handler(
    Extension(state): Extension<Arc<AuthState>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let token = verify_challenge(&state, &payload)?;
    Ok(Json(VerifyResponse { token }))
}

pub async fn auth_middleware(
    Extension(state): Extension<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Expected Bearer token".into()))?
        .to_string();

    state
        .resolver
        .resolve(token.as_bytes())
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    req.extensions_mut().insert(Credential(token));
    Ok(next.run(req).await)
}
