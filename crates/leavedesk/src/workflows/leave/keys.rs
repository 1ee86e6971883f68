//! Per-person signing keys used to authenticate links embedded in notifications.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::domain::ApplicationId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl KeyPair {
    fn signing_key(&self) -> Option<SigningKey> {
        let secret: [u8; 32] = self.private_key.as_slice().try_into().ok()?;
        Some(SigningKey::from_bytes(&secret))
    }

    fn verifying_key(&self) -> Option<VerifyingKey> {
        let public: [u8; 32] = self.public_key.as_slice().try_into().ok()?;
        VerifyingKey::from_bytes(&public).ok()
    }

    /// Hex-encoded signature over the application id, or `None` for malformed keys.
    pub fn sign_token(&self, application: &ApplicationId) -> Option<String> {
        let key = self.signing_key()?;
        let signature = key.sign(application.0.as_bytes());
        Some(hex::encode(signature.to_bytes()))
    }

    pub fn verify_token(&self, application: &ApplicationId, token: &str) -> bool {
        let Some(key) = self.verifying_key() else {
            return false;
        };
        let Ok(raw) = hex::decode(token) else {
            return false;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(raw.as_slice()) else {
            return false;
        };
        key.verify(application.0.as_bytes(), &Signature::from_bytes(&bytes))
            .is_ok()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unable to generate key pair: {0}")]
pub struct KeyGenerationError(pub String);

pub trait KeyPairGenerator: Send + Sync {
    fn generate(&self) -> Result<KeyPair, KeyGenerationError>;
}

/// Ed25519 keys seeded from the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519KeyGenerator;

impl KeyPairGenerator for Ed25519KeyGenerator {
    fn generate(&self) -> Result<KeyPair, KeyGenerationError> {
        let mut secret = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut secret)
            .map_err(|err| KeyGenerationError(err.to_string()))?;

        let signing_key = SigningKey::from_bytes(&secret);
        Ok(KeyPair {
            public_key: signing_key.verifying_key().to_bytes().to_vec(),
            private_key: signing_key.to_bytes().to_vec(),
        })
    }
}
