//! Attestation signer (spec §4.2).
//!
//! ECDSA over NIST P-256, SHA-256 digest, DER-encoded signature hex. Keys
//! are loaded once at startup from PEM files; the signer fails fast if the
//! configured paths are unset or unreadable, and never logs key material
//! or the paths themselves.

use crate::error::SignerError;
use crate::hash::canonical_json;
use crate::model::AttestationPayload;
use ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use p256::pkcs8::DecodePublicKey;
use std::path::Path;

/// Holds the platform's signing key and verifying key.
///
/// Constructed once at startup (§9: no implicit lazy init inside request
/// paths) and injected into the Intake handler.
pub struct AttestationSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl AttestationSigner {
    /// Loads the signing key from `signer_key_path` and the verifying key
    /// from `platform_pubkey_path`, both PEM-encoded. Fails fast; never
    /// includes the path or key bytes in the returned error.
    pub fn load(signer_key_path: &Path, platform_pubkey_path: &Path) -> Result<Self, SignerError> {
        let key_pem =
            std::fs::read_to_string(signer_key_path).map_err(|_| SignerError::KeyUnavailable)?;
        let signing_key =
            SigningKey::from_pkcs8_pem(&key_pem).map_err(|_| SignerError::KeyUnavailable)?;

        let pub_pem = std::fs::read_to_string(platform_pubkey_path)
            .map_err(|_| SignerError::KeyUnavailable)?;
        let verifying_key =
            VerifyingKey::from_public_key_pem(&pub_pem).map_err(|_| SignerError::KeyUnavailable)?;

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    fn canonical_bytes(payload: &AttestationPayload) -> Result<Vec<u8>, SignerError> {
        let value = serde_json::to_value(payload)?;
        Ok(canonical_json(&value).into_bytes())
    }

    /// Signs the canonical JSON of `payload`, returning lowercase DER-hex.
    pub fn sign(&self, payload: &AttestationPayload) -> Result<String, SignerError> {
        let bytes = Self::canonical_bytes(payload)?;
        let signature: Signature = self.signing_key.sign(&bytes);
        Ok(hex::encode(signature.to_der().as_bytes()))
    }

    /// Verifies `signature_hex` over the canonical JSON of `payload`.
    ///
    /// Distinguishes malformed hex/DER from an honest cryptographic
    /// mismatch, per §4.2.
    pub fn verify(
        &self,
        payload: &AttestationPayload,
        signature_hex: &str,
    ) -> Result<(), SignerError> {
        let der = hex::decode(signature_hex).map_err(|_| SignerError::MalformedHex)?;
        let signature = Signature::from_der(&der).map_err(|_| SignerError::MalformedHex)?;
        let bytes = Self::canonical_bytes(payload)?;
        self.verifying_key
            .verify(&bytes, &signature)
            .map_err(|_| SignerError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
    use tempfile_stub::write_temp_pem;

    /// Minimal temp-file helper; avoids pulling in the `tempfile` crate for
    /// two call sites.
    mod tempfile_stub {
        use std::path::PathBuf;

        pub fn write_temp_pem(name: &str, contents: &str) -> PathBuf {
            let mut path = std::env::temp_dir();
            path.push(format!(
                "craftid-anchor-test-{}-{}.pem",
                name,
                std::process::id()
            ));
            std::fs::write(&path, contents).expect("write temp pem");
            path
        }
    }

    fn sample_payload() -> AttestationPayload {
        AttestationPayload {
            public_id: "CID-00001".into(),
            public_hash: "a".repeat(64),
            timestamp: "2025-01-01T00:00:00Z".into(),
            salt: "0".repeat(32),
        }
    }

    fn signer_with_fresh_keypair() -> AttestationSigner {
        let signing_key = SigningKey::random(&mut rand::rng());
        let verifying_key = VerifyingKey::from(&signing_key);
        let key_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode private key");
        let pub_pem = verifying_key
            .to_public_key_pem(LineEnding::LF)
            .expect("encode public key");
        let key_path = write_temp_pem("signing", key_pem.as_str());
        let pub_path = write_temp_pem("verifying", &pub_pem);
        AttestationSigner::load(&key_path, &pub_path).expect("load signer")
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let signer = signer_with_fresh_keypair();
        let payload = sample_payload();
        let signature = signer.sign(&payload).expect("sign");
        signer.verify(&payload, &signature).expect("verify");
    }

    #[test]
    fn tampering_payload_fails_verification() {
        let signer = signer_with_fresh_keypair();
        let payload = sample_payload();
        let signature = signer.sign(&payload).expect("sign");
        let mut tampered = payload;
        tampered.public_hash = "b".repeat(64);
        assert!(signer.verify(&tampered, &signature).is_err());
    }

    #[test]
    fn malformed_hex_is_distinguished_from_mismatch() {
        let signer = signer_with_fresh_keypair();
        let payload = sample_payload();
        let err = signer.verify(&payload, "not-hex").unwrap_err();
        assert!(matches!(err, SignerError::MalformedHex));
    }
}
