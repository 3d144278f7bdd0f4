//! Shared cryptography library for Meridian services
//!
//! Symmetric, password-derived cryptography only: secure random generation,
//! one-way hashing, key derivation (scrypt/PBKDF2), and AES-256-GCM field
//! encryption. Token signing lives in `token-security`, which builds on the
//! primitives here.
//!
//! ## Security design
//!
//! - **OS CSPRNG everywhere**: no seeded or thread-local generators
//! - **Keys are ephemeral**: derived per operation, zeroed on drop
//! - **Opaque decryption failures**: one error for wrong key, tampered data
//!   and malformed payloads
//! - **Constant-time comparisons** for every secret-bearing equality check

pub mod cipher;
pub mod error;
pub mod field;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod random;
pub mod secret_strength;
pub mod telemetry;

pub use cipher::{decrypt, decrypt_async, encrypt, encrypt_async, EncryptOptions, EncryptedPayload};
pub use error::{CryptoError, CryptoResult, RandomError};
pub use field::{decrypt_field, encrypt_field, is_encrypted, ENC_PREFIX};
pub use hash::{
    constant_time_equal, digest, hash_password, hmac, verify_hmac, verify_password,
    HashAlgorithm, HashResult,
};
pub use kdf::{derive_key, derive_key_async, secure_wipe, KdfParams};
pub use keys::MasterKeyStore;
pub use random::{
    generate_secure_secret, random_bytes, random_int, random_password, secure_token, uuid_v4,
    CharsetOptions,
};
pub use secret_strength::{classify_secret, require_strong_secret, SecretStrength};
pub use telemetry::timed;
