/// Perch Crypto Library
///
/// Symmetric encryption (AES-256-GCM) for provider tokens at rest.
/// One process-wide key encrypts every token field; each field gets its own
/// random nonce, stored in front of the ciphertext.
pub mod encrypt;
pub mod keys;
