//! Password and verification-code hashing

use rand::Rng;

/// bcrypt cost factor for passwords and verification codes
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Generate a random 6-digit verification code
pub fn generate_verification_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100000..1000000);
    code.to_string()
}

/// Codes are stored hashed, the same way as passwords
pub fn hash_code(code: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(code, BCRYPT_COST)
}

pub fn verify_code(code: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(code, hash)
}

/// Random suffix for uploaded file names
pub fn random_suffix() -> u64 {
    rand::thread_rng().gen_range(0..1_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = "margherita-forever";
        let hash = hash_password(password).unwrap();

        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_verification_code_format() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.parse::<u32>().is_ok());
        }
    }

    #[test]
    fn test_code_hash_roundtrip() {
        let code = generate_verification_code();
        let hash = hash_code(&code).unwrap();
        assert!(verify_code(&code, &hash).unwrap());
        // Generated codes never start with 0
        assert!(!verify_code("000000", &hash).unwrap());
    }
}
