use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use argon2::password_hash::{rand_core::RngCore, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const WALLET_EXTENSION: &str = "wallet";

/// Encrypted keystore entry stored on disk
#[derive(Serialize, Deserialize)]
struct EncryptedWalletData {
    /// Argon2 PHC string used to verify the password
    password_hash: String,
    /// Salt for the encryption key derivation (hex)
    key_salt: String,
    /// AES-256-GCM nonce (hex)
    nonce: String,
    /// Encrypted secret, a mnemonic or private key (hex)
    ciphertext: String,
    metadata: WalletMetadata,
}

/// Wallet metadata for display purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub name: String,
    /// Checksummed `0x` address
    pub address: String,
    pub created_at: String,
    pub last_accessed: Option<String>,
}

/// Encrypted keystore directory
pub struct WalletStorage {
    storage_dir: PathBuf,
}

impl WalletStorage {
    /// Open the default keystore (`~/.tempo_dex/wallets`)
    pub fn new() -> Result<Self, Error> {
        Self::with_dir(Self::get_storage_directory()?)
    }

    /// Open a keystore rooted at `storage_dir`, creating it if needed
    pub fn with_dir(storage_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let storage_dir = storage_dir.into();
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)
                .map_err(|e| Error::Wallet(format!("Failed to create storage directory: {}", e)))?;
        }
        Ok(Self { storage_dir })
    }

    pub fn get_storage_directory() -> Result<PathBuf, Error> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| Error::Wallet("Could not determine home directory".to_string()))?;

        Ok(home_dir.join(".tempo_dex").join("wallets"))
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn has_saved_wallets(&self) -> Result<bool, Error> {
        Ok(!self.wallet_files()?.is_empty())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.wallet_path(name).exists()
    }

    /// Metadata of every readable keystore entry, sorted by name
    pub fn list_wallets(&self) -> Result<Vec<WalletMetadata>, Error> {
        let mut wallets: Vec<WalletMetadata> = self
            .wallet_files()?
            .iter()
            .filter_map(|path| match Self::load_wallet_file(path) {
                Ok(data) => Some(data.metadata),
                Err(e) => {
                    tracing::warn!("Skipping unreadable wallet file {}: {}", path.display(), e);
                    None
                }
            })
            .collect();
        wallets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wallets)
    }

    /// Encrypt `secret` under `password` and store it as `name`
    pub fn save_wallet(
        &self,
        name: &str,
        secret: &str,
        password: &str,
        address: &str,
    ) -> Result<WalletMetadata, Error> {
        Self::validate_name(name)?;
        self.validate_password(password)?;
        if self.exists(name) {
            return Err(Error::Wallet(format!("Wallet '{}' already exists", name)));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Wallet(format!("Failed to hash password: {}", e)))?
            .to_string();

        let mut key_salt = [0u8; 16];
        OsRng.fill_bytes(&mut key_salt);
        let key = derive_key(password, &key_salt)?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = Aes256Gcm::new(&key)
            .encrypt(Nonce::from_slice(&nonce_bytes), secret.as_bytes())
            .map_err(|e| Error::Wallet(format!("Failed to encrypt wallet: {}", e)))?;

        let metadata = WalletMetadata {
            name: name.to_string(),
            address: address.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            last_accessed: None,
        };

        let data = EncryptedWalletData {
            password_hash,
            key_salt: hex::encode(key_salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
            metadata: metadata.clone(),
        };
        self.write_wallet_file(name, &data)?;
        tracing::info!("Saved wallet '{}' ({})", name, address);

        Ok(metadata)
    }

    /// Decrypt the secret stored as `name`
    pub fn load_wallet(&self, name: &str, password: &str) -> Result<String, Error> {
        let path = self.wallet_path(name);
        if !path.exists() {
            return Err(Error::Wallet(format!("Wallet '{}' not found", name)));
        }
        let mut data = Self::load_wallet_file(&path)?;

        let parsed_hash = PasswordHash::new(&data.password_hash)
            .map_err(|e| Error::Wallet(format!("Failed to parse password hash: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| Error::Wallet("Invalid password".to_string()))?;

        let key_salt = decode_field("key_salt", &data.key_salt)?;
        let nonce = decode_field("nonce", &data.nonce)?;
        if nonce.len() != 12 {
            return Err(Error::Wallet("Corrupt wallet file: bad nonce".to_string()));
        }
        let ciphertext = decode_field("ciphertext", &data.ciphertext)?;

        let key = derive_key(password, &key_salt)?;
        let plaintext = Aes256Gcm::new(&key)
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|e| Error::Wallet(format!("Failed to decrypt wallet: {}", e)))?;
        let secret = String::from_utf8(plaintext)
            .map_err(|e| Error::Wallet(format!("Invalid wallet data: {}", e)))?;

        data.metadata.last_accessed = Some(chrono::Utc::now().to_rfc3339());
        self.write_wallet_file(name, &data)?;

        Ok(secret)
    }

    pub fn delete_wallet(&self, name: &str) -> Result<(), Error> {
        let path = self.wallet_path(name);
        if !path.exists() {
            return Err(Error::Wallet(format!("Wallet '{}' not found", name)));
        }
        fs::remove_file(&path)
            .map_err(|e| Error::Wallet(format!("Failed to delete wallet file: {}", e)))?;
        tracing::info!("Deleted wallet '{}'", name);
        Ok(())
    }

    /// Passwords need 12+ characters mixing upper, lower, digit and symbol
    pub fn validate_password(&self, password: &str) -> Result<(), Error> {
        if password.chars().count() < 12 {
            return Err(Error::Wallet(
                "Password must be at least 12 characters long".to_string(),
            ));
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(Error::Wallet(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(Error::Wallet(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(Error::Wallet(
                "Password must contain at least one number".to_string(),
            ));
        }
        if !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(Error::Wallet(
                "Password must contain at least one symbol".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), Error> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Wallet(format!(
                "Invalid wallet name '{}': use letters, digits, '-' or '_'",
                name
            )));
        }
        Ok(())
    }

    fn wallet_path(&self, name: &str) -> PathBuf {
        self.storage_dir
            .join(format!("{}.{}", name, WALLET_EXTENSION))
    }

    fn wallet_files(&self) -> Result<Vec<PathBuf>, Error> {
        if !self.storage_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.storage_dir)
            .map_err(|e| Error::Wallet(format!("Failed to read storage directory: {}", e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::Wallet(format!("Failed to read directory entry: {}", e)))?
                .path();
            if path.extension().map_or(false, |ext| ext == WALLET_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn load_wallet_file(path: &Path) -> Result<EncryptedWalletData, Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Wallet(format!("Failed to read wallet file: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Wallet(format!("Failed to parse wallet file: {}", e)))
    }

    fn write_wallet_file(&self, name: &str, data: &EncryptedWalletData) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(self.wallet_path(name), json)
            .map_err(|e| Error::Wallet(format!("Failed to write wallet file: {}", e)))
    }
}

fn derive_key(password: &str, salt: &[u8]) -> Result<Key<Aes256Gcm>, Error> {
    let mut key_bytes = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key_bytes)
        .map_err(|e| Error::Wallet(format!("Failed to derive key: {}", e)))?;
    Ok(*Key::<Aes256Gcm>::from_slice(&key_bytes))
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, Error> {
    hex::decode(value).map_err(|e| Error::Wallet(format!("Corrupt wallet file ({}): {}", field, e)))
}
