//! 会话令牌加解密
//!
//! 令牌明文为 `<管理员ID>:<纳秒时间戳>`，时间戳只提供随机性，不参与校验。
//! 密文格式为 base64url(nonce || AES-GCM 密文)。

use crate::error::{AppError, AppResult};
use aes_gcm::{
    Aes128Gcm, Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

const NONCE_SIZE: usize = 12;

enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// 令牌加解密器，密钥长度 16 或 32 字节
pub struct TokenCipher {
    cipher: Cipher,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = match self.cipher {
            Cipher::Aes128(_) => 128,
            Cipher::Aes256(_) => 256,
        };
        f.debug_struct("TokenCipher").field("bits", &bits).finish()
    }
}

impl TokenCipher {
    pub fn new(key: &[u8]) -> AppResult<Self> {
        let cipher = match key.len() {
            16 => Cipher::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key).map_err(|e| AppError::cipher(e.to_string()))?,
            )),
            32 => Cipher::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key).map_err(|e| AppError::cipher(e.to_string()))?,
            )),
            n => {
                return Err(AppError::config(format!(
                    "令牌加密密钥长度必须为16或32，当前为{}",
                    n
                )));
            }
        };

        Ok(Self { cipher })
    }

    /// 为管理员生成新令牌
    pub fn encode_token(&self, admin_id: i64) -> AppResult<String> {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let plaintext = format!("{}:{}", admin_id, nanos);
        let sealed = self.seal(plaintext.as_bytes())?;

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// 解出令牌中的管理员ID
    pub fn decode_token(&self, token: &str) -> AppResult<i64> {
        let sealed = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| AppError::invalid_token(e.to_string()))?;
        let plaintext = self.open(&sealed)?;
        let plaintext =
            String::from_utf8(plaintext).map_err(|e| AppError::invalid_token(e.to_string()))?;

        let (id, _) = plaintext
            .split_once(':')
            .ok_or_else(|| AppError::invalid_token("缺少分隔符"))?;
        id.parse::<i64>()
            .map_err(|e| AppError::invalid_token(e.to_string()))
    }

    fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let (nonce, ciphertext) = match &self.cipher {
            Cipher::Aes128(c) => {
                let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
                (nonce, c.encrypt(&nonce, plaintext))
            }
            Cipher::Aes256(c) => {
                let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
                (nonce, c.encrypt(&nonce, plaintext))
            }
        };
        let ciphertext = ciphertext.map_err(|e| AppError::cipher(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> AppResult<Vec<u8>> {
        if sealed.len() <= NONCE_SIZE {
            return Err(AppError::invalid_token("令牌长度不足"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce);

        let plaintext = match &self.cipher {
            Cipher::Aes128(c) => c.decrypt(nonce, ciphertext),
            Cipher::Aes256(c) => c.decrypt(nonce, ciphertext),
        };
        plaintext.map_err(|_| AppError::invalid_token("令牌解密失败"))
    }
}
