pub mod ip;
pub mod url_validator;

/// 短码字母表：小写、大写字母与数字，下标即为该字符的 62 进制数值
pub const BASE62_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| BASE62_ALPHABET[rand::random_range(0..BASE62_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Random token used as a signing secret when none is configured.
pub fn generate_secure_token(length: usize) -> String {
    generate_random_code(length)
}
