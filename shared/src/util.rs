use rand::Rng;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Lowercase alphanumeric token of `len` characters.
///
/// Used as the collision-avoidance suffix of stored upload names.
pub fn random_token(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Generate a new opaque order id (UUID v4).
pub fn new_order_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
