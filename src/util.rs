use std::time::{SystemTime, UNIX_EPOCH};

pub fn key_prefix(k: &str) -> &str {
    &k[..k.len().min(12)]
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
