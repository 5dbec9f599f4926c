use std::time::{Duration, SystemTime};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short lowercase base36 suffix for session names.
/// Uses OS randomness; falls back to time ^ pid when the OS source is unavailable.
pub fn random_suffix() -> String {
    let mut buf = [0u8; 8];
    let v = match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(_) => {
            let nanos = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0))
                .as_nanos();
            (nanos ^ std::process::id() as u128) as u64
        }
    };
    // 40 bits keeps names short (at most 8 chars)
    base36(v & 0xff_ffff_ffff)
}

fn base36(mut v: u64) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut s = Vec::new();
    while v > 0 {
        s.push(ALPHABET[(v % 36) as usize]);
        v /= 36;
    }
    s.reverse();
    String::from_utf8_lossy(&s).into_owned()
}
