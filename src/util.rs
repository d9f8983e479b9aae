const BASE62: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Append `n` in base 62 (`0-9a-zA-Z`), most significant digit first.
#[inline]
pub(crate) fn push_u32_base62(out: &mut String, mut n: u32) {
    if n == 0 {
        out.push('0');
        return;
    }

    // u32::MAX needs six base-62 digits.
    let mut buf = [0u8; 6];
    let mut i = buf.len();
    while n > 0 {
        i -= 1;
        buf[i] = BASE62[(n % 62) as usize];
        n /= 62;
    }
    for &byte in &buf[i..] {
        out.push(char::from(byte));
    }
}

/// Return a human-readable type name for a JSON value.
#[must_use]
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
