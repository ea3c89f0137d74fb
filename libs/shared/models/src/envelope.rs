use serde_json::{json, Value};

/// Standard success envelope: `{status, message?, data?}`.
pub fn success(message: &str, data: Value) -> Value {
    json!({
        "status": "success",
        "message": message,
        "data": data
    })
}

pub fn success_data(data: Value) -> Value {
    json!({
        "status": "success",
        "data": data
    })
}
