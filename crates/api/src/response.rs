//! Response envelope types.
//!
//! Every successful response uses a `{ "status": "success", "data": ... }`
//! envelope. `data` is omitted when an operation has nothing to return.

use serde::Serialize;

/// Value of the envelope `status` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Standard `{ "status": ..., "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(Envelope::success(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// `{ "status": "success" }` with no data.
    pub fn empty() -> Self {
        Self {
            status: Status::Success,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_wraps_data() {
        let value = serde_json::to_value(Envelope::success(json!({ "id": 1 }))).unwrap();
        assert_eq!(value, json!({ "status": "success", "data": { "id": 1 } }));
    }

    #[test]
    fn empty_envelope_omits_data() {
        let value = serde_json::to_value(Envelope::empty()).unwrap();
        assert_eq!(value, json!({ "status": "success" }));
    }
}
