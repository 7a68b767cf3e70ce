use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;

/// Raw toggle body. Fields stay loose so a wrong type is a 400 with our
/// message rather than a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleApprovalRequest {
    pub user_id: Option<Value>,
    pub is_approved: Option<Value>,
}

/// A validated toggle: the target and the exact final value to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalChange {
    pub target: Uuid,
    pub approved: bool,
}

/// What a toggle request asks for, once its shape has been checked.
#[derive(Debug, PartialEq, Eq)]
pub enum ToggleTarget {
    Change(ApprovalChange),
    /// Present but not an id any record could have.
    Unknown,
}

impl ToggleApprovalRequest {
    pub fn validate(self) -> Result<ToggleTarget, AppError> {
        let user_id = match self.user_id {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            _ => return Err(AppError::Validation("Invalid request data.".into())),
        };
        let approved = match self.is_approved {
            Some(Value::Bool(b)) => b,
            _ => return Err(AppError::Validation("Invalid request data.".into())),
        };
        Ok(match Uuid::parse_str(user_id.trim()) {
            Ok(target) => ToggleTarget::Change(ApprovalChange { target, approved }),
            Err(_) => ToggleTarget::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Result<ToggleTarget, AppError> {
        serde_json::from_value::<ToggleApprovalRequest>(body).unwrap().validate()
    }

    #[test]
    fn accepts_id_and_boolean() {
        let id = Uuid::new_v4();
        let got = parse(json!({"userId": id.to_string(), "isApproved": true})).unwrap();
        assert_eq!(got, ToggleTarget::Change(ApprovalChange { target: id, approved: true }));
    }

    #[test]
    fn missing_id_is_a_validation_error() {
        assert!(matches!(parse(json!({"isApproved": true})), Err(AppError::Validation(_))));
        assert!(matches!(parse(json!({"userId": "", "isApproved": true})), Err(AppError::Validation(_))));
    }

    #[test]
    fn non_boolean_value_is_a_validation_error() {
        let id = Uuid::new_v4().to_string();
        for value in [json!("true"), json!(1), Value::Null] {
            assert!(matches!(
                parse(json!({"userId": id, "isApproved": value})),
                Err(AppError::Validation(_))
            ));
        }
        assert!(matches!(parse(json!({"userId": id})), Err(AppError::Validation(_))));
    }

    #[test]
    fn malformed_id_targets_nobody() {
        let got = parse(json!({"userId": "not-a-uuid", "isApproved": false})).unwrap();
        assert_eq!(got, ToggleTarget::Unknown);
    }
}
