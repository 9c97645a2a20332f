use serde::Deserialize;

use super::repo_types::UserRole;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<String>,
}

impl UpdateUserRequest {
    pub fn touches_privileges(&self) -> bool {
        self.role.is_some() || self.status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_cook() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name": "Ana", "email": "ana@k.org", "password": "longenough"}"#)
                .unwrap();
        assert_eq!(req.role, UserRole::Cook);
    }

    #[test]
    fn profile_edits_do_not_touch_privileges() {
        let rename = UpdateUserRequest {
            name: Some("Ana B.".into()),
            ..Default::default()
        };
        assert!(!rename.touches_privileges());

        let promote: UpdateUserRequest = serde_json::from_str(r#"{"role": "manager"}"#).unwrap();
        assert!(promote.touches_privileges());
    }
}
