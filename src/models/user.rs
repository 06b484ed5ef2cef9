use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user's styling profile.
///
/// Physical attributes feed the analysis prompt; everything is optional
/// except the account fields, mirroring how little the signup form requires.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Weight in kilograms
    pub weight: Option<f64>,
    pub skin_color: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub body_type: Option<String>,
    pub style_preference: Option<String>,
    pub budget: Option<String>,
    /// Path of the stored profile picture, relative to the media root
    pub profile_picture: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserProfile {
    pub username: String,
    pub email: String,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub skin_color: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub body_type: Option<String>,
    pub style_preference: Option<String>,
    pub budget: Option<String>,
    pub phone: Option<String>,
}

impl NewUserProfile {
    /// Materialize a profile with a fresh id and timestamp.
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            height: self.height,
            weight: self.weight,
            skin_color: self.skin_color,
            age: self.age,
            gender: self.gender,
            body_type: self.body_type,
            style_preference: self.style_preference,
            budget: self.budget,
            profile_picture: None,
            phone: self.phone,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_profile_assigns_id_and_timestamp() {
        let new_user = NewUserProfile {
            username: "lina".to_string(),
            email: "lina@example.com".to_string(),
            height: Some(180.0),
            weight: Some(75.0),
            skin_color: Some("fair".to_string()),
            age: None,
            gender: None,
            body_type: None,
            style_preference: None,
            budget: None,
            phone: None,
        };

        let profile = new_user.into_profile();
        assert_eq!(profile.username, "lina");
        assert_eq!(profile.height, Some(180.0));
        assert!(profile.profile_picture.is_none());
        assert!(!profile.id.is_nil());
    }

    #[test]
    fn test_new_user_deserializes_with_missing_optionals() {
        let json = r#"{"username": "omar", "email": "omar@example.com"}"#;
        let new_user: NewUserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(new_user.username, "omar");
        assert!(new_user.height.is_none());
        assert!(new_user.skin_color.is_none());
    }
}
