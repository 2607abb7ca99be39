//! Wire shapes exchanged with the script backend.

use dompee_core::{Role, ShopDraft};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// `{status, message}` reply used by most write actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReply {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Read a reply out of arbitrary JSON. Non-objects read as a failure
    /// with no message.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Shop record as the backend stores it. List fields travel comma-joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopPayload {
    pub reg_no: String,
    pub shop_name: String,
    pub shop_owner_name: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub address: String,
    pub google_maps_url: String,
    pub youtube_link: String,
    pub image: String,
    pub categories: String,
    pub services: String,
}

impl ShopPayload {
    #[must_use]
    pub fn new(reg_no: &str, draft: &ShopDraft) -> Self {
        Self {
            reg_no: reg_no.to_string(),
            shop_name: draft.shop_name.trim().to_string(),
            shop_owner_name: draft.shop_owner_name.trim().to_string(),
            phone_number: draft.phone_number.trim().to_string(),
            whatsapp_number: draft.whatsapp_number.trim().to_string(),
            address: draft.address.trim().to_string(),
            google_maps_url: draft.google_maps_url.trim().to_string(),
            youtube_link: draft.youtube_link.trim().to_string(),
            image: draft.image.trim().to_string(),
            categories: draft.categories.join(", "),
            services: draft.services.join(", "),
        }
    }
}

/// New account submitted by the registration form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub role: Role,
}

/// Profile fields a user may edit on their own account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

/// Fields an admin may edit on any account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(flatten)]
    pub profile: ProfileUpdate,
    pub role: Role,
}

/// POST body carrying an `action` field next to the action's data.
#[derive(Debug, Serialize)]
pub(crate) struct ActionBody<'a, T: Serialize> {
    pub action: &'static str,
    #[serde(flatten)]
    pub body: &'a T,
}

/// `updateShop` nests the record under `data`.
#[derive(Debug, Serialize)]
pub(crate) struct ShopData<'a> {
    pub data: &'a ShopPayload,
}

/// User actions identify the account by email.
#[derive(Debug, Serialize)]
pub(crate) struct ForEmail<'a, T: Serialize> {
    pub email: &'a str,
    #[serde(flatten)]
    pub fields: &'a T,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_shop_payload_joins_lists() {
        let draft = ShopDraft {
            shop_name: " Perera Stores ".to_string(),
            categories: vec!["grocery".to_string(), "bakery".to_string()],
            services: vec!["Delivery".to_string(), "Catering".to_string()],
            ..ShopDraft::default()
        };
        let payload = ShopPayload::new("DMP-2025-1234", &draft);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["reg_no"], "DMP-2025-1234");
        assert_eq!(value["shop_name"], "Perera Stores");
        assert_eq!(value["categories"], "grocery, bakery");
        assert_eq!(value["services"], "Delivery, Catering");
    }

    #[test]
    fn test_update_shop_body_shape() {
        let payload = ShopPayload::new("DMP-1", &ShopDraft::default());
        let body = ActionBody {
            action: "updateShop",
            body: &ShopData { data: &payload },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["action"], "updateShop");
        assert_eq!(value["data"]["reg_no"], "DMP-1");
    }

    #[test]
    fn test_update_user_body_is_flat() {
        let update = UserUpdate {
            profile: ProfileUpdate {
                first_name: "Nimal".to_string(),
                ..ProfileUpdate::default()
            },
            role: Role::ShopOwner,
        };
        let body = ActionBody {
            action: "updateUser",
            body: &ForEmail {
                email: "nimal@example.com",
                fields: &update,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "action": "updateUser",
                "email": "nimal@example.com",
                "firstName": "Nimal",
                "lastName": "",
                "phone": "",
                "address": "",
                "role": "shop_owner"
            })
        );
    }

    #[test]
    fn test_registration_exposes_password_only_on_the_wire() {
        let registration = Registration {
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "a@b.lk".to_string(),
            phone: String::new(),
            address: String::new(),
            password: SecretString::from("hunter22"),
            role: Role::default(),
        };
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["password"], "hunter22");
        assert_eq!(value["role"], "user");
        assert!(!format!("{registration:?}").contains("hunter22"));
    }

    #[test]
    fn test_status_reply() {
        assert!(StatusReply::from_value(&json!({ "status": "success" })).is_success());
        let reply = StatusReply::from_value(&json!({ "status": "error", "message": "nope" }));
        assert!(!reply.is_success());
        assert_eq!(reply.message.as_deref(), Some("nope"));
        assert!(!StatusReply::from_value(&json!([1, 2])).is_success());
    }
}
