//! Families, their members and the read-only invite preview.

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Display name used for members whose profile row is missing.
pub(crate) const FALLBACK_DISPLAY_NAME: &str = "Usuário";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(LedgerError::Validation(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub invite_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub profile_id: String,
    pub role: Role,
    pub display_name: String,
    pub email: String,
}

/// What a prospective member sees before confirming a join.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPreview {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<PreviewMember>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMember {
    pub name: String,
}

/// Raw `family_members` row.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MembershipRow {
    pub family_id: String,
    pub profile_id: String,
    pub role: Role,
}

/// Raw `profiles` row.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Member {
    pub(crate) fn from_rows(membership: MembershipRow, profile: Option<&ProfileRow>) -> Self {
        let display_name = profile
            .and_then(|p| p.display_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string();
        let email = profile
            .and_then(|p| p.email.clone())
            .unwrap_or_default();
        Self {
            profile_id: membership.profile_id,
            role: membership.role,
            display_name,
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_falls_back() {
        let membership = MembershipRow {
            family_id: "f".to_string(),
            profile_id: "p".to_string(),
            role: Role::Member,
        };
        let member = Member::from_rows(membership, None);
        assert_eq!(member.display_name, FALLBACK_DISPLAY_NAME);
        assert_eq!(member.email, "");
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::try_from("admin").unwrap(), Role::Admin);
        assert_eq!(Role::Member.as_str(), "member");
        assert!(Role::try_from("owner").is_err());
    }
}
