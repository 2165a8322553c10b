//! Static allow-lists of PII field names per entity kind.

/// PII fields of an LLC formation application.
pub const LLC_APPLICATION_FIELDS: &[&str] = &[
    "ownerIdNumber",
    "ownerPassportNumber",
    "ownerAddress",
    "ownerPhone",
    "businessAddress",
    "registeredAgentAddress",
];

/// PII fields of a user profile.
pub const USER_PROFILE_FIELDS: &[&str] = &[
    "idNumber",
    "passportNumber",
    "address",
    "phone",
    "dateOfBirth",
];

/// Kinds of record that carry protected fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    LlcApplication,
    UserProfile,
}

impl EntityKind {
    /// Names of the fields that must be encrypted at rest for this kind.
    pub fn protected_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::LlcApplication => LLC_APPLICATION_FIELDS,
            EntityKind::UserProfile => USER_PROFILE_FIELDS,
        }
    }

    /// Entity type label used in [`super::ProtectedField`].
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::LlcApplication => "llc_application",
            EntityKind::UserProfile => "user_profile",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_disjoint_from_each_other() {
        for f in LLC_APPLICATION_FIELDS {
            assert!(!USER_PROFILE_FIELDS.contains(f), "{f} in both lists");
        }
    }

    #[test]
    fn kinds_map_to_their_lists() {
        assert!(EntityKind::UserProfile.protected_fields().contains(&"idNumber"));
        assert!(EntityKind::LlcApplication
            .protected_fields()
            .contains(&"ownerPhone"));
        assert_eq!(EntityKind::LlcApplication.as_str(), "llc_application");
    }
}
