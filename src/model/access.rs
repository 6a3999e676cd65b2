use serde::Serialize;

/// Access level stored on `users.role_id` and carried in the JWT.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl AccessRole {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(AccessRole::Admin),
            2 => Some(AccessRole::Hr),
            3 => Some(AccessRole::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Admin and HR land on the administrative dashboard.
    pub fn landing_page(self) -> &'static str {
        match self {
            AccessRole::Admin | AccessRole::Hr => "dashboard",
            AccessRole::Employee => "user_dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip_through_from_id() {
        for role in [AccessRole::Admin, AccessRole::Hr, AccessRole::Employee] {
            assert_eq!(AccessRole::from_id(role.id()), Some(role));
        }
        assert_eq!(AccessRole::from_id(0), None);
        assert_eq!(AccessRole::from_id(4), None);
    }

    #[test]
    fn landing_page_depends_on_role() {
        assert_eq!(AccessRole::Hr.landing_page(), "dashboard");
        assert_eq!(AccessRole::Employee.landing_page(), "user_dashboard");
    }
}
