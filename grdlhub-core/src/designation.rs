//! Who may be designated to an appointment, and how many.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{HubError, HubResult};
use crate::privilege::{Privilege, find_active_by_name};
use crate::user::{User, UserStatus};

/// Users eligible for an appointment requiring `required_privilege`.
///
/// Holders of the (active) privilege are eligible, as is anyone already in
/// `designated` even if they no longer hold it, so existing assignments stay
/// visible and editable. Disabled users are left out unless already
/// designated. Order follows `users`.
pub fn eligible_users<'a>(
    users: &'a [User],
    privileges: &[Privilege],
    required_privilege: &str,
    designated: &[String],
) -> HubResult<Vec<&'a User>> {
    let privilege = find_active_by_name(privileges, required_privilege)
        .ok_or_else(|| HubError::not_found("Privilege", required_privilege))?;

    let designated: HashSet<&str> = designated.iter().map(String::as_str).collect();

    let eligible: Vec<&User> = users
        .iter()
        .filter(|u| {
            designated.contains(u.id.as_str())
                || (u.holds(&privilege.id) && u.status != UserStatus::Disabled)
        })
        .collect();

    debug!(
        privilege = %privilege.name,
        eligible = eligible.len(),
        "Resolved eligible users"
    );

    Ok(eligible)
}

/// Drop repeated ids, keeping first-seen order.
pub fn normalize(designations: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    designations
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Reject a designation list longer than `max`.
pub fn check_cap(designations: &[String], max: usize) -> HubResult<()> {
    if designations.len() > max {
        return Err(HubError::validation(format!(
            "At most {max} {} can be designated, got {}",
            if max == 1 { "person" } else { "people" },
            designations.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, privileges: &[&str]) -> User {
        let mut u = User::new(id, format!("{id}@example.com"));
        u.id = id.to_string();
        u.status = UserStatus::Active;
        u.privileges = privileges.iter().map(|p| p.to_string()).collect();
        u
    }

    fn field_service() -> Vec<Privilege> {
        vec![Privilege {
            id: "p1".into(),
            name: "Field Service".into(),
            active: true,
        }]
    }

    #[test]
    fn test_only_holders_are_eligible() {
        let users = vec![user("u1", &["p1"]), user("u2", &[])];

        let eligible = eligible_users(&users, &field_service(), "Field Service", &[]).unwrap();

        let ids: Vec<_> = eligible.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1"]);
    }

    #[test]
    fn test_previously_designated_stay_eligible() {
        let users = vec![user("u1", &["p1"]), user("u2", &[])];

        let eligible =
            eligible_users(&users, &field_service(), "field service", &["u2".into()]).unwrap();

        let ids: Vec<_> = eligible.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[test]
    fn test_disabled_holders_are_not_eligible() {
        let mut disabled = user("u3", &["p1"]);
        disabled.status = UserStatus::Disabled;
        let users = vec![user("u1", &["p1"]), disabled];

        let eligible = eligible_users(&users, &field_service(), "Field Service", &[]).unwrap();

        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn test_inactive_privilege_does_not_resolve() {
        let mut privileges = field_service();
        privileges[0].active = false;
        let users = vec![user("u1", &["p1"])];

        let result = eligible_users(&users, &privileges, "Field Service", &[]);

        assert!(matches!(result, Err(HubError::NotFound { .. })));
    }

    #[test]
    fn test_cap() {
        let three: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        assert!(check_cap(&three, 3).is_ok());
        assert!(check_cap(&three, 1).is_err());
    }

    #[test]
    fn test_normalize_removes_duplicates() {
        let ids: Vec<String> = vec!["a".into(), "b".into(), "a".into()];
        assert_eq!(normalize(&ids), vec!["a".to_string(), "b".to_string()]);
    }
}
