use crate::domain::user::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Right {
    GetUsers,
    ManageUsers,
    Follow,
    Post,
    Timeline,
}

const USER_RIGHTS: &[Right] = &[Right::GetUsers, Right::Follow, Right::Post, Right::Timeline];

const ADMIN_RIGHTS: &[Right] = &[
    Right::GetUsers,
    Right::ManageUsers,
    Right::Follow,
    Right::Timeline,
    Right::Post,
];

pub fn role_rights(role: Role) -> &'static [Right] {
    match role {
        Role::User => USER_RIGHTS,
        Role::Admin => ADMIN_RIGHTS,
    }
}

pub fn has_right(role: Role, right: Right) -> bool {
    role_rights(role).contains(&right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admins_manage_users() {
        assert!(has_right(Role::Admin, Right::ManageUsers));
        assert!(!has_right(Role::User, Right::ManageUsers));
        assert!(has_right(Role::User, Right::Timeline));
    }
}
