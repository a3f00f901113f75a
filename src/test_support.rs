//! Fixtures shared by the domain and API tests.

use chrono::Utc;

use crate::core_state::CoreState;
use crate::db;
use crate::models::{Role, User, UserStatus};

pub const TEST_PASSWORD: &str = "correct-horse";

/// An approved user of `role` with a live bearer token.
pub fn registered(state: &CoreState, role: Role, name: &str) -> (User, String) {
    let email = format!("{}-{}@example.com", role, uuid::Uuid::new_v4().simple());
    let id = state.identity().create_user(&email, TEST_PASSWORD).unwrap();
    let mut user = User::new(id, email.clone(), name.to_string(), role, Utc::now());
    user.status = UserStatus::Approved;
    state.store().with_conn(|conn| db::put_user(conn, &user)).unwrap();
    let session = state.identity().sign_in(&email, TEST_PASSWORD).unwrap();
    (user, session.access_token)
}

pub fn admin(state: &CoreState) -> User {
    registered(state, Role::Admin, "Admin").0
}
