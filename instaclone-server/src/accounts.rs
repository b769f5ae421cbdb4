//! Registration, login, token refresh and password changes.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use instaclone_types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UserDetail,
};

use crate::db::repositories::{NewUser, UserRepository};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult, Validator, NON_FIELD_ERRORS};
use crate::password;
use crate::profiles::ProfileService;
use crate::session::SessionManager;

pub const MAX_NAME_LEN: usize = 30;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,30}$").expect("username pattern is valid"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Email shape and uniqueness, recorded on `v` under `email`
pub(crate) fn check_email(
    v: &mut Validator,
    users: &UserRepository,
    email: &str,
    except: Option<&Uuid>,
) -> DomainResult<()> {
    if email.is_empty() {
        v.add("email", "This field may not be blank.");
    } else if !is_valid_email(email) {
        v.add("email", "Enter a valid email address.");
    } else if users.email_taken(email, except)? {
        v.add("email", "A user with this email already exists.");
    }
    Ok(())
}

pub(crate) fn check_name(v: &mut Validator, field: &str, value: &str) {
    if value.chars().count() > MAX_NAME_LEN {
        v.add(
            field,
            format!("Ensure this field has no more than {} characters.", MAX_NAME_LEN),
        );
    }
}

pub struct AccountService {
    pool: DbPool,
    sessions: SessionManager,
}

impl AccountService {
    pub fn new(pool: DbPool, sessions: SessionManager) -> Self {
        Self { pool, sessions }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn register(&self, request: &RegisterRequest) -> DomainResult<UserDetail> {
        let users = self.users();
        let username = request.username.trim();
        let email = request.email.trim();
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();

        let mut v = Validator::new();
        if !is_valid_username(username) {
            v.add(
                "username",
                "Username must be 3-30 characters and contain only letters, numbers and underscores.",
            );
        } else if users.username_taken(username)? {
            v.add("username", "A user with that username already exists.");
        }
        check_email(&mut v, &users, email, None)?;
        check_name(&mut v, "first_name", first_name);
        check_name(&mut v, "last_name", last_name);

        if request.password != request.password_confirm {
            v.add(NON_FIELD_ERRORS, "Passwords don't match");
        }
        for problem in password::strength_problems(&request.password, username) {
            v.add("password", problem);
        }
        v.finish()?;

        let hash = password::hash_password(&request.password)?;
        let user = users.create_with_profile(&NewUser {
            username,
            email,
            first_name,
            last_name,
            password_hash: &hash,
        })?;

        ProfileService::new(self.pool.clone()).own_detail(&user.id)
    }

    pub fn login(&self, request: &LoginRequest) -> DomainResult<LoginResponse> {
        let found = self.users().get_credentials(request.username.trim())?;
        let user = match found {
            Some((user, hash)) if user.is_active && password::verify_password(&request.password, &hash) => user,
            _ => {
                tracing::debug!("Rejected login for {}", request.username);
                return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let tokens = self.sessions.create_session(user.id)?;
        let detail = ProfileService::new(self.pool.clone()).own_detail(&user.id)?;
        tracing::info!("User {} logged in", user.username);

        Ok(LoginResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user: detail,
        })
    }

    pub fn refresh(&self, refresh_token: &str) -> DomainResult<String> {
        match self.sessions.refresh(refresh_token)? {
            Ok(access) => Ok(access),
            Err(rejection) => {
                tracing::debug!("Refresh rejected: {:?}", rejection);
                Err(DomainError::Unauthorized(
                    "Token is invalid or expired".to_string(),
                ))
            }
        }
    }

    pub fn logout(&self, access_token: &str) -> DomainResult<()> {
        self.sessions.delete_session(access_token)?;
        Ok(())
    }

    /// Change the password and revoke every other session of the user
    pub fn change_password(
        &self,
        user_id: &Uuid,
        current_token: &str,
        request: &ChangePasswordRequest,
    ) -> DomainResult<()> {
        let users = self.users();
        let user = users
            .get_by_id(user_id)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        let hash = users.get_password_hash(user_id)?.unwrap_or_default();

        let mut v = Validator::new();
        if !password::verify_password(&request.old_password, &hash) {
            v.add("old_password", "Old password is not correct");
        }
        if request.new_password != request.new_password_confirm {
            v.add("new_password_confirm", "New passwords don't match");
        }
        for problem in password::strength_problems(&request.new_password, &user.username) {
            v.add("new_password", problem);
        }
        v.finish()?;

        users.set_password_hash(user_id, &password::hash_password(&request.new_password)?)?;
        self.sessions.revoke_other_sessions(user_id, current_token)?;
        tracing::info!("User {} changed password", user.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::Duration;

    fn setup() -> (Database, AccountService) {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        let sessions = SessionManager::new(db.clone(), Duration::minutes(60), Duration::days(7));
        let service = AccountService::new(db.pool.clone(), sessions);
        (db, service)
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: password.to_string(),
            password_confirm: password.to_string(),
        }
    }

    fn field_errors(result: DomainResult<UserDetail>) -> instaclone_types::FieldErrors {
        match result {
            Err(DomainError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other.map(|u| u.username)),
        }
    }

    #[test]
    fn test_register_then_login() {
        let (_db, service) = setup();
        let detail = service.register(&register_request("erin", "blue-sky-42")).unwrap();
        assert_eq!(detail.username, "erin");
        assert_eq!(detail.profile.followers_count, 0);

        let login = service
            .login(&LoginRequest {
                username: "erin".to_string(),
                password: "blue-sky-42".to_string(),
            })
            .unwrap();
        assert_eq!(login.user.id, detail.id);
        assert!(!login.access.is_empty());
    }

    #[test]
    fn test_wrong_password_is_unauthorized() {
        let (_db, service) = setup();
        service.register(&register_request("erin", "blue-sky-42")).unwrap();

        match service.login(&LoginRequest {
            username: "erin".to_string(),
            password: "nope-nope-nope".to_string(),
        }) {
            Err(DomainError::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            other => panic!("unexpected {:?}", other.map(|r| r.access)),
        }
    }

    #[test]
    fn test_register_validation() {
        let (_db, service) = setup();
        service.register(&register_request("erin", "blue-sky-42")).unwrap();

        let errors = field_errors(service.register(&register_request("ERIN", "blue-sky-42")));
        assert_eq!(
            errors["username"],
            vec!["A user with that username already exists."]
        );

        let errors = field_errors(service.register(&register_request("x!", "blue-sky-42")));
        assert!(errors.contains_key("username"));

        let errors = field_errors(service.register(&register_request("frank", "1234567890")));
        assert_eq!(errors["password"], vec!["This password is entirely numeric."]);

        let mut mismatch = register_request("gina", "blue-sky-42");
        mismatch.password_confirm = "blue-sky-43".to_string();
        let errors = field_errors(service.register(&mismatch));
        assert_eq!(errors[NON_FIELD_ERRORS], vec!["Passwords don't match"]);

        let mut bad_email = register_request("hank", "blue-sky-42");
        bad_email.email = "not-an-email".to_string();
        let errors = field_errors(service.register(&bad_email));
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn test_change_password_revokes_other_sessions() {
        let (_db, service) = setup();
        let detail = service.register(&register_request("erin", "blue-sky-42")).unwrap();
        let login = |password: &str| {
            service.login(&LoginRequest {
                username: "erin".to_string(),
                password: password.to_string(),
            })
        };
        let current = login("blue-sky-42").unwrap();
        let other = login("blue-sky-42").unwrap();

        let bad = ChangePasswordRequest {
            old_password: "wrong-one".to_string(),
            new_password: "green-field-7".to_string(),
            new_password_confirm: "green-field-7".to_string(),
        };
        assert!(matches!(
            service.change_password(&detail.id, &current.access, &bad),
            Err(DomainError::Validation(_))
        ));

        let good = ChangePasswordRequest {
            old_password: "blue-sky-42".to_string(),
            ..bad
        };
        service
            .change_password(&detail.id, &current.access, &good)
            .unwrap();

        assert!(login("blue-sky-42").is_err());
        assert!(login("green-field-7").is_ok());
        assert!(service.sessions.validate_access(&current.access).unwrap().is_ok());
        assert!(service.sessions.validate_access(&other.access).unwrap().is_err());
    }

    #[test]
    fn test_refresh_with_unknown_token() {
        let (_db, service) = setup();
        assert!(matches!(
            service.refresh("not-a-token"),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
