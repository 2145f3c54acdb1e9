use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::domain::{AuthSession, LoginInput, RegisterInput, SessionUser};
use crate::domain::{NewUser, Role, User};
use crate::errors::ServiceError;
use crate::password::{hash_password_blocking, verify_password_blocking, PASSWORD_ALGORITHM};
use crate::repository::UserRepository;
use crate::token::{TokenConfig, TokenIssuer};

const INVALID_CREDENTIALS: &str = "invalid credentials";
const INACTIVE: &str = "account is inactive";

/// Auth business service independent of web framework
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    min_password_len: usize,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: &TokenConfig, min_password_len: usize) -> Self {
        Self { users, tokens: TokenIssuer::new(tokens), min_password_len }
    }

    /// Register a customer or worker and hand back a session.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, domain::RegisterInput};
    /// use service::repository::memory::MemoryStore;
    /// use service::token::TokenConfig;
    /// let svc = AuthService::new(Arc::new(MemoryStore::new()), &TokenConfig::new("secret", 1), 6);
    /// let input = RegisterInput {
    ///     name: "Alice".into(), email: "Alice@Example.com".into(), password: "secret1".into(),
    ///     phone: "1234567890".into(), role: None, location: "New York".into(), specialization: None,
    /// };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.email, "alice@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, ServiceError> {
        let user = self.create_account(input, false).await?;
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { message: "User registered successfully".into(), token, user: SessionUser::from(&user) })
    }

    /// Like [`AuthService::register`] but may create admins and issues no token.
    /// Used for provisioning, never exposed over HTTP.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn provision(&self, input: RegisterInput) -> Result<User, ServiceError> {
        self.create_account(input, true).await
    }

    async fn create_account(&self, input: RegisterInput, allow_admin: bool) -> Result<User, ServiceError> {
        let (new_user, password) = self.validate_registration(input, allow_admin)?;
        if let Some(existing) = self.users.find_user_by_email(&new_user.email).await? {
            debug!(user_id = %existing.id, "email already registered");
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        let hash = hash_password_blocking(password).await?;
        // a concurrent registration can still win here; the store reports Conflict
        let user = self.users.insert_user(new_user, hash, PASSWORD_ALGORITHM).await?;
        info!(user_id = %user.id, role = %user.role, "user_registered");
        Ok(user)
    }

    fn validate_registration(&self, input: RegisterInput, allow_admin: bool) -> Result<(NewUser, String), ServiceError> {
        let mut errors: Vec<String> = Vec::new();

        let name = input.name.trim().to_string();
        if let Err(e) = models::user::validate_name(&name) {
            errors.push(model_msg(e));
        }
        let email = models::user::normalize_email(&input.email);
        if models::user::validate_email(&email).is_err() {
            errors.push("please include a valid email".into());
        }
        if input.password.chars().count() < self.min_password_len {
            errors.push(format!("password must be at least {} characters", self.min_password_len));
        }
        let phone = input.phone.trim().to_string();
        if phone.is_empty() {
            errors.push("phone number is required".into());
        }
        let location = input.location.trim().to_string();
        if location.is_empty() {
            errors.push("location is required".into());
        }
        let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => Some(Role::Customer),
            Some(raw) => match raw.parse::<Role>() {
                Ok(Role::Admin) if !allow_admin => {
                    errors.push("role must be customer or worker".into());
                    None
                }
                Ok(r) => Some(r),
                Err(_) => {
                    errors.push("role must be customer or worker".into());
                    None
                }
            },
        };
        let specialization = input.specialization.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if role == Some(Role::Worker) && specialization.is_none() {
            errors.push("specialization is required for workers".into());
        }

        match role {
            Some(role) if errors.is_empty() => Ok((
                NewUser {
                    name,
                    email,
                    phone,
                    role,
                    location,
                    specialization: if role == Role::Worker { specialization } else { None },
                },
                input.password,
            )),
            _ => Err(ServiceError::Validation(errors.join("; "))),
        }
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password look the same to the caller. The
    /// active flag is checked only after the password matched.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, ServiceError> {
        let email = models::user::normalize_email(&input.email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated(INVALID_CREDENTIALS.into()))?;
        let cred = self
            .users
            .get_credentials(user.id)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated(INVALID_CREDENTIALS.into()))?;

        if !verify_password_blocking(input.password, cred.password_hash).await? {
            return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }
        if !user.is_active {
            return Err(ServiceError::Unauthenticated(INACTIVE.into()));
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { message: "Login successful".into(), token, user: SessionUser::from(&user) })
    }

    /// Resolve a bearer token to the current user, re-reading the account so
    /// deactivation takes effect immediately.
    pub async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        let user_id = self.tokens.verify(token)?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated("user no longer exists".into()))?;
        if !user.is_active {
            return Err(ServiceError::Unauthenticated(INACTIVE.into()));
        }
        Ok(user)
    }
}

fn model_msg(e: models::errors::ModelError) -> String {
    match e {
        models::errors::ModelError::Validation(m) | models::errors::ModelError::Conflict(m) | models::errors::ModelError::Db(m) => m,
    }
}
