use parking_core::identity::{hash_password, normalize_email, verify_password};
use parking_core::{LedgerError, LedgerResult, RequestContext, UserRepository};
use parking_shared::{ProfileUpdate, User, UserDraft};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Registration, profile edits and credential checks
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create a regular (non-admin) account.
    pub async fn register_user(&self, draft: UserDraft) -> LedgerResult<User> {
        let email = parse_email(&draft.email)?;
        let name = required("name", &draft.name)?;
        let password = required("password", draft.password.expose())?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(LedgerError::DuplicateEmail(email));
        }

        let mut user = User::new(email, hash_password(&password)?, name, false);
        user.address = optional(draft.address);
        user.postal_code = optional(draft.postal_code);
        self.users.insert_user(&user).await?;

        info!("User {} registered", user.id);
        Ok(user)
    }

    /// The caller edits their own profile. An absent password keeps the current one.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        update: ProfileUpdate,
    ) -> LedgerResult<User> {
        let mut user = self
            .users
            .get_user(ctx.actor.user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("User", ctx.actor.user_id))?;

        user.name = required("name", &update.name)?;
        if let Some(password) = update.password {
            user.password_digest = hash_password(&required("password", password.expose())?)?;
        }
        user.address = optional(update.address);
        user.postal_code = optional(update.postal_code);

        self.users.update_user(&user).await?;
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> LedgerResult<User> {
        let invalid = || LedgerError::Unauthorized("invalid email or password".to_string());
        let email = normalize_email(email).ok_or_else(invalid)?;

        match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(password, &user.password_digest) => Ok(user),
            _ => Err(invalid()),
        }
    }

    /// Create the administrator account unless the email is already taken.
    /// Returns the account and whether it was created by this call.
    pub async fn ensure_default_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> LedgerResult<(User, bool)> {
        let email = parse_email(email)?;
        if let Some(existing) = self.users.find_by_email(&email).await? {
            info!("Admin account {} already exists", existing.id);
            return Ok((existing, false));
        }

        let user = User::new(
            email,
            hash_password(&required("password", password)?)?,
            required("name", name)?,
            true,
        );
        self.users.insert_user(&user).await?;

        info!("Default admin {} created", user.id);
        Ok((user, true))
    }

    /// Admin lookup of any account by id; `None` when no such user exists
    pub async fn find_user(&self, ctx: &RequestContext, user_id: Uuid) -> LedgerResult<Option<User>> {
        ctx.require_admin()?;
        Ok(self.users.get_user(user_id).await?)
    }

    /// Regular accounts, for the admin user listing
    pub async fn list_users(&self, ctx: &RequestContext) -> LedgerResult<Vec<User>> {
        ctx.require_admin()?;
        let users = self.users.list_users().await?;
        Ok(users.into_iter().filter(|u| !u.is_admin).collect())
    }
}

fn parse_email(raw: &str) -> LedgerResult<String> {
    normalize_email(raw).ok_or_else(|| LedgerError::Validation(format!("invalid email: {}", raw.trim())))
}

fn required(field: &str, value: &str) -> LedgerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(LedgerError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
