use chrono::{DateTime, Utc};
use parking_shared::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, LedgerResult};

/// The authenticated caller of a ledger operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin,
        }
    }
}

/// Per-request state handed to every ledger operation: who is calling, and when.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(actor: Actor) -> Self {
        Self::at(actor, Utc::now())
    }

    pub fn at(actor: Actor, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    pub fn require_admin(&self) -> LedgerResult<()> {
        if self.actor.is_admin {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized("admin access required".to_string()))
        }
    }

    /// Reservations are for regular users only.
    pub fn require_user(&self) -> LedgerResult<()> {
        if self.actor.is_admin {
            Err(LedgerError::Unauthorized(
                "admins cannot reserve parking spots".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
