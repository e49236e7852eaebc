//! Active user slice. At most one user is signed in at a time.

use super::{SliceContext, StoreError, StoreResult};
use crate::deps::EntityKind;
use crate::model::event::{EventInput, USER_EVENT};
use crate::model::user::{User, UserPatch};

pub struct UserSlice {
    ctx: SliceContext,
    current: Option<User>,
}

impl UserSlice {
    pub(crate) fn new(ctx: SliceContext) -> Self {
        Self { ctx, current: None }
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// Returns `NO_USER` when nobody is signed in.
    pub fn require(&self) -> StoreResult<&User> {
        self.current.as_ref().ok_or(StoreError::NoUser)
    }

    pub fn sign_in(&mut self, mut user: User) -> StoreResult<User> {
        if let Some(active) = &self.current {
            return Err(StoreError::duplicate(EntityKind::User, active.id));
        }
        user.last_updated = self.ctx.now();
        self.current = Some(user.clone());
        self.ctx
            .emit(EventInput::new(USER_EVENT, format!("Signed in as {}", user.name)));
        Ok(user)
    }

    pub fn update_profile(&mut self, patch: &UserPatch) -> StoreResult<User> {
        let now = self.ctx.now();
        let user = self.current.as_mut().ok_or(StoreError::NoUser)?;
        patch.apply_to(user);
        user.last_updated = now;
        let updated = user.clone();

        self.ctx.emit(
            EventInput::new(USER_EVENT, "Profile updated")
                .with_description(format!("Profile saved for {}.", updated.name)),
        );
        Ok(updated)
    }

    pub fn sign_out(&mut self) -> StoreResult<User> {
        let user = self.current.take().ok_or(StoreError::NoUser)?;
        self.ctx
            .emit(EventInput::new(USER_EVENT, format!("Signed out {}", user.name)));
        Ok(user)
    }

    /// Puts back the captured pre-image; `None` means "nobody signed in".
    pub fn restore(&mut self, pre_image: Option<User>) {
        self.current = pre_image;
        self.ctx.emit(EventInput::new(USER_EVENT, "Profile restored"));
    }

    pub(crate) fn load_snapshot(&mut self, record: Option<User>) {
        self.current = record;
    }
}
