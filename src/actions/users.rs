use std::sync::Arc;

use super::{Abilities, Context};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::User;

/// Password changes, which the field whitelist on Update never allows.
pub struct UserController {
    users: Arc<dyn Store<User>>,
}

impl UserController {
    pub fn new(users: Arc<dyn Store<User>>) -> Self {
        Self { users }
    }

    pub async fn change_password(&self, ctx: &Context, name: &str, password: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("user name is required"));
        }
        let mut user = self
            .users
            .get_by_name("", name)
            .await?
            .ok_or_else(Error::not_found)?;
        if !Abilities::<User>::new(ctx).can_change_password(&user) {
            return Err(Error::permission_denied());
        }

        User::validate_password(password)?;
        user.password_hash = User::hash_password(&user.meta.name, password);
        self.users.update(&user).await?;
        tracing::info!(user = %user.meta.name, by = %ctx.viewer.username, "password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::*;
    use crate::actions::Controller;
    use crate::auth::Viewer;
    use crate::error::ErrCode;
    use crate::store::{KeyBuilder, MemoryStore, ResourceStore};

    async fn seeded() -> (UserController, ResourceStore<User>) {
        let store: ResourceStore<User> =
            ResourceStore::new(Arc::new(MemoryStore::new()), KeyBuilder::default());
        let root = Context::cluster(Viewer::cluster_admin("root"));
        let users = Controller::<User>::new(Arc::new(store.clone()));
        users.create(&root, User::fixture("alice")).await.unwrap();
        users.create(&root, User::fixture("bob")).await.unwrap();
        (UserController::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn users_change_their_own_password() {
        let (users, store) = seeded().await;
        let alice = viewer_with("", "alice", Vec::new());

        users.change_password(&alice, "alice", "correct horse").await.unwrap();
        let stored = store.get_by_name("", "alice").await.unwrap().unwrap();
        assert!(stored.verify_password("correct horse"));
        assert!(!stored.verify_password("P@ssw0rd!"));

        let err = users.change_password(&alice, "bob", "correct horse").await.unwrap_err();
        assert_eq!(err.code, ErrCode::PermissionDenied);
    }

    #[tokio::test]
    async fn admins_change_anyones_password() {
        let (users, store) = seeded().await;
        let root = Context::cluster(Viewer::cluster_admin("root"));
        users.change_password(&root, "bob", "hunter2hunter2").await.unwrap();
        assert!(store.get_by_name("", "bob").await.unwrap().unwrap().verify_password("hunter2hunter2"));

        assert_eq!(
            users.change_password(&root, "carol", "hunter2hunter2").await.unwrap_err().code,
            ErrCode::NotFound
        );
        assert_eq!(
            users.change_password(&root, "bob", "short").await.unwrap_err().code,
            ErrCode::InvalidArgument
        );
    }
}
