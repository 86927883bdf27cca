//! Platform user service - registration and activity tracking

use crate::{entities::platform_user, prelude::*};

pub struct Users<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Users<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Find or register the platform identity, refreshing last-active and
  /// picking up display-name changes on every interaction.
  pub async fn get_or_create(
    &self,
    platform: &str,
    platform_user_id: &str,
    display_name: Option<&str>,
  ) -> Result<platform_user::Model> {
    let found = platform_user::Entity::find()
      .filter(platform_user::Column::Platform.eq(platform))
      .filter(platform_user::Column::PlatformUserId.eq(platform_user_id))
      .one(self.db)
      .await
      .map_err(Error::db("get_or_create_user"))?;

    let now = Utc::now().naive_utc();

    if let Some(user) = found {
      let fresh_name = display_name.map(str::to_string);
      let name_changed =
        fresh_name.is_some() && fresh_name != user.display_name;

      let mut active: platform_user::ActiveModel = user.into();
      active.last_active_at = Set(now);
      if name_changed {
        active.display_name = Set(fresh_name);
      }
      return active
        .update(self.db)
        .await
        .map_err(Error::db("touch_user"));
    }

    let user = platform_user::ActiveModel {
      platform: Set(platform.to_string()),
      platform_user_id: Set(platform_user_id.to_string()),
      display_name: Set(display_name.map(str::to_string)),
      created_at: Set(now),
      last_active_at: Set(now),
      ..Default::default()
    };

    user.insert(self.db).await.map_err(Error::db("create_user"))
  }

  #[allow(dead_code)]
  pub async fn by_id(&self, id: i64) -> Result<Option<platform_user::Model>> {
    platform_user::Entity::find_by_id(id)
      .one(self.db)
      .await
      .map_err(Error::db("get_user"))
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{DbBackend, Schema};

  use super::*;
  use crate::entities::platform_user;

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(platform_user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  #[tokio::test]
  async fn registration_is_idempotent_per_identity() {
    let db = setup_test_db().await;
    let sv = Users::new(&db);

    let first = sv.get_or_create("telegram", "42", Some("alice")).await.unwrap();
    let second = sv.get_or_create("telegram", "42", Some("alice")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(
      platform_user::Entity::find().count(&db).await.unwrap(),
      1
    );
  }

  #[tokio::test]
  async fn same_native_id_on_another_platform_is_a_new_user() {
    let db = setup_test_db().await;
    let sv = Users::new(&db);

    let telegram = sv.get_or_create("telegram", "42", None).await.unwrap();
    let discord = sv.get_or_create("discord", "42", None).await.unwrap();

    assert_ne!(telegram.id, discord.id);
  }

  #[tokio::test]
  async fn display_name_refreshes_on_contact() {
    let db = setup_test_db().await;
    let sv = Users::new(&db);

    sv.get_or_create("telegram", "42", Some("alice")).await.unwrap();
    let renamed =
      sv.get_or_create("telegram", "42", Some("alice_the_great")).await.unwrap();

    assert_eq!(renamed.display_name.as_deref(), Some("alice_the_great"));
  }
}
