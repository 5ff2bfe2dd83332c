//! Emergency contact repository

use anyhow::Result;
use common::models::{EmergencyContact, MAX_CONTACTS, NewContact};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const CONTACT_COLUMNS: &str = "id, user_id, name, email, created_at, updated_at";

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All contacts of a user, oldest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>> {
        let contacts = sqlx::query_as::<_, EmergencyContact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM emergency_contacts WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    /// Insert a contact unless the user already has [`MAX_CONTACTS`]
    ///
    /// Returns `None` when the user is at the limit. The owning user row is
    /// locked for the count and insert, so concurrent adds for one user are
    /// serialized. A duplicate email for the same user is a unique violation.
    pub async fn create(
        &self,
        user_id: Uuid,
        contact: &NewContact,
    ) -> Result<Option<EmergencyContact>> {
        info!("Adding emergency contact for user: {}", user_id);

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        let contact = sqlx::query_as::<_, EmergencyContact>(&format!(
            r#"
            INSERT INTO emergency_contacts (user_id, name, email)
            SELECT $1::uuid, $2::text, $3::text
            WHERE (SELECT COUNT(*) FROM emergency_contacts WHERE user_id = $1::uuid) < $4
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(MAX_CONTACTS as i64)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(contact)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EmergencyContact>> {
        let contact = sqlx::query_as::<_, EmergencyContact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM emergency_contacts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }

    /// Delete a contact owned by `user_id`
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM emergency_contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool, run_migrations};

    async fn setup() -> Result<(ContactRepository, Uuid)> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        run_migrations(&pool).await?;

        let username = format!("ct_{}", &Uuid::new_v4().simple().to_string()[..12]);
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(username)
        .fetch_one(&pool)
        .await?;

        Ok((ContactRepository::new(pool), user_id))
    }

    fn contact(n: usize) -> NewContact {
        NewContact {
            name: format!("Contact {n}"),
            email: format!("contact{n}@example.com"),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_fourth_contact_is_rejected() -> Result<()> {
        let (repo, user_id) = setup().await?;

        for n in 0..MAX_CONTACTS {
            assert!(repo.create(user_id, &contact(n)).await?.is_some());
        }
        assert!(repo.create(user_id, &contact(MAX_CONTACTS)).await?.is_none());
        assert_eq!(repo.list(user_id).await?.len(), MAX_CONTACTS);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_concurrent_adds_respect_limit() -> Result<()> {
        let (repo, user_id) = setup().await?;
        for n in 0..MAX_CONTACTS - 1 {
            repo.create(user_id, &contact(n)).await?;
        }

        let (c10, c11) = (contact(10), contact(11));
        let (first, second) = tokio::join!(
            repo.create(user_id, &c10),
            repo.create(user_id, &c11),
        );
        let added = [first?, second?].iter().filter(|c| c.is_some()).count();

        assert_eq!(added, 1);
        assert_eq!(repo.list(user_id).await?.len(), MAX_CONTACTS);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_duplicate_email_is_unique_violation() -> Result<()> {
        let (repo, user_id) = setup().await?;
        repo.create(user_id, &contact(0)).await?;

        let err = repo
            .create(user_id, &contact(0))
            .await
            .expect_err("duplicate email must fail");
        assert!(crate::repositories::is_unique_violation(&err));
        Ok(())
    }
}
