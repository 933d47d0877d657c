//! # Supplier Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use grox_core::Supplier;

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier. A taken name fails with `UniqueViolation`.
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier: Option<Supplier> = sqlx::query_as(
            "SELECT id, name, phone, email, created_at FROM suppliers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// All suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers: Vec<Supplier> = sqlx::query_as(
            "SELECT id, name, phone, email, created_at FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use grox_core::{generate_id, Supplier};

    use crate::test_support::memory_db;

    fn supplier(name: &str) -> Supplier {
        Supplier {
            id: generate_id(),
            name: name.to_string(),
            phone: Some("+254700000000".to_string()),
            email: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_list() {
        let db = memory_db().await;
        let repo = db.suppliers();

        let b = supplier("Bidco");
        let a = supplier("Annex Wholesalers");
        repo.insert(&b).await.unwrap();
        repo.insert(&a).await.unwrap();

        assert_eq!(repo.get_by_id(&b.id).await.unwrap().unwrap().name, "Bidco");
        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Annex Wholesalers", "Bidco"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = memory_db().await;
        db.suppliers().insert(&supplier("Bidco")).await.unwrap();

        let err = db.suppliers().insert(&supplier("Bidco")).await.unwrap_err();
        assert!(err.is_unique_violation_on("suppliers.name"));
    }
}
