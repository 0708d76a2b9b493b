//! Category and product repositories.
//!
//! Both tables are written only by staff. Deleting a category that still
//! has products, or a product that orders point at, is refused by the
//! `ON DELETE RESTRICT` foreign keys and surfaces as a conflict.

use sqlx::PgPool;

use sonic_core::{CategoryId, ProductId};

use super::{RepositoryError, expect_row};
use crate::models::{Category, CategoryInput, Product, ProductFilter, ProductInput};

const CATEGORY_COLUMNS: &str = r"
    c.id, c.name, c.slug, c.description, c.image_url,
    (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count,
    c.created_at, c.updated_at
";

const PRODUCT_COLUMNS: &str = r"
    p.id, p.category_id, c.name AS category_name, p.name, p.slug, p.description,
    p.price, p.mrp, p.image_urls, p.min_quantity, p.max_quantity, p.is_active,
    p.created_at, p.updated_at
";

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c ORDER BY c.name");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(categories)
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id = $1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(category)
    }

    /// Whether a category with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO categories (name, slug, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "a category with this slug already exists"))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this id.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, image_url = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.image_url.as_deref())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "a category with this slug already exists"))?;

        expect_row(result.rows_affected())?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this id.
    /// Returns `RepositoryError::Conflict` if products still belong to it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category still has products"))?;
        expect_row(result.rows_affected())
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products matching the filter, active or not, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE ($1::INTEGER IS NULL OR p.category_id = $1)
              AND ($2::TEXT IS NULL OR p.name ILIKE $2 OR p.slug ILIKE $2)
            ORDER BY p.name
            "
        );

        let pattern = filter
            .search
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term)));

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category_id)
            .bind(pattern)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Whether a product with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category vanished.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO products (
                category_id, name, slug, description, price, mrp, image_urls,
                min_quantity, max_quantity, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.mrp)
        .bind(&input.image_urls)
        .bind(input.min_quantity)
        .bind(input.max_quantity)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "a product with this slug already exists"))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET category_id = $2, name = $3, slug = $4, description = $5, price = $6,
                mrp = $7, image_urls = $8, min_quantity = $9, max_quantity = $10,
                is_active = $11
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.mrp)
        .bind(&input.image_urls)
        .bind(input.min_quantity)
        .bind(input.max_quantity)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "a product with this slug already exists"))?;

        expect_row(result.rows_affected())?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Its deals go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    /// Returns `RepositoryError::Conflict` if orders reference it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_write(e, "product is referenced by orders, deactivate it instead")
            })?;
        expect_row(result.rows_affected())
    }
}
