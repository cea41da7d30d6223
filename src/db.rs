use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime, SslMode};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewPost, NewUser, Post, PostChanges, PostWithAuthor, User, UserChanges, UserWithPosts};
use crate::store::{post_not_found, user_not_found, Store};

const USER_COLUMNS: &str = "id, name, email";
const POST_COLUMNS: &str = "id, title, content, author_id";

/// Schema statements, applied in order at startup. Each one is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "users table",
        r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255),
                email VARCHAR(255) NOT NULL,
                CONSTRAINT users_email_key UNIQUE (email)
            )
        "#,
    ),
    (
        "posts table",
        r#"
            CREATE TABLE IF NOT EXISTS posts (
                id SERIAL PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                author_id INTEGER,
                CONSTRAINT posts_author_id_fkey FOREIGN KEY (author_id)
                    REFERENCES users(id) ON DELETE SET NULL
            )
        "#,
    ),
    (
        "posts author_id index",
        "CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id)",
    ),
];

/// PostgreSQL store backed by a deadpool connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Builds the pool and checks that a connection can be made.
    pub async fn connect(config: &DatabaseConfig) -> ApiResult<Self> {
        info!("Creating PostgreSQL connection pool for {}", config.describe());

        let pool = Self::create_pool(config)?;
        let db = Database { pool };
        db.ping().await?;

        info!("Database connection test successful");
        Ok(db)
    }

    fn create_pool(config: &DatabaseConfig) -> ApiResult<Pool> {
        let mut pg_config = Config::new();

        if let Some(ref url) = config.connection_string {
            pg_config.url = Some(url.clone());
        } else {
            pg_config.host = Some(config.host.clone());
            pg_config.port = Some(config.port);
            pg_config.dbname = Some(config.database.clone());
            pg_config.user = Some(config.username.clone());
            pg_config.password = Some(config.password.clone());
            pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
                "disable" => SslMode::Disable,
                "require" => SslMode::Require,
                _ => SslMode::Prefer,
            });
        }

        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pool_config.timeouts.create = Some(config.connection_timeout);
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder().build().map_err(|e| {
            error!("Failed to create TLS connector: {}", e);
            ApiError::Database("Database connection setup failed".to_string())
        })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls).map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            ApiError::Database("Database connection setup failed".to_string())
        })
    }

    async fn get_connection(&self) -> ApiResult<Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> ApiResult<()> {
        info!("Running database migrations");

        let client = self.get_connection().await?;
        for (name, statement) in MIGRATIONS {
            client.batch_execute(statement).await.map_err(|e| {
                error!("Migration '{}' failed: {}", name, e);
                ApiError::from(e)
            })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        name: row.get(1),
        email: row.get(2),
    }
}

fn post_from_row(row: &Row) -> Post {
    Post {
        id: row.get(0),
        title: row.get(1),
        content: row.get(2),
        author_id: row.get(3),
    }
}

/// Row layout: post columns, then the joined author's columns (null when absent).
fn post_with_author_from_row(row: &Row) -> PostWithAuthor {
    let author_id: Option<i32> = row.get(4);
    let author = author_id.map(|id| User {
        id,
        name: row.get(5),
        email: row.get(6),
    });

    PostWithAuthor {
        post: post_from_row(row),
        author,
    }
}

fn split_posts(posts: Vec<NewPost>) -> (Vec<String>, Vec<String>) {
    posts.into_iter().map(|p| (p.title, p.content)).unzip()
}

#[async_trait]
impl Store for Database {
    async fn ping(&self) -> ApiResult<()> {
        let client = self.get_connection().await?;
        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Database health check failed: {}", e);
            ApiError::from(e)
        })?;
        Ok(())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);

        let rows = client.query(&query, &[]).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn find_user(&self, id: i32) -> ApiResult<Option<User>> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = client.query_opt(&query, &[&id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        let client = self.get_connection().await?;
        let query = format!(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );

        let row = client.query_one(&query, &[&user.name, &user.email]).await?;
        let created = user_from_row(&row);

        info!("Created user with id: {}", created.id);
        Ok(created)
    }

    async fn create_user_with_posts(&self, user: NewUser, posts: Vec<NewPost>) -> ApiResult<UserWithPosts> {
        let mut client = self.get_connection().await?;
        let transaction = client.transaction().await?;

        let user_query = format!(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let row = transaction.query_one(&user_query, &[&user.name, &user.email]).await?;
        let user = user_from_row(&row);

        let (titles, contents) = split_posts(posts);
        let posts_query = format!(
            "INSERT INTO posts (title, content, author_id) \
             SELECT t.title, t.content, $3::int4 FROM UNNEST($1::text[], $2::text[]) AS t(title, content) \
             RETURNING {}",
            POST_COLUMNS
        );
        let rows = transaction
            .query(&posts_query, &[&titles, &contents, &user.id])
            .await?;
        let mut posts: Vec<Post> = rows.iter().map(post_from_row).collect();
        posts.sort_by_key(|p| p.id);

        transaction.commit().await?;

        info!("Created user with id: {} and {} posts", user.id, posts.len());
        Ok(UserWithPosts { user, posts })
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> ApiResult<User> {
        // Only supplied fields become SET clauses.
        let mut assignments = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref name) = changes.name {
            params.push(name);
            assignments.push(format!("name = ${}", params.len()));
        }

        if let Some(ref email) = changes.email {
            params.push(email);
            assignments.push(format!("email = ${}", params.len()));
        }

        if assignments.is_empty() {
            return self.find_user(id).await?.ok_or_else(|| user_not_found(id));
        }

        let client = self.get_connection().await?;
        params.push(&id);
        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING {}",
            assignments.join(", "),
            params.len(),
            USER_COLUMNS
        );

        let row = client.query_opt(&query, &params).await?;
        let updated = row.as_ref().map(user_from_row).ok_or_else(|| user_not_found(id))?;

        info!("Updated user with id: {}", updated.id);
        Ok(updated)
    }

    async fn delete_user(&self, id: i32) -> ApiResult<()> {
        let client = self.get_connection().await?;

        let rows_affected = client.execute("DELETE FROM users WHERE id = $1", &[&id]).await?;
        if rows_affected == 0 {
            return Err(user_not_found(id));
        }

        info!("Deleted user with id: {}", id);
        Ok(())
    }

    async fn list_posts(&self) -> ApiResult<Vec<PostWithAuthor>> {
        let client = self.get_connection().await?;
        let query = "SELECT p.id, p.title, p.content, p.author_id, u.id, u.name, u.email \
                     FROM posts p LEFT JOIN users u ON u.id = p.author_id \
                     ORDER BY p.id";

        let rows = client.query(query, &[]).await?;
        Ok(rows.iter().map(post_with_author_from_row).collect())
    }

    async fn find_post(&self, id: i32) -> ApiResult<Option<Post>> {
        let client = self.get_connection().await?;
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);

        let row = client.query_opt(&query, &[&id]).await?;
        Ok(row.as_ref().map(post_from_row))
    }

    async fn create_post(&self, post: NewPost, author_id: i32) -> ApiResult<Post> {
        let client = self.get_connection().await?;
        let query = format!(
            "INSERT INTO posts (title, content, author_id) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        );

        let row = client
            .query_one(&query, &[&post.title, &post.content, &author_id])
            .await?;
        let created = post_from_row(&row);

        info!("Created post with id: {}", created.id);
        Ok(created)
    }

    async fn create_posts(&self, posts: Vec<NewPost>) -> ApiResult<u64> {
        if posts.is_empty() {
            return Ok(0);
        }

        let client = self.get_connection().await?;
        let (titles, contents) = split_posts(posts);
        let query = "INSERT INTO posts (title, content) \
                     SELECT * FROM UNNEST($1::text[], $2::text[])";

        let inserted = client.execute(query, &[&titles, &contents]).await?;
        info!("Bulk inserted {} posts", inserted);
        Ok(inserted)
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> ApiResult<Post> {
        let mut assignments = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref title) = changes.title {
            params.push(title);
            assignments.push(format!("title = ${}", params.len()));
        }

        if let Some(ref content) = changes.content {
            params.push(content);
            assignments.push(format!("content = ${}", params.len()));
        }

        if assignments.is_empty() {
            return self.find_post(id).await?.ok_or_else(|| post_not_found(id));
        }

        let client = self.get_connection().await?;
        params.push(&id);
        let query = format!(
            "UPDATE posts SET {} WHERE id = ${} RETURNING {}",
            assignments.join(", "),
            params.len(),
            POST_COLUMNS
        );

        let row = client.query_opt(&query, &params).await?;
        let updated = row.as_ref().map(post_from_row).ok_or_else(|| post_not_found(id))?;

        info!("Updated post with id: {}", updated.id);
        Ok(updated)
    }

    async fn delete_post(&self, id: i32) -> ApiResult<()> {
        let client = self.get_connection().await?;

        let rows_affected = client.execute("DELETE FROM posts WHERE id = $1", &[&id]).await?;
        if rows_affected == 0 {
            return Err(post_not_found(id));
        }

        info!("Deleted post with id: {}", id);
        Ok(())
    }

    async fn close(&self) {
        info!("Closing PostgreSQL connection pool");
        self.pool.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_posts_keeps_order() {
        let (titles, contents) = split_posts(vec![
            NewPost {
                title: "a".to_string(),
                content: "1".to_string(),
            },
            NewPost {
                title: "b".to_string(),
                content: "2".to_string(),
            },
        ]);

        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(contents, vec!["1", "2"]);
    }

    #[test]
    fn test_migrations_are_idempotent_statements() {
        for (name, statement) in MIGRATIONS {
            assert!(statement.contains("IF NOT EXISTS"), "migration '{}' is not idempotent", name);
        }
    }
}
