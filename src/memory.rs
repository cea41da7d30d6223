use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{NewPost, NewUser, Post, PostChanges, PostWithAuthor, User, UserChanges, UserWithPosts};
use crate::store::{post_not_found, user_not_found, Store};

/// In-process store with the same contract as the PostgreSQL one:
/// sequential ids, unique email, author must exist, author delete sets
/// `author_id` to null.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, Post>,
    last_user_id: i32,
    last_post_id: i32,
}

impl Tables {
    fn ensure_email_free(&self, email: &str, except: Option<i32>) -> ApiResult<()> {
        let taken = self
            .users
            .values()
            .any(|u| u.email == email && Some(u.id) != except);
        if taken {
            return Err(ApiError::conflict("Email address already exists"));
        }
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser) -> User {
        self.last_user_id += 1;
        let user = User {
            id: self.last_user_id,
            name: user.name,
            email: user.email,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    fn insert_post(&mut self, post: NewPost, author_id: Option<i32>) -> Post {
        self.last_post_id += 1;
        let post = Post {
            id: self.last_post_id,
            title: post.title,
            content: post.content,
            author_id,
        };
        self.posts.insert(post.id, post.clone());
        post
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> ApiResult<()> {
        Ok(())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i32) -> ApiResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        let mut tables = self.tables.write().await;
        tables.ensure_email_free(&user.email, None)?;

        let created = tables.insert_user(user);
        info!("Created user with id: {}", created.id);
        Ok(created)
    }

    async fn create_user_with_posts(&self, user: NewUser, posts: Vec<NewPost>) -> ApiResult<UserWithPosts> {
        let mut tables = self.tables.write().await;
        tables.ensure_email_free(&user.email, None)?;

        let user = tables.insert_user(user);
        let posts = posts
            .into_iter()
            .map(|post| tables.insert_post(post, Some(user.id)))
            .collect();

        Ok(UserWithPosts { user, posts })
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> ApiResult<User> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(user_not_found(id));
        }
        if let Some(ref email) = changes.email {
            tables.ensure_email_free(email, Some(id))?;
        }

        let user = tables.users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        changes.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i32) -> ApiResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or_else(|| user_not_found(id))?;

        for post in tables.posts.values_mut() {
            if post.author_id == Some(id) {
                post.author_id = None;
            }
        }
        Ok(())
    }

    async fn list_posts(&self) -> ApiResult<Vec<PostWithAuthor>> {
        let tables = self.tables.read().await;
        let posts = tables
            .posts
            .values()
            .map(|post| PostWithAuthor {
                post: post.clone(),
                author: post.author_id.and_then(|id| tables.users.get(&id).cloned()),
            })
            .collect();
        Ok(posts)
    }

    async fn find_post(&self, id: i32) -> ApiResult<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn create_post(&self, post: NewPost, author_id: i32) -> ApiResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(ApiError::validation("Referenced author does not exist"));
        }

        let created = tables.insert_post(post, Some(author_id));
        info!("Created post with id: {}", created.id);
        Ok(created)
    }

    async fn create_posts(&self, posts: Vec<NewPost>) -> ApiResult<u64> {
        let mut tables = self.tables.write().await;
        let mut count = 0;
        for post in posts {
            tables.insert_post(post, None);
            count += 1;
        }
        Ok(count)
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> ApiResult<Post> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&id).ok_or_else(|| post_not_found(id))?;
        changes.apply(post);
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i32) -> ApiResult<()> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or_else(|| post_not_found(id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: Some("Tester".to_string()),
            email: email.to_string(),
        }
    }

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: format!("{} body", title),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();

        let first = assert_ok!(store.create_user(new_user("a@example.com")).await);
        let second = assert_ok!(store.create_user(new_user("b@example.com")).await);

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        assert_ok!(store.create_user(new_user("a@example.com")).await);

        let err = assert_err!(store.create_user(new_user("a@example.com")).await);
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_email_to_own_value_is_allowed() {
        let store = MemoryStore::new();
        let user = assert_ok!(store.create_user(new_user("a@example.com")).await);

        let changes = UserChanges {
            name: None,
            email: Some("a@example.com".to_string()),
        };
        assert_ok!(store.update_user(user.id, changes).await);
    }

    #[tokio::test]
    async fn test_update_missing_user_with_taken_email_is_not_found() {
        let store = MemoryStore::new();
        assert_ok!(store.create_user(new_user("a@example.com")).await);

        let changes = UserChanges {
            name: None,
            email: Some("a@example.com".to_string()),
        };
        let err = assert_err!(store.update_user(99, changes).await);
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_post_requires_existing_author() {
        let store = MemoryStore::new();

        let err = assert_err!(store.create_post(new_post("orphan"), 42).await);
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(store.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_author_nulls_post_reference() {
        let store = MemoryStore::new();
        let created = assert_ok!(
            store
                .create_user_with_posts(new_user("a@example.com"), vec![new_post("one"), new_post("two")])
                .await
        );
        assert_eq!(created.posts.len(), 2);

        assert_ok!(store.delete_user(created.user.id).await);

        let posts = store.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.post.author_id.is_none() && p.author.is_none()));
    }

    #[tokio::test]
    async fn test_failed_nested_create_writes_nothing() {
        let store = MemoryStore::new();
        assert_ok!(store.create_user(new_user("a@example.com")).await);

        assert_err!(
            store
                .create_user_with_posts(new_user("a@example.com"), vec![new_post("lost")])
                .await
        );
        assert!(store.list_posts().await.unwrap().is_empty());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let store = MemoryStore::new();

        assert!(store.find_user(1).await.unwrap().is_none());
        assert!(store.find_post(1).await.unwrap().is_none());
        assert!(matches!(store.delete_user(1).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            store.update_post(1, PostChanges::default()).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
