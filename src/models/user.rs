use serde::{Deserialize, Serialize};

use super::post::{NewPost, Post};
use super::{check_length, MAX_TEXT_LEN};

/// A registered user. `name` is nullable in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
}

/// A user together with every post it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
}

/// Payload of `POST /api/v1/user`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

/// Payload of `POST /api/v1/user/userpost`.
#[derive(Debug, Deserialize)]
pub struct CreateUserWithPostsRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub posts: Vec<NewPost>,
}

/// Payload of `PUT /api/v1/user/:id`. Fields left out are not touched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Normalized user columns, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
}

/// Normalized partial update, ready for the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(ref name) = self.name {
            user.name = Some(name.clone());
        }

        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
    }
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(self.name.as_deref())?;
        validate_email(&self.email)
    }

    /// Trims every field. Call after `validate`.
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.trim().to_string(),
        }
    }
}

impl CreateUserWithPostsRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(self.name.as_deref())?;
        validate_email(&self.email)?;

        for (index, post) in self.posts.iter().enumerate() {
            post.validate().map_err(|e| format!("posts[{}]: {}", index, e))?;
        }

        Ok(())
    }

    pub fn into_parts(self) -> (NewUser, Vec<NewPost>) {
        let user = NewUser {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.trim().to_string(),
        };
        let posts = self.posts.into_iter().map(NewPost::normalized).collect();
        (user, posts)
    }
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_none() && self.email.is_none() {
            return Err("At least one field (name or email) must be provided for update".to_string());
        }

        validate_name(self.name.as_deref())?;

        if let Some(ref email) = self.email {
            validate_email(email)?;
        }

        Ok(())
    }

    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.map(|e| e.trim().to_string()),
        }
    }
}

fn validate_name(name: Option<&str>) -> Result<(), String> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        check_length("Name", name, MAX_TEXT_LEN)?;
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    check_length("Email", email, MAX_TEXT_LEN)?;

    if !is_valid_email(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Minimal `local@domain.tld` shape check, no regex.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    local.chars().all(|c| c.is_alphanumeric() || ".-_+".contains(c))
        && domain.chars().all(|c| c.is_alphanumeric() || ".-".contains(c))
}
