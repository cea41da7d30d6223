use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::User;
use super::{check_length, MAX_CONTENT_LEN, MAX_TEXT_LEN};

/// Post entity. `author_id` is null for posts created through the bulk path
/// and after the author has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: Option<i32>,
}

/// Post with its author expanded, as returned by the post list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
}

/// Title and content of a post that does not exist yet. Used for bulk
/// inserts and for nested posts on user creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

/// Single-post payload of `POST /api/v1/post`. `author` is the owning user id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author: i32,
}

/// `POST /api/v1/post` accepts either one post or an array of posts.
#[derive(Debug)]
pub enum CreatePostPayload {
    Many(Vec<NewPost>),
    One(CreatePostRequest),
}

impl CreatePostPayload {
    /// An array body is a bulk insert, anything else must be a single post.
    pub fn from_value(value: Value) -> Result<Self, String> {
        if value.is_array() {
            serde_json::from_value(value)
                .map(CreatePostPayload::Many)
                .map_err(|e| format!("Invalid post list: {}", e))
        } else {
            serde_json::from_value(value)
                .map(CreatePostPayload::One)
                .map_err(|e| format!("Invalid post: {}", e))
        }
    }
}

/// Payload of `PUT /api/v1/post/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostChanges {
    pub fn apply(&self, post: &mut Post) {
        if let Some(ref title) = self.title {
            post.title = title.clone();
        }

        if let Some(ref content) = self.content {
            post.content = content.clone();
        }
    }
}

impl NewPost {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        check_length("Content", &self.content, MAX_CONTENT_LEN)
    }

    pub fn normalized(self) -> Self {
        NewPost {
            title: self.title.trim().to_string(),
            content: self.content,
        }
    }
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        check_length("Content", &self.content, MAX_CONTENT_LEN)
    }

    /// Splits into the post columns and the author to connect.
    pub fn into_parts(self) -> (NewPost, i32) {
        let post = NewPost {
            title: self.title,
            content: self.content,
        };
        (post.normalized(), self.author)
    }
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_none() && self.content.is_none() {
            return Err("At least one field (title or content) must be provided for update".to_string());
        }

        if let Some(ref title) = self.title {
            validate_title(title)?;
        }

        if let Some(ref content) = self.content {
            check_length("Content", content, MAX_CONTENT_LEN)?;
        }

        Ok(())
    }

    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: self.title.map(|t| t.trim().to_string()),
            content: self.content,
        }
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    check_length("Title", title, MAX_TEXT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_object_is_single_post() {
        let payload = CreatePostPayload::from_value(json!({"title": "Hello", "content": "World", "author": 4}))
            .expect("single post");

        match payload {
            CreatePostPayload::One(request) => {
                assert_eq!(request.title, "Hello");
                assert_eq!(request.author, 4);
            }
            CreatePostPayload::Many(_) => panic!("object body parsed as array"),
        }
    }

    #[test]
    fn test_payload_array_is_bulk() {
        let payload = CreatePostPayload::from_value(json!([
            {"title": "a", "content": "1"},
            {"title": "b", "content": "2"}
        ]))
        .expect("post list");

        match payload {
            CreatePostPayload::Many(posts) => assert_eq!(posts.len(), 2),
            CreatePostPayload::One(_) => panic!("array body parsed as object"),
        }
    }

    #[test]
    fn test_payload_without_author_names_the_field() {
        let err = CreatePostPayload::from_value(json!({"title": "Hello", "content": "World"}))
            .expect_err("author is required");

        assert!(err.contains("author"), "{}", err);
        assert!(!err.contains("CreatePostPayload"), "{}", err);
    }

    #[test]
    fn test_payload_array_element_error_names_the_field() {
        let err = CreatePostPayload::from_value(json!([{"title": "a"}])).expect_err("content is required");

        assert!(err.contains("content"), "{}", err);
    }

    #[test]
    fn test_post_validation() {
        let valid = NewPost {
            title: "Title".to_string(),
            content: String::new(),
        };
        assert!(valid.validate().is_ok());

        let blank_title = NewPost {
            title: "  ".to_string(),
            content: "body".to_string(),
        };
        assert!(blank_title.validate().is_err());

        let long_content = NewPost {
            title: "Title".to_string(),
            content: "a".repeat(MAX_CONTENT_LEN + 1),
        };
        assert!(long_content.validate().is_err());

        assert!(UpdatePostRequest::default().validate().is_err());
    }

    #[test]
    fn test_post_serialization_uses_author_id() {
        let post = Post {
            id: 1,
            title: "Test Post".to_string(),
            content: "Body".to_string(),
            author_id: None,
        };

        let json = serde_json::to_string(&post).expect("Failed to serialize post");
        assert_eq!(json, r#"{"id":1,"title":"Test Post","content":"Body","authorId":null}"#);
    }

    #[test]
    fn test_post_with_author_serialization() {
        let value = serde_json::to_value(PostWithAuthor {
            post: Post {
                id: 2,
                title: "T".to_string(),
                content: "C".to_string(),
                author_id: Some(7),
            },
            author: Some(User {
                id: 7,
                name: Some("Grace".to_string()),
                email: "grace@example.com".to_string(),
            }),
        })
        .expect("serialize");

        assert_eq!(value["authorId"], 7);
        assert_eq!(value["author"]["email"], "grace@example.com");
    }
}
