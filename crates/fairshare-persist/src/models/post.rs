use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contains_ignore_case;

const EXCERPT_CHARS: usize = 100;
const DEFAULT_AUTHOR: &str = "Admin";

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published: bool,
    pub slug: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: u64,
}

/// Fields accepted when creating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl NewPost {
    /// Fill defaults: excerpt from the title, slug from the title, author "Admin",
    /// published unless stated otherwise.
    pub fn into_post(self, id: String, now: DateTime<Utc>) -> Post {
        let excerpt = self
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| default_excerpt(&self.title));
        let slug = self
            .slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slugify(&self.title));

        Post {
            id,
            excerpt,
            slug,
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            published: self.published.unwrap_or(true),
            title: self.title,
            content: self.content,
            category: self.category,
            tags: self.tags,
            date: now,
            updated_at: Some(now),
            view_count: 0,
        }
    }
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub published: Option<bool>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
}

impl PostUpdate {
    pub fn apply(self, post: &mut Post, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(published) = self.published {
            post.published = published;
        }
        if let Some(author) = self.author {
            post.author = author;
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        if let Some(slug) = self.slug {
            post.slug = slug;
        }
        post.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub category: Option<String>,
    /// Matched against title and content
    pub search: Option<String>,
    pub published_only: bool,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.published_only && !post.published {
            return false;
        }
        if let Some(category) = &self.category {
            if &post.category != category {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !contains_ignore_case(&post.title, search) && !contains_ignore_case(&post.content, search) {
                return false;
            }
        }
        true
    }
}

/// "Filing Taxes: A Guide!" -> "filing-taxes-a-guide"
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .collect();
    kept.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn default_excerpt(title: &str) -> String {
    let head: String = title.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "Body".to_string(),
            category: "Tax".to_string(),
            ..NewPost::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Filing Taxes: A Guide!"), "filing-taxes-a-guide");
        assert_eq!(slugify("  Many   spaces  "), "many-spaces");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_default_excerpt_truncates_on_chars() {
        let long = "é".repeat(150);
        let excerpt = default_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
        assert_eq!(default_excerpt("Short"), "Short...");
    }

    #[test]
    fn test_into_post_fills_defaults() {
        let now = Utc::now();
        let post = new_post("Year End Checklist").into_post("p1".into(), now);

        assert_eq!(post.excerpt, "Year End Checklist...");
        assert_eq!(post.slug, "year-end-checklist");
        assert_eq!(post.author, "Admin");
        assert!(post.published);
        assert_eq!(post.date, now);
        assert_eq!(post.view_count, 0);
    }

    #[test]
    fn test_into_post_keeps_explicit_values() {
        let mut input = new_post("Draft");
        input.excerpt = Some("Custom".into());
        input.published = Some(false);
        input.author = Some("Kim".into());
        let post = input.into_post("p1".into(), Utc::now());

        assert_eq!(post.excerpt, "Custom");
        assert!(!post.published);
        assert_eq!(post.author, "Kim");
    }

    #[test]
    fn test_filter_matches() {
        let post = new_post("Deductions explained").into_post("p1".into(), Utc::now());

        assert!(PostFilter::default().matches(&post));
        assert!(PostFilter { search: Some("DEDUCT".into()), ..Default::default() }.matches(&post));
        assert!(!PostFilter { search: Some("payroll".into()), ..Default::default() }.matches(&post));
        assert!(!PostFilter { category: Some("Payroll".into()), ..Default::default() }.matches(&post));
    }

    #[test]
    fn test_update_apply_touches_only_given_fields() {
        let now = Utc::now();
        let mut post = new_post("Old").into_post("p1".into(), now);
        PostUpdate {
            title: Some("New".into()),
            ..Default::default()
        }
        .apply(&mut post, now);

        assert_eq!(post.title, "New");
        assert_eq!(post.slug, "old");
        assert_eq!(post.content, "Body");
    }
}
