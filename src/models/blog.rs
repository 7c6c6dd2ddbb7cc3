use serde::{Deserialize, Serialize};

/// A stored blog post.
///
/// Every field defaults so that exported snapshots with holes still load
/// and can be run through the integrity check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub intro: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub cta: Option<CallToAction>,
    pub author: String,
    pub published: bool,
    /// Estimated minutes to read
    pub reading_time: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CallToAction {
    pub text: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: CtaKind,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CtaKind {
    #[default]
    Internal,
    External,
}

/// Candidate post submitted by the content-management screen.
///
/// Missing fields come through empty so the validator can report them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPayload {
    pub slug: Option<String>,
    pub title: String,
    pub intro: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub cta: Option<CallToAction>,
    pub author: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub intro: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    /// `Some(None)` clears the call-to-action
    #[serde(deserialize_with = "deserialize_some")]
    pub cta: Option<Option<CallToAction>>,
    pub author: Option<String>,
    pub published: Option<bool>,
}

/// Post fields ready to be written
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub intro: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub cta: Option<CallToAction>,
    pub author: String,
    pub published: bool,
    pub reading_time: i64,
}

impl UpdatePostRequest {
    /// Apply the requested changes on top of an existing post.
    pub fn merge_into(self, existing: &BlogPost) -> PostPayload {
        PostPayload {
            slug: Some(existing.slug.clone()),
            title: self.title.unwrap_or_else(|| existing.title.clone()),
            intro: self.intro.unwrap_or_else(|| existing.intro.clone()),
            content: self.content.unwrap_or_else(|| existing.content.clone()),
            tags: self.tags.unwrap_or_else(|| existing.tags.clone()),
            image_urls: self.image_urls.unwrap_or_else(|| existing.image_urls.clone()),
            cta: self.cta.unwrap_or_else(|| existing.cta.clone()),
            author: Some(self.author.unwrap_or_else(|| existing.author.clone())),
            published: self.published.unwrap_or(existing.published),
        }
    }
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
