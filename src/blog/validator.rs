//! Field-level validation of submitted blog posts
//!
//! Every rule runs independently; a failing field never hides problems in
//! another one. Errors block a write, warnings are advisory.

use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

use crate::models::{CallToAction, CtaKind, PostPayload};

const TITLE_MIN: usize = 10;
const TITLE_MAX: usize = 100;
const INTRO_MIN: usize = 50;
const INTRO_MAX: usize = 500;
const CONTENT_MIN: usize = 200;
const CONTENT_MAX: usize = 50_000;
const TAGS_MAX: usize = 10;

/// Punctuation accepted in titles besides letters, digits and whitespace
const TITLE_PUNCTUATION: &str = "-_.,:;!?'\"()&/#+@";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Validate a candidate post without touching it.
pub fn validate_post(post: &PostPayload) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_title(&post.title, &mut report);
    check_length_bounded(
        "intro",
        "Intro",
        &post.intro,
        (INTRO_MIN, INTRO_MAX),
        &mut report,
    );
    check_length_bounded(
        "content",
        "Content",
        &post.content,
        (CONTENT_MIN, CONTENT_MAX),
        &mut report,
    );
    check_tags(&post.tags, &mut report);
    check_image_urls(&post.image_urls, &mut report);
    if let Some(cta) = &post.cta {
        check_cta(cta, &mut report);
    }

    report.is_valid = report.errors.is_empty();
    report
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn check_title(title: &str, report: &mut ValidationReport) {
    let len = char_len(title);
    if len == 0 {
        report.error("title", "Title is required");
        return;
    }

    if len < TITLE_MIN {
        report.warn(format!(
            "Title is shorter than {TITLE_MIN} characters; longer titles read better in search results"
        ));
    }
    if len > TITLE_MAX {
        report.error("title", format!("Title must be at most {TITLE_MAX} characters"));
    }
    if !title.chars().all(is_title_char) {
        report.error("title", "Title contains invalid characters");
    }
}

fn is_title_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || TITLE_PUNCTUATION.contains(c)
}

fn check_length_bounded(
    field: &str,
    label: &str,
    value: &str,
    (min, max): (usize, usize),
    report: &mut ValidationReport,
) {
    let len = char_len(value);
    if len == 0 {
        report.error(field, format!("{label} is required"));
        return;
    }

    if len < min {
        report.warn(format!("{label} is shorter than {min} characters"));
    }
    if len > max {
        report.error(field, format!("{label} must be at most {max} characters"));
    }
}

fn check_tags(tags: &[String], report: &mut ValidationReport) {
    if tags.is_empty() {
        report.error("tags", "At least one tag is required");
        return;
    }

    if tags.len() > TAGS_MAX {
        report.error("tags", format!("No more than {TAGS_MAX} tags are allowed"));
    }

    let malformed = tags.iter().any(|tag| {
        tag.trim().is_empty()
            || !tag
                .chars()
                .all(|c| c.is_alphanumeric() || c == ' ' || c == '-')
    });
    if malformed {
        report.error(
            "tags",
            "Tags may only contain letters, numbers, spaces and hyphens",
        );
    }
}

fn check_image_urls(urls: &[String], report: &mut ValidationReport) {
    if urls.iter().any(|u| Url::parse(u.trim()).is_err()) {
        report.error("imageUrls", "All image URLs must be valid URLs");
    }
}

fn check_cta(cta: &CallToAction, report: &mut ValidationReport) {
    if cta.text.trim().is_empty() {
        report.error("cta", "Call-to-action text is required");
    }
    if cta.link.trim().is_empty() {
        report.error("cta", "Call-to-action link is required");
    } else if cta.kind == CtaKind::External && Url::parse(cta.link.trim()).is_err() {
        report.error("cta", "External call-to-action link must be a valid URL");
    }
}
