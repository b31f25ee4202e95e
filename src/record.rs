//! Column names of the review CSV and the canonical record built from a row.

use serde::{Deserialize, Serialize};

pub const PRODUCT_SKU: &str = "product_SKU";
pub const COMMENT_ID: &str = "comment_ID";
pub const COMMENT_AUTHOR: &str = "comment_author";
pub const COMMENT_AUTHOR_EMAIL: &str = "comment_author_email";
pub const COMMENT_AUTHOR_URL: &str = "comment_author_url";
pub const COMMENT_AUTHOR_IP: &str = "comment_author_IP";
pub const COMMENT_DATE: &str = "comment_date";
pub const COMMENT_DATE_GMT: &str = "comment_date_gmt";
pub const COMMENT_CONTENT: &str = "comment_content";
pub const COMMENT_APPROVED: &str = "comment_approved";
pub const COMMENT_PARENT: &str = "comment_parent";
pub const USER_ID: &str = "user_id";
pub const RATING: &str = "rating";
pub const VERIFIED: &str = "verified";
pub const TITLE: &str = "title";

/// Every column the importer reads; anything else in the header is ignored.
pub const KNOWN_FIELDS: [&str; 15] = [
    PRODUCT_SKU,
    COMMENT_ID,
    COMMENT_AUTHOR,
    COMMENT_AUTHOR_EMAIL,
    COMMENT_AUTHOR_URL,
    COMMENT_AUTHOR_IP,
    COMMENT_DATE,
    COMMENT_DATE_GMT,
    COMMENT_CONTENT,
    COMMENT_APPROVED,
    COMMENT_PARENT,
    USER_ID,
    RATING,
    VERIFIED,
    TITLE,
];

/// Comment type that marks a row in the shared comment table as a review.
pub const REVIEW_TYPE: &str = "review";

/// Meta keys attached to an inserted review.
pub const META_RATING: &str = "rating";
pub const META_VERIFIED: &str = "verified";
pub const META_TITLE: &str = "title";

/// A review after normalization, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Requested comment id; 0 or less lets the store assign one.
    pub comment_id: i64,
    pub product_id: u64,
    pub author: String,
    pub author_email: String,
    pub author_url: String,
    pub author_ip: String,
    /// `YYYY-MM-DD HH:MM:SS`, wall clock as written in the file.
    pub date: String,
    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub date_gmt: String,
    pub content: String,
    pub approved: bool,
    /// 0 means top-level.
    pub parent: i64,
    /// 0 means anonymous.
    pub user_id: i64,
    pub rating: i64,
    pub verified: bool,
    pub title: Option<String>,
    pub comment_type: String,
}
