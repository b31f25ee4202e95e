use crate::config::{DatePolicy, ImportOptions};
use crate::normalize::{parse_flag, parse_int, parse_loose_datetime, EPOCH};
use crate::record::*;
use crate::sanitize::Sanitizer;
use crate::store::{MetaValue, ReviewStore};
use crate::validate::RawRow;
use crate::RowError;
use tracing::{debug, warn};

/// A review that made it into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub comment_id: u64,
    pub product_id: u64,
}

/// Turns validated rows into stored reviews.
pub struct ReviewMapper<'a, Z> {
    sanitizer: &'a Z,
    options: &'a ImportOptions,
}

impl<'a, Z: Sanitizer> ReviewMapper<'a, Z> {
    pub fn new(sanitizer: &'a Z, options: &'a ImportOptions) -> Self {
        Self { sanitizer, options }
    }

    /// Resolve, normalize, persist. Every failure here is row-scoped.
    pub async fn write<S: ReviewStore>(
        &self,
        store: &mut S,
        row: &RawRow,
        sku: &str,
        line: u64,
    ) -> Result<Inserted, RowError> {
        let sku = self.sanitizer.text_field(sku);
        let product_id = store
            .lookup_product_id_by_sku(&sku)
            .await
            .map_err(|e| RowError::Persistence {
                line,
                reason: format!("product lookup failed: {e}"),
            })?
            .ok_or_else(|| RowError::UnresolvedReference {
                line,
                sku: sku.clone(),
            })?;

        let record = self.build_record(row, product_id, line)?;

        let comment_id = store
            .insert_comment(&record)
            .await
            .map_err(|e| RowError::Persistence {
                line,
                reason: e.to_string(),
            })?;

        let mut meta = vec![
            (META_RATING, MetaValue::from(record.rating)),
            (META_VERIFIED, MetaValue::from(record.verified)),
        ];
        if let Some(title) = &record.title {
            meta.push((META_TITLE, MetaValue::from(title.clone())));
        }
        for (key, value) in meta {
            // The comment row already exists, so a lost meta entry is not a skipped row.
            if let Err(e) = store.set_comment_meta(comment_id, key, value).await {
                warn!(line, comment_id, key, error = %e, "failed to attach review meta");
            }
        }

        debug!(line, comment_id, product_id, sku = %sku, "review imported");
        Ok(Inserted {
            comment_id,
            product_id,
        })
    }

    /// Pure normalization of one row for an already resolved product.
    pub fn build_record(
        &self,
        row: &RawRow,
        product_id: u64,
        line: u64,
    ) -> Result<ReviewRecord, RowError> {
        let z = self.sanitizer;
        let title = Some(z.text_field(row.get(TITLE))).filter(|t| !t.is_empty());

        Ok(ReviewRecord {
            comment_id: parse_int(row.get(COMMENT_ID)),
            product_id,
            author: z.text_field(row.get(COMMENT_AUTHOR)),
            author_email: z.email(row.get(COMMENT_AUTHOR_EMAIL)),
            author_url: z.url(row.get(COMMENT_AUTHOR_URL)),
            author_ip: z.text_field(row.get(COMMENT_AUTHOR_IP)),
            date: self.date(row, COMMENT_DATE, false, line)?,
            date_gmt: self.date(row, COMMENT_DATE_GMT, true, line)?,
            content: z.textarea_field(row.get(COMMENT_CONTENT)),
            approved: parse_flag(row.get(COMMENT_APPROVED)),
            parent: parse_int(row.get(COMMENT_PARENT)),
            user_id: parse_int(row.get(USER_ID)),
            rating: parse_int(row.get(RATING)),
            verified: parse_flag(row.get(VERIFIED)),
            title,
            comment_type: self.options.review_type.clone(),
        })
    }

    fn date(&self, row: &RawRow, field: &str, utc: bool, line: u64) -> Result<String, RowError> {
        let raw = row.get(field);
        if raw.trim().is_empty() {
            return Ok(EPOCH.to_string());
        }
        match parse_loose_datetime(raw) {
            Some(dt) if utc => Ok(dt.to_utc_string()),
            Some(dt) => Ok(dt.to_local_string()),
            None => match self.options.date_policy {
                DatePolicy::Epoch => {
                    warn!(line, field, value = raw, "unreadable date, storing epoch");
                    Ok(EPOCH.to_string())
                }
                DatePolicy::Reject => Err(RowError::InvalidDate {
                    line,
                    field: field.to_string(),
                    value: raw.to_string(),
                }),
            },
        }
    }
}
