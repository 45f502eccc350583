//! Shortening orchestration
//!
//! [`ShortnerService`] ties the deterministic code generator to the store.
//! Shortening is idempotent per URL, collisions are resolved by walking the
//! digest windows in order, and the retry loop is bounded so exhaustion is
//! an explicit, testable failure instead of an infinite loop.

use std::sync::Arc;

use chrono::Utc;
use redb::Database;

use crate::database::{self, AppState, InsertOutcome};
use crate::error::AppError;
use crate::model::UrlMapping;
use crate::shortcode::{self, CodeError};

pub struct ShortnerService {
    db: Arc<Database>,
    retry_limit: usize,
}

impl ShortnerService {
    pub fn new(db: Arc<Database>, retry_limit: usize) -> Self {
        Self { db, retry_limit }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db.clone(), state.retry_limit)
    }

    /// Maps `url` to a unique short code.
    ///
    /// A URL that was shortened before gets its existing mapping back
    /// unchanged. Otherwise candidate codes are tried window by window
    /// until one is free; a window occupied by a mapping for the *same*
    /// URL counts as success, since that just means a concurrent request
    /// got there first.
    pub fn shorten(&self, url: &str) -> Result<UrlMapping, AppError> {
        if url.trim().is_empty() {
            return Err(AppError::Validation("url must not be empty"));
        }

        if let Some(existing) = database::get_mapping_by_url(&self.db, url)? {
            return Ok(existing);
        }

        for attempt in 0..self.retry_limit {
            let code = match shortcode::generate(url, attempt) {
                Ok(code) => code,
                Err(CodeError::Exhausted(_)) => break,
            };

            let mapping = UrlMapping {
                short_code: code,
                original_url: url.to_string(),
                created_at: Utc::now(),
            };

            match database::insert_mapping(&self.db, &mapping)? {
                InsertOutcome::Inserted => return Ok(mapping),
                InsertOutcome::CodeTaken(existing) if existing.original_url == url => {
                    return Ok(existing)
                }
                InsertOutcome::CodeTaken(existing) => {
                    tracing::debug!(
                        code = %existing.short_code,
                        attempt,
                        "short code collision, trying next window"
                    );
                }
            }
        }

        Err(AppError::CollisionExhausted)
    }

    /// Returns the original URL for a known short code.
    pub fn resolve(&self, code: &str) -> Result<String, AppError> {
        database::get_mapping(&self.db, code)?
            .map(|mapping| mapping.original_url)
            .ok_or(AppError::NotFound)
    }

    /// Returns the mapping for a URL that has been shortened before.
    pub fn reverse_lookup(&self, url: &str) -> Result<UrlMapping, AppError> {
        database::get_mapping_by_url(&self.db, url)?.ok_or(AppError::NotFound)
    }

    /// Returns all stored mappings. Unbounded; pagination is out of scope.
    pub fn list_all(&self) -> Result<Vec<UrlMapping>, AppError> {
        database::list_mappings(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::shortcode::{generate, CODE_LEN, MAX_OFFSETS};
    use tempfile::NamedTempFile;

    fn setup() -> (ShortnerService, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to init test database");
        (
            ShortnerService::new(Arc::new(db), MAX_OFFSETS),
            temp_db,
        )
    }

    /// Plants a mapping that occupies the code `url` would get at `attempt`.
    fn occupy_window(service: &ShortnerService, url: &str, attempt: usize, occupant_url: &str) {
        let code = generate(url, attempt).unwrap();
        let mapping = UrlMapping {
            short_code: code,
            original_url: occupant_url.to_string(),
            created_at: Utc::now(),
        };
        match database::insert_mapping(&service.db, &mapping).unwrap() {
            InsertOutcome::Inserted => {}
            InsertOutcome::CodeTaken(_) => panic!("window already occupied"),
        }
    }

    #[test]
    fn shorten_assigns_an_eight_char_code() {
        let (service, _temp_db) = setup();
        let mapping = service.shorten("https://example.com/a").unwrap();
        assert_eq!(mapping.short_code.len(), CODE_LEN);
        assert_eq!(mapping.original_url, "https://example.com/a");
    }

    #[test]
    fn shorten_is_idempotent() {
        let (service, _temp_db) = setup();
        let first = service.shorten("https://example.com/a").unwrap();
        let second = service.shorten("https://example.com/a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shorten_rejects_empty_url() {
        let (service, _temp_db) = setup();
        assert!(matches!(
            service.shorten("  "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn resolve_round_trips() {
        let (service, _temp_db) = setup();
        let mapping = service.shorten("https://example.com/round-trip").unwrap();
        let original = service.resolve(&mapping.short_code).unwrap();
        assert_eq!(original, "https://example.com/round-trip");
    }

    #[test]
    fn resolve_unknown_code_is_not_found() {
        let (service, _temp_db) = setup();
        assert!(matches!(
            service.resolve("doesNotExist"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn reverse_lookup_unknown_url_is_not_found() {
        let (service, _temp_db) = setup();
        assert!(matches!(
            service.reverse_lookup("https://example.com/never-seen"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn collision_falls_back_to_next_window() {
        let (service, _temp_db) = setup();
        let url = "https://example.com/collides";

        occupy_window(&service, url, 0, "https://elsewhere.example/occupant");

        let mapping = service.shorten(url).unwrap();
        assert_eq!(mapping.short_code, generate(url, 1).unwrap());
    }

    #[test]
    fn colliding_urls_get_distinct_codes() {
        let (service, _temp_db) = setup();
        let url = "https://example.com/second";

        occupy_window(&service, url, 0, "https://example.com/first");

        let mapping = service.shorten(url).unwrap();
        assert_ne!(mapping.short_code, generate(url, 0).unwrap());
        assert_eq!(service.resolve(&mapping.short_code).unwrap(), url);
    }

    #[test]
    fn occupied_window_for_same_url_counts_as_success() {
        let (service, _temp_db) = setup();
        let url = "https://example.com/raced";

        // Another request stored the mapping but the reverse index miss
        // raced: the occupant is the same URL, so shorten must return it.
        occupy_window(&service, url, 0, url);

        let mapping = service.shorten(url).unwrap();
        assert_eq!(mapping.short_code, generate(url, 0).unwrap());
        assert_eq!(mapping.original_url, url);
    }

    #[test]
    fn exhausting_every_window_fails() {
        let (service, _temp_db) = setup();
        let url = "https://example.com/unlucky";

        for attempt in 0..MAX_OFFSETS {
            occupy_window(
                &service,
                url,
                attempt,
                &format!("https://elsewhere.example/{attempt}"),
            );
        }

        assert!(matches!(
            service.shorten(url),
            Err(AppError::CollisionExhausted)
        ));
    }

    #[test]
    fn retry_limit_below_window_count_is_honored() {
        let (service, _temp_db) = setup();
        let url = "https://example.com/limited";

        occupy_window(&service, url, 0, "https://elsewhere.example/occupant");

        let limited = ShortnerService::new(service.db.clone(), 1);
        assert!(matches!(
            limited.shorten(url),
            Err(AppError::CollisionExhausted)
        ));
    }

    #[test]
    fn list_all_returns_every_mapping() {
        let (service, _temp_db) = setup();
        for i in 0..4 {
            service
                .shorten(&format!("https://example.com/item/{i}"))
                .unwrap();
        }

        let all = service.list_all().unwrap();
        assert_eq!(all.len(), 4);
    }
}
