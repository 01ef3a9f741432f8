use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{dedup_ids, insert_unique};
use crate::error::{AppError, AppResult};

/// A themed, dated, shareable plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieNight {
    pub id: String,
    pub theme: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub movie_ids: Vec<String>,
    pub share_link: String,
}

impl MovieNight {
    pub fn add_movie(&mut self, movie_id: &str) -> bool {
        insert_unique(&mut self.movie_ids, movie_id)
    }

    pub fn remove_movie(&mut self, movie_id: &str) -> bool {
        let before = self.movie_ids.len();
        self.movie_ids.retain(|id| id != movie_id);
        self.movie_ids.len() != before
    }

    pub fn apply(&mut self, patch: ValidMovieNightPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(movie_ids) = patch.movie_ids {
            self.movie_ids = dedup_ids(movie_ids);
        }
        if let Some(share_link) = patch.share_link {
            self.share_link = share_link;
        }
    }
}

/// Date descending
pub fn sort_latest_first(nights: &mut [MovieNight]) {
    nights.sort_by(|a, b| b.date.cmp(&a.date));
}

/// `<domain>/night/<millis>`
pub fn share_link(app_domain: &str, created_millis: i64) -> String {
    format!("{}/night/{}", app_domain.trim_end_matches('/'), created_millis)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_night_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("Movie night date is required".to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("Invalid movie night date: {}", raw)))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMovieNight {
    pub theme: String,
    pub date: String,
    #[serde(default)]
    pub movie_ids: Vec<String>,
    #[serde(default)]
    pub share_link: Option<String>,
}

/// A creation request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNewMovieNight {
    pub theme: String,
    pub date: NaiveDate,
    pub movie_ids: Vec<String>,
    pub share_link: Option<String>,
}

impl NewMovieNight {
    pub fn validate(self) -> AppResult<ValidNewMovieNight> {
        let theme = self.theme.trim().to_string();
        if theme.is_empty() {
            return Err(AppError::Validation("Movie night theme is required".to_string()));
        }
        let date = parse_night_date(&self.date)?;
        let share_link = self.share_link.filter(|link| !link.trim().is_empty());

        Ok(ValidNewMovieNight {
            theme,
            date,
            movie_ids: dedup_ids(self.movie_ids),
            share_link,
        })
    }
}

impl ValidNewMovieNight {
    /// Builds the stored night, generating a share link when none was given
    pub fn into_movie_night(self, id: String, app_domain: &str, created_millis: i64) -> MovieNight {
        MovieNight {
            id,
            theme: self.theme,
            date: self.date,
            movie_ids: self.movie_ids,
            share_link: self
                .share_link
                .unwrap_or_else(|| share_link(app_domain, created_millis)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieNightPatch {
    pub theme: Option<String>,
    pub date: Option<String>,
    pub movie_ids: Option<Vec<String>>,
    pub share_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidMovieNightPatch {
    pub theme: Option<String>,
    pub date: Option<NaiveDate>,
    pub movie_ids: Option<Vec<String>>,
    pub share_link: Option<String>,
}

impl MovieNightPatch {
    pub fn validate(self) -> AppResult<ValidMovieNightPatch> {
        let theme = match self.theme {
            Some(theme) if theme.trim().is_empty() => {
                return Err(AppError::Validation(
                    "Movie night theme cannot be empty".to_string(),
                ))
            }
            other => other.map(|t| t.trim().to_string()),
        };
        let date = self.date.as_deref().map(parse_night_date).transpose()?;

        Ok(ValidMovieNightPatch {
            theme,
            date,
            movie_ids: self.movie_ids,
            share_link: self.share_link,
        })
    }
}
