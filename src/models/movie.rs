use serde::{Deserialize, Serialize};

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: i32,
    /// Poster image URL
    pub poster: String,
    /// Average (or seed) rating on a 0-10 scale
    pub rating: f64,
    /// Runtime in minutes
    pub runtime: i32,
    pub synopsis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
}

impl Movie {
    pub fn from_new(id: String, new: NewMovie) -> Self {
        Self {
            id,
            title: new.title,
            year: new.year,
            poster: new.poster,
            rating: new.rating,
            runtime: new.runtime,
            synopsis: new.synopsis,
            trailer_url: new.trailer_url,
            genres: new.genres,
            moods: new.moods,
        }
    }

    /// Exact, case-sensitive mood membership
    pub fn has_mood(&self, mood: &str) -> bool {
        self.moods.iter().any(|m| m == mood)
    }

    /// Exact, case-sensitive genre membership
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    /// Case-insensitive substring match over title, synopsis and genres
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.synopsis.to_lowercase().contains(needle)
            || self
                .genres
                .iter()
                .any(|g| g.to_lowercase().contains(needle))
    }

    pub fn apply(&mut self, patch: MoviePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(poster) = patch.poster {
            self.poster = poster;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(runtime) = patch.runtime {
            self.runtime = runtime;
        }
        if let Some(synopsis) = patch.synopsis {
            self.synopsis = synopsis;
        }
        if let Some(trailer_url) = patch.trailer_url {
            self.trailer_url = Some(trailer_url);
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
        if let Some(moods) = patch.moods {
            self.moods = moods;
        }
    }
}

/// Normalised search needle, `None` when the query is blank
pub fn search_needle(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Fields for a movie that has no id yet
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub poster: String,
    pub rating: f64,
    pub runtime: i32,
    pub synopsis: String,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub moods: Vec<String>,
}

/// Partial update, `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub poster: Option<String>,
    pub rating: Option<f64>,
    pub runtime: Option<i32>,
    pub synopsis: Option<String>,
    pub trailer_url: Option<String>,
    pub genres: Option<Vec<String>>,
    pub moods: Option<Vec<String>>,
}
