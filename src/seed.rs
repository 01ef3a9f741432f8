//! Static fixtures compiled into the crate for local mode.
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, MovieNight, Watchlist};

const MOVIES: &str = include_str!("../seed/movies.json");
const WATCHLISTS: &str = include_str!("../seed/watchlists.json");
const MOVIE_NIGHTS: &str = include_str!("../seed/movie_nights.json");

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> AppResult<Vec<T>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Storage(format!("Invalid {} seed data: {}", name, e)))
}

pub fn movies() -> AppResult<Vec<Movie>> {
    parse("movies", MOVIES)
}

pub fn watchlists() -> AppResult<Vec<Watchlist>> {
    parse("watchlists", WATCHLISTS)
}

pub fn movie_nights() -> AppResult<Vec<MovieNight>> {
    parse("movie nights", MOVIE_NIGHTS)
}
