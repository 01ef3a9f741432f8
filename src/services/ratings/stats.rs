use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        rating::{MAX_SCORE, MIN_SCORE},
        MovieStats, Page, PageRequest, Pagination, Rating, RatingSortKey, RatingSummary,
        SortOrder,
    },
};

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn summarize(ratings: &[Rating]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary::default();
    }
    let total: u32 = ratings.iter().map(|r| u32::from(r.rating)).sum();
    RatingSummary {
        average: round_one_decimal(f64::from(total) / ratings.len() as f64),
        count: ratings.len(),
    }
}

/// Summary plus a count per score; every score from 1 to 5 has a bucket
pub fn movie_stats(ratings: &[Rating]) -> MovieStats {
    let mut distribution: BTreeMap<u8, usize> =
        (MIN_SCORE as u8..=MAX_SCORE as u8).map(|score| (score, 0)).collect();
    for rating in ratings {
        *distribution.entry(rating.rating).or_default() += 1;
    }

    let summary = summarize(ratings);
    MovieStats {
        average: summary.average,
        count: summary.count,
        distribution,
    }
}

pub fn paginate(mut ratings: Vec<Rating>, request: PageRequest) -> AppResult<Page<Rating>> {
    if request.page < 1 || request.limit < 1 {
        return Err(AppError::Validation(
            "Page and limit must be at least 1".to_string(),
        ));
    }

    ratings.sort_by(|a, b| {
        let ordering = match request.sort_by {
            RatingSortKey::Rating => a.rating.cmp(&b.rating),
            RatingSortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
        };
        match request.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = ratings.len();
    let items = ratings
        .into_iter()
        .skip((request.page - 1).saturating_mul(request.limit))
        .take(request.limit)
        .collect();

    Ok(Page {
        items,
        pagination: Pagination {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(request.limit),
        },
    })
}
