use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};

/// A reader's stated preferences, validated at the API boundary.
///
/// Unknown fields are rejected so malformed clients fail loudly here instead
/// of silently losing data deeper in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProfile {
    pub user_id: String,
    #[serde(default)]
    pub liked_books: Vec<BookPreference>,
    #[serde(default)]
    pub disliked_books: Vec<BookPreference>,
    #[serde(default)]
    pub liked_genres: Vec<GenrePreference>,
    #[serde(default)]
    pub disliked_genres: Vec<GenrePreference>,
    #[serde(default)]
    pub liked_authors: Vec<String>,
    #[serde(default)]
    pub disliked_authors: Vec<String>,
    #[serde(default)]
    pub additional_preferences: Option<String>,
    #[serde(default)]
    pub reading_history: Vec<String>,
}

impl RawProfile {
    /// Boundary validation: a profile must identify its user, and explicit
    /// ratings must be on the 1-5 scale the catalog uses.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "profile is missing a user_id".to_string(),
            ));
        }

        for book in self.liked_books.iter().chain(self.disliked_books.iter()) {
            if let Some(rating) = book.rating {
                if !(1..=5).contains(&rating) {
                    return Err(ApiError::InvalidInput(format!(
                        "rating {} for '{}' is outside the 1-5 scale",
                        rating, book.title
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A liked or disliked book. Accepts either a bare title string or the full
/// object form with optional rating/author/genre metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BookPreferenceRepr")]
pub struct BookPreference {
    pub title: String,
    pub rating: Option<u8>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

impl BookPreference {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rating: None,
            author: None,
            genre: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BookPreferenceRepr {
    Titled(String),
    Detailed(DetailedBookPreference),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedBookPreference {
    title: String,
    #[serde(default)]
    rating: Option<u8>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    genre: Option<String>,
}

impl From<BookPreferenceRepr> for BookPreference {
    fn from(repr: BookPreferenceRepr) -> Self {
        match repr {
            BookPreferenceRepr::Titled(title) => BookPreference::titled(&title),
            BookPreferenceRepr::Detailed(detail) => BookPreference {
                title: detail.title,
                rating: detail.rating,
                author: detail.author,
                genre: detail.genre,
            },
        }
    }
}

/// A liked or disliked genre, optionally carrying a hard keep/remove intent
/// that is merged into the request's filter spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GenrePreferenceRepr")]
pub struct GenrePreference {
    pub name: String,
    pub filter: Option<FilterIntent>,
}

impl GenrePreference {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenrePreferenceRepr {
    Named(String),
    Detailed(DetailedGenrePreference),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedGenrePreference {
    name: String,
    #[serde(default)]
    filter: Option<FilterIntent>,
}

impl From<GenrePreferenceRepr> for GenrePreference {
    fn from(repr: GenrePreferenceRepr) -> Self {
        match repr {
            GenrePreferenceRepr::Named(name) => GenrePreference::named(&name),
            GenrePreferenceRepr::Detailed(detail) => GenrePreference {
                name: detail.name,
                filter: detail.filter,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterIntent {
    Keep,
    Remove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_title_strings_and_full_objects() {
        let profile: RawProfile = serde_json::from_str(
            r#"{
                "user_id": "reader-1",
                "liked_books": [
                    "Dune",
                    {"title": "The Hobbit", "rating": 4, "author": "J.R.R. Tolkien"}
                ],
                "liked_genres": [
                    "Fantasy",
                    {"name": "Horror", "filter": "remove"}
                ]
            }"#,
        )
        .expect("valid profile");

        assert_eq!(profile.liked_books[0].title, "Dune");
        assert_eq!(profile.liked_books[0].rating, None);
        assert_eq!(profile.liked_books[1].rating, Some(4));
        assert_eq!(profile.liked_genres[1].filter, Some(FilterIntent::Remove));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_profile_fields() {
        let result = serde_json::from_str::<RawProfile>(
            r#"{"user_id": "reader-1", "favourite_color": "green"}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_blank_user_id() {
        let profile: RawProfile = serde_json::from_str(r#"{"user_id": "  "}"#).expect("parses");

        let err = profile.validate().expect_err("blank user_id must fail");
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_out_of_scale_ratings() {
        let profile: RawProfile = serde_json::from_str(
            r#"{"user_id": "reader-1", "liked_books": [{"title": "Dune", "rating": 9}]}"#,
        )
        .expect("parses");

        assert!(profile.validate().is_err());
    }
}
