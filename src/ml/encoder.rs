use crate::error::Result;
use crate::ml::vocabulary::{VocabularySet, VocabularyTable};
use crate::models::{BookPreference, RawProfile};
use serde::Serialize;
use tracing::warn;

/// Fixed length of every encoded preference array, set by the embedding
/// model's input signature.
pub const FEATURE_LEN: usize = 20;

const DEFAULT_LIKED_RATING: u32 = 5;
const DEFAULT_DISLIKED_RATING: u32 = 1;

/// The normalized form submitted to the embedding service. Field names and
/// ordering match the service's instance signature; the four trailing
/// single-element arrays are placeholders the signature still requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedFeatures {
    pub user_id: u32,
    pub liked_books: Vec<u32>,
    pub disliked_books: Vec<u32>,
    pub liked_genres: Vec<u32>,
    pub disliked_genres: Vec<u32>,
    pub liked_authors: Vec<u32>,
    pub disliked_authors: Vec<u32>,
    pub liked_ratings: Vec<u32>,
    pub disliked_ratings: Vec<u32>,
    pub categories: [u32; 1],
    pub description: [u32; 1],
    pub target_book: [u32; 1],
    pub target_book_rating: [u32; 1],
}

/// Normalize a validated profile into fixed-shape encoded arrays.
///
/// Pure over its inputs: every categorical value goes through its field's
/// vocabulary table, every array comes out exactly [`FEATURE_LEN`] long.
pub fn encode_profile(profile: &RawProfile, vocabs: &VocabularySet) -> Result<EncodedFeatures> {
    profile.validate()?;

    Ok(EncodedFeatures {
        user_id: vocabs.user_id.encode(&profile.user_id),
        liked_books: pad("liked_books", encode_titles(&profile.liked_books, &vocabs.title)),
        disliked_books: pad(
            "disliked_books",
            encode_titles(&profile.disliked_books, &vocabs.title),
        ),
        liked_genres: pad(
            "liked_genres",
            profile
                .liked_genres
                .iter()
                .map(|genre| vocabs.genre.encode(&genre.name))
                .collect(),
        ),
        disliked_genres: pad(
            "disliked_genres",
            profile
                .disliked_genres
                .iter()
                .map(|genre| vocabs.genre.encode(&genre.name))
                .collect(),
        ),
        liked_authors: pad(
            "liked_authors",
            profile
                .liked_authors
                .iter()
                .map(|author| vocabs.author.encode(author))
                .collect(),
        ),
        disliked_authors: pad(
            "disliked_authors",
            profile
                .disliked_authors
                .iter()
                .map(|author| vocabs.author.encode(author))
                .collect(),
        ),
        liked_ratings: pad(
            "liked_ratings",
            ratings(&profile.liked_books, DEFAULT_LIKED_RATING),
        ),
        disliked_ratings: pad(
            "disliked_ratings",
            ratings(&profile.disliked_books, DEFAULT_DISLIKED_RATING),
        ),
        categories: [0],
        description: [0],
        target_book: [0],
        target_book_rating: [0],
    })
}

fn encode_titles(books: &[BookPreference], table: &VocabularyTable) -> Vec<u32> {
    books.iter().map(|book| table.encode(&book.title)).collect()
}

fn ratings(books: &[BookPreference], default: u32) -> Vec<u32> {
    books
        .iter()
        .map(|book| book.rating.map(u32::from).unwrap_or(default))
        .collect()
}

/// Right-pad with zeros to the wire length. Overlong input is truncated to
/// preserve the fixed-shape contract; the drop is logged since the tail is
/// lost silently otherwise.
fn pad(field: &'static str, mut values: Vec<u32>) -> Vec<u32> {
    if values.len() > FEATURE_LEN {
        warn!(
            field,
            dropped = values.len() - FEATURE_LEN,
            "preference list exceeds the encoded length, truncating"
        );
        values.truncate(FEATURE_LEN);
    }
    values.resize(FEATURE_LEN, 0);
    values
}
