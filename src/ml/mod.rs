pub mod encoder;
pub mod pca;
pub mod vocabulary;

// Re-export public types
pub use encoder::{encode_profile, EncodedFeatures, FEATURE_LEN};
pub use pca::Pca;
pub use vocabulary::{VocabularySet, VocabularyTable};
