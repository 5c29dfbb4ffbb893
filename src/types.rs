//! Core identifier newtypes shared across `corpus`, `index`, `caching`, and
//! `ranker`. Grounded on the field types attested in
//! `include/meta/index/postings_file.h` (`PrimaryKey`/`SecondaryKey`
//! template parameters, typically `term_id`/`doc_id`) and pinned explicitly
//! by the data model.

use std::fmt;

macro_rules! id_newtype {
    ($name:ident, $repr:ty) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
        pub struct $name(pub $repr);

        impl $name {
            pub fn new(value: $repr) -> Self {
                $name(value)
            }

            pub fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                $name(value)
            }
        }
    };
}

id_newtype!(TermId, u64);
id_newtype!(DocId, u64);
id_newtype!(LabelId, u32);

/// An id type usable as the gap-encoded secondary key of a postings list
/// (`doc_id` for an inverted index's postings, `term_id` for a forward
/// index's). Mirrors `postings_stream<SecondaryKey, FeatureValue>`'s use of
/// a raw integer key that gap-decoding adds into (`count_.first += id`).
pub trait GapKey: Copy + Ord {
    fn as_u64(self) -> u64;
    fn from_u64(value: u64) -> Self;
}

impl GapKey for DocId {
    fn as_u64(self) -> u64 {
        self.get()
    }

    fn from_u64(value: u64) -> Self {
        DocId::new(value)
    }
}

impl GapKey for TermId {
    fn as_u64(self) -> u64 {
        self.get()
    }

    fn from_u64(value: u64) -> Self {
        TermId::new(value)
    }
}

/// Term (or term-id, post-vocabulary) -> count, as produced by an analyzer
/// and consumed by the in-memory postings buffer.
pub type FeatureMap<K> = std::collections::HashMap<K, u64>;

/// A user-facing classification label, e.g. "positive" / "negative".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassLabel(pub String);

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClassLabel {
    fn from(value: String) -> Self {
        ClassLabel(value)
    }
}

impl From<&str> for ClassLabel {
    fn from(value: &str) -> Self {
        ClassLabel(value.to_owned())
    }
}

/// Tag for the type of a single metadata column. Grounded on
/// `include/index/metadata.h`'s `field_type` tagged union.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataFieldType {
    SignedInt,
    UnsignedInt,
    Double,
    String,
}

/// A decoded metadata field value, one variant per [`MetadataFieldType`].
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataValue {
    SignedInt(i64),
    UnsignedInt(u64),
    Double(f64),
    String(String),
}

impl MetadataValue {
    pub fn field_type(&self) -> MetadataFieldType {
        match self {
            MetadataValue::SignedInt(_) => MetadataFieldType::SignedInt,
            MetadataValue::UnsignedInt(_) => MetadataFieldType::UnsignedInt,
            MetadataValue::Double(_) => MetadataFieldType::Double,
            MetadataValue::String(_) => MetadataFieldType::String,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::SignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetadataValue::UnsignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(v) => Some(v),
            _ => None,
        }
    }
}
