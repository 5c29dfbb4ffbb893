//! On-disk index construction and storage: the vocabulary map, postings
//! files, external-memory chunk merging, metadata, and the disk-resident
//! inverted/forward indexes built from them (§4.3-§4.7).

pub mod chunk;
pub mod disk_index;
pub mod forward_index;
pub mod inverted_index;
pub mod metadata;
pub mod postings_data;
pub mod postings_file;
pub mod postings_stream;
pub mod string_list;
pub mod vocabulary_map;

pub use chunk::{merge_chunks, read_merged_chunk, ChunkHandler, ChunkKey};
pub use disk_index::DiskIndex;
pub use forward_index::ForwardIndex;
pub use inverted_index::InvertedIndex;
pub use metadata::{Metadata, MetadataSchema, MetadataStore, MetadataWriter};
pub use postings_data::PostingsData;
pub use postings_file::{PostingsFile, PostingsFileWriter};
pub use postings_stream::PostingsStream;
pub use string_list::{StringList, StringListWriter};
pub use vocabulary_map::{VocabularyMap, VocabularyMapWriter, DEFAULT_BLOCK_SIZE};
