pub mod bit_stream;
pub mod byte_stream;
pub mod data_group;

// Re-export commonly used types
pub use bit_stream::{BitStream, UNBOUNDED, WORD_BITS, Word};
pub use byte_stream::{ContainerRead, ContainerWrite};
pub use data_group::{Container, HEADER_SIZE, Header, SUB_HEADER_SIZE, SubHeader};
