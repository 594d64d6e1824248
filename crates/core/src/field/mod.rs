//! Height-field data and the ping-pong buffer pair

mod buffer_pair;
mod height_field;

pub use buffer_pair::{BufferPair, FieldId};
pub use height_field::{height_at, height_energy, texel_index_at, HeightField, Texel};
