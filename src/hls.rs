pub mod byterange;
pub mod key;
pub mod map;
pub mod segment;
pub mod start;
pub mod stream_info;

pub use byterange::{ByteRange, ResolvedByteRange};
pub use key::{KeyMethod, KeyRef};
pub use map::MapRef;
pub use segment::{Extinf, Segment};
pub use start::StartPoint;
pub use stream_info::VariantStream;
