pub mod error;
pub mod hls;
pub mod playlist;
pub mod stream;
pub mod tag;

pub use error::Error;
pub use playlist::Playlist;
pub type Result<T> = std::result::Result<T, Error>;
