pub mod processor;
pub mod rules;
pub mod scanner;
pub mod state;

pub use processor::PlaylistParser;
pub use rules::ValidationRule;
pub use scanner::{Line, LineKind, LineScanner, scan};
pub use state::ParserState;
