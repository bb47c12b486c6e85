pub mod watch;
pub mod destination;

pub use watch::{Direction, InstrumentKey, MarketSegment, Watch, WatchUpdate};
pub use destination::TelegramLink;
