pub mod event_sink;
pub mod extractor;
pub mod order_parser;
pub mod tab_source;

pub use event_sink::EventSink;
pub use extractor::{DomOrderExtractor, PageExtractor};
pub use order_parser::{OrderBlock, OrderParser, ParseStats};
pub use tab_source::{ChromeTab, ChromeTabSource, ScanTab, TabSource};
