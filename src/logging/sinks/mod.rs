pub mod console;
pub mod crash;
pub mod file;

pub use console::ConsoleSink;
pub use crash::CrashSink;
pub use file::FileSink;
