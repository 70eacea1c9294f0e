pub mod session;

pub use session::ReaderSession;
