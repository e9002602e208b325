pub mod dispatcher;
pub mod jobs;

pub use dispatcher::Dispatcher;
pub use jobs::JobContext;
