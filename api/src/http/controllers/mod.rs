pub mod query;
pub mod status;

pub use query as QueryController;
pub use status as StatusController;
