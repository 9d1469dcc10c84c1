pub mod mangadex;
pub mod model;
pub mod source;
pub mod store;
