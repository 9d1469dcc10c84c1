pub mod pagination;
#[allow(clippy::module_inception)]
pub mod ui;
