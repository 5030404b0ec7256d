pub mod edit;
pub mod search;
pub mod store;
pub mod view;
