pub mod community;
pub mod component;
pub mod error;
pub mod graph;
pub mod hit;
pub mod io;
pub mod layout;
pub mod overlap;
pub mod pipeline;
pub mod table;
