pub mod animation;
pub mod classdb;
pub mod convert;
pub mod dispatcher;
pub mod document;
pub mod entry;
pub mod ops;
pub mod params;
pub mod tree;
pub mod tscn;
pub mod variant;
