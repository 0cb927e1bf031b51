pub mod context;
pub mod lowlevel;
pub mod shader;
