pub mod cat;
pub mod clean;
pub mod cp;
pub mod create;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod put;
pub mod rm;
pub mod stat;
pub mod tree;

pub use cat::Cat;
pub use clean::Clean;
pub use cp::Cp;
pub use create::Create;
pub use ls::Ls;
pub use mkdir::Mkdir;
pub use mv::Mv;
pub use put::Put;
pub use rm::Rm;
pub use stat::Stat;
pub use tree::Tree;
