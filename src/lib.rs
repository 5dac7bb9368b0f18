pub mod config;
pub mod ctags;
pub mod logging;
pub mod lsp;
