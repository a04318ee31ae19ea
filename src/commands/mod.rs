mod chat;
mod documents;
mod page;
mod settings;

pub use chat::*;
pub use documents::*;
pub use page::*;
pub use settings::*;
