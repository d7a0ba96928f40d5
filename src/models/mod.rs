pub mod chapter;
pub mod chat;
pub mod language;

pub use chapter::{ Category, CategorySection, Chapter, ChapterSummary };
pub use chat::{ Message, Role };
pub use language::{ Language, LanguageOption };
