use serde::{ Deserialize, Serialize };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Category {
    Foundation,
    Tools,
    Builds,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub read_time: String,
    pub image_url: String,
    /// Body in the line-prefix markup dialect.
    pub content: String,
}

/// Navigation entry, without the chapter body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub title: String,
    pub read_time: String,
}

impl From<&Chapter> for ChapterSummary {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.clone(),
            title: chapter.title.clone(),
            read_time: chapter.read_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub category: Category,
    pub chapters: Vec<ChapterSummary>,
}
