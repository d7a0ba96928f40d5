use crate::models::{ CategorySection, Chapter, ChapterSummary };
use log::info;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CHAPTERS: &str = include_str!("../../json/chapters.json");

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to read chapters file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse chapters: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Chapter library is empty")]
    Empty,
    #[error("Duplicate chapter id '{0}'")]
    DuplicateId(String),
}

/// The immutable, ordered set of chapters making up the book.
#[derive(Debug, Clone)]
pub struct Library {
    chapters: Vec<Chapter>,
}

impl Library {
    pub fn new(chapters: Vec<Chapter>) -> Result<Self, LibraryError> {
        if chapters.is_empty() {
            return Err(LibraryError::Empty);
        }
        for (idx, chapter) in chapters.iter().enumerate() {
            if chapters[..idx].iter().any(|c| c.id == chapter.id) {
                return Err(LibraryError::DuplicateId(chapter.id.clone()));
            }
        }
        Ok(Self { chapters })
    }

    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let chapters: Vec<Chapter> = serde_json::from_str(json)?;
        Self::new(chapters)
    }

    pub fn builtin() -> Result<Self, LibraryError> {
        Self::from_json(BUILTIN_CHAPTERS)
    }

    pub fn load(path: &str) -> Result<Self, LibraryError> {
        let json = fs::read_to_string(Path::new(path)).map_err(|source| LibraryError::Io {
            path: path.to_string(),
            source,
        })?;
        let library = Self::from_json(&json)?;
        info!("Loaded {} chapters from {}", library.chapters.len(), path);
        Ok(library)
    }

    /// Loads `path` when given, otherwise the chapters bundled with the binary.
    pub fn open(path: Option<&str>) -> Result<Self, LibraryError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn first(&self) -> &Chapter {
        &self.chapters[0]
    }

    pub fn get(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Like `get`, but unknown ids resolve to the first chapter.
    pub fn get_or_first(&self, id: &str) -> &Chapter {
        self.get(id).unwrap_or_else(|| self.first())
    }

    /// Chapters grouped by category, categories in order of first appearance.
    pub fn sections(&self) -> Vec<CategorySection> {
        let mut sections: Vec<CategorySection> = Vec::new();
        for chapter in &self.chapters {
            match sections.iter_mut().find(|s| s.category == chapter.category) {
                Some(section) => section.chapters.push(ChapterSummary::from(chapter)),
                None =>
                    sections.push(CategorySection {
                        category: chapter.category,
                        chapters: vec![ChapterSummary::from(chapter)],
                    }),
            }
        }
        sections
    }
}
