//! Reader state: which chapter is open, in which language, and what is
//! currently displayed for it.
//!
//! Every selection change bumps a generation counter. Translations run
//! outside the state lock and are applied only if their generation is still
//! current, so a slow answer for an older selection never overwrites a newer
//! one. Title and body are translated together and swapped in at once.

use log::{ debug, error, info };
use serde::Serialize;
use std::sync::{ Arc, Mutex, MutexGuard };
use thiserror::Error;

use crate::content::Library;
use crate::llm::AiClient;
use crate::models::{ Category, Chapter, Language };
use crate::render::{ render, Node };

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Unknown chapter '{0}'")]
    UnknownChapter(String),
}

#[derive(Debug, Clone)]
struct Displayed {
    title: String,
    content: String,
}

#[derive(Debug)]
struct ReaderState {
    chapter_id: String,
    language: Language,
    /// Translated text for the current selection; `None` shows the original.
    displayed: Option<Displayed>,
    translating: bool,
    generation: u64,
}

/// A translation to run for the selection identified by `generation`.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    generation: u64,
    language: Language,
    title: String,
    content: String,
}

impl TranslationJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderView {
    pub chapter_id: String,
    pub category: Category,
    pub read_time: String,
    pub image_url: String,
    pub language: Language,
    pub translating: bool,
    pub title: String,
    pub nodes: Vec<Node>,
}

pub struct Reader {
    library: Arc<Library>,
    client: Arc<AiClient>,
    state: Mutex<ReaderState>,
}

impl Reader {
    pub fn new(library: Arc<Library>, client: Arc<AiClient>) -> Self {
        let chapter_id = library.first().id.clone();
        Self {
            library,
            client,
            state: Mutex::new(ReaderState {
                chapter_id,
                language: Language::default(),
                displayed: None,
                translating: false,
                generation: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn language(&self) -> Language {
        self.state().language
    }

    pub fn current_chapter(&self) -> &Chapter {
        let id = self.state().chapter_id.clone();
        self.library.get_or_first(&id)
    }

    pub fn view(&self) -> ReaderView {
        let state = self.state();
        let chapter = self.library.get_or_first(&state.chapter_id);
        let (title, content) = match &state.displayed {
            Some(d) => (d.title.clone(), d.content.as_str()),
            None => (chapter.title.clone(), chapter.content.as_str()),
        };
        ReaderView {
            chapter_id: chapter.id.clone(),
            category: chapter.category,
            read_time: chapter.read_time.clone(),
            image_url: chapter.image_url.clone(),
            language: state.language,
            translating: state.translating,
            title,
            nodes: render(content),
        }
    }

    pub fn select_chapter(&self, id: &str) -> Result<Option<TranslationJob>, ReaderError> {
        if self.library.get(id).is_none() {
            return Err(ReaderError::UnknownChapter(id.to_string()));
        }
        let mut state = self.state();
        if state.chapter_id == id {
            return Ok(None);
        }
        info!("Selected chapter {}", id);
        state.chapter_id = id.to_string();
        Ok(self.invalidate(&mut state))
    }

    pub fn select_language(&self, language: Language) -> Option<TranslationJob> {
        let mut state = self.state();
        if state.language == language {
            return None;
        }
        info!("Selected language {}", language);
        state.language = language;
        self.invalidate(&mut state)
    }

    /// Starts a new generation for the current selection and returns the
    /// translation it needs, if any.
    fn invalidate(&self, state: &mut ReaderState) -> Option<TranslationJob> {
        state.generation += 1;
        state.displayed = None;

        if state.language.is_default() {
            state.translating = false;
            return None;
        }

        let chapter = self.library.get_or_first(&state.chapter_id);
        state.translating = true;
        Some(TranslationJob {
            generation: state.generation,
            language: state.language,
            title: chapter.title.clone(),
            content: chapter.content.clone(),
        })
    }

    /// Translates title and body concurrently, then applies both if the job
    /// is still current. Returns whether the result was applied.
    pub async fn complete(&self, job: TranslationJob) -> bool {
        let (title, content) = tokio::join!(
            self.client.translate(&job.title, job.language),
            self.client.translate(&job.content, job.language)
        );

        let mut state = self.state();
        if state.generation != job.generation {
            debug!(
                "Discarding stale translation (generation {} < {})",
                job.generation,
                state.generation
            );
            return false;
        }

        state.translating = false;
        match (title, content) {
            (Ok(title), Ok(content)) => {
                state.displayed = Some(Displayed { title, content });
                true
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to translate view: {}", e);
                state.displayed = None;
                false
            }
        }
    }

    /// Selects `chapter_id` in `language` and waits for any translation.
    pub async fn open(&self, chapter_id: &str, language: Language) -> Result<ReaderView, ReaderError> {
        let chapter_job = self.select_chapter(chapter_id)?;
        let job = self.select_language(language).or(chapter_job);
        if let Some(job) = job {
            self.complete(job).await;
        }
        Ok(self.view())
    }
}
