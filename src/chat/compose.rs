use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::Language;

pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("File is too large. Please upload a text file smaller than {}.", human_size(*limit))]
    TooLarge {
        size: u64,
        limit: u64,
    },
    #[error("'{0}' is not a text file")]
    NotText(String),
    #[error("Failed to read attachment '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A text file picked for the next message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    content: String,
}

impl Attachment {
    /// Wraps already-decoded content, applying the same size limit as files.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        limit: u64
    ) -> Result<Self, AttachmentError> {
        let content = content.into();
        check_size(content.len() as u64, limit)?;
        Ok(Self { name: name.into(), content })
    }

    /// Reads a text file, checking its size before reading it.
    pub fn from_path(path: &Path, limit: u64) -> Result<Self, AttachmentError> {
        let display = path.display().to_string();
        let metadata = fs::metadata(path).map_err(|source| AttachmentError::Io {
            path: display.clone(),
            source,
        })?;
        check_size(metadata.len(), limit)?;

        let bytes = fs::read(path).map_err(|source| AttachmentError::Io {
            path: display.clone(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| AttachmentError::NotText(display.clone()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(display);
        Self::new(name, content, limit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    match bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= 1024 && b % 1024 == 0 => format!("{}KB", b / 1024),
        b => format!("{} bytes", b),
    }
}

fn check_size(size: u64, limit: u64) -> Result<(), AttachmentError> {
    if size > limit {
        return Err(AttachmentError::TooLarge { size, limit });
    }
    Ok(())
}

/// The two renderings of one outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Shown in the history and persisted.
    pub display_text: String,
    /// Sent to the model.
    pub prompt: String,
}

/// Returns `None` when there is nothing to send.
pub fn compose(input: &str, attachment: Option<&Attachment>, language: Language) -> Option<Outgoing> {
    if input.trim().is_empty() && attachment.is_none() {
        return None;
    }

    let (display_text, prompt) = match attachment {
        None => (input.to_string(), input.to_string()),
        Some(file) => {
            let marker = format!("[Attached File: {}]", file.name());
            let display = if input.is_empty() { marker } else { format!("{}\n\n{}", input, marker) };
            let prompt = format!(
                "{}\n\n--- Start of attached file: {} ---\n{}\n--- End of attached file ---",
                input,
                file.name(),
                file.content()
            );
            (display, prompt)
        }
    };

    let prompt = if language.is_default() {
        prompt
    } else {
        format!("(Please reply in {}) {}", language.english_name(), prompt)
    };

    Some(Outgoing { display_text, prompt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn notes() -> Attachment {
        Attachment::new("cuts.txt", "32in x2", DEFAULT_MAX_ATTACHMENT_BYTES).unwrap()
    }

    #[test]
    fn plain_input_is_sent_as_is() {
        let out = compose("Which saw?", None, Language::En).unwrap();
        assert_eq!(out.display_text, "Which saw?");
        assert_eq!(out.prompt, "Which saw?");
    }

    #[test]
    fn blank_input_without_attachment_is_ignored() {
        assert!(compose("   ", None, Language::En).is_none());
        assert!(compose("", None, Language::Es).is_none());
    }

    #[test]
    fn attachment_only_shows_marker_and_embeds_content() {
        let out = compose("", Some(&notes()), Language::En).unwrap();
        assert_eq!(out.display_text, "[Attached File: cuts.txt]");
        assert_eq!(
            out.prompt,
            "\n\n--- Start of attached file: cuts.txt ---\n32in x2\n--- End of attached file ---"
        );
    }

    #[test]
    fn display_and_prompt_differ_with_attachment() {
        let out = compose("Check my list", Some(&notes()), Language::En).unwrap();
        assert_eq!(out.display_text, "Check my list\n\n[Attached File: cuts.txt]");
        assert!(out.prompt.starts_with("Check my list\n\n--- Start of attached file: cuts.txt ---"));
        assert!(out.prompt.contains("32in x2"));
        assert!(!out.display_text.contains("32in x2"));
    }

    #[test]
    fn non_default_language_prefixes_reply_instruction() {
        let out = compose("Hola", None, Language::Es).unwrap();
        assert_eq!(out.prompt, "(Please reply in Spanish) Hola");
        assert_eq!(out.display_text, "Hola");
    }

    #[test]
    fn oversized_content_is_rejected() {
        let err = Attachment::new("big.txt", "x".repeat(11), 10).unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { size: 11, limit: 10 }));
        assert_eq!(err.to_string(), "File is too large. Please upload a text file smaller than 10 bytes.");
        let err = Attachment::new("big.txt", "x".repeat(1024 * 1024 + 1), DEFAULT_MAX_ATTACHMENT_BYTES).unwrap_err();
        assert_eq!(err.to_string(), "File is too large. Please upload a text file smaller than 1MB.");
        assert!(Attachment::new("ok.txt", "x".repeat(10), 10).is_ok());
    }

    #[test]
    fn reads_files_with_size_guard() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("plan.md");
        fs::write(&small, "# Plan").unwrap();
        let attachment = Attachment::from_path(&small, 1024).unwrap();
        assert_eq!(attachment.name(), "plan.md");
        assert_eq!(attachment.content(), "# Plan");

        let big = dir.path().join("big.txt");
        let mut file = fs::File::create(&big).unwrap();
        file.write_all(&vec![b'a'; 2048]).unwrap();
        assert!(matches!(
            Attachment::from_path(&big, 1024),
            Err(AttachmentError::TooLarge { size: 2048, .. })
        ));
    }

    #[test]
    fn binary_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(matches!(Attachment::from_path(&path, 1024), Err(AttachmentError::NotText(_))));
    }
}
