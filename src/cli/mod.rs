use clap::{ Parser, Subcommand };

use crate::chat::compose::DEFAULT_MAX_ATTACHMENT_BYTES;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Gemini Args ---
    /// API key for the Gemini API. Only checked when an AI feature is first used.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Alternative name for the Gemini API key, used when `--api-key` is unset
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for chat and translation
    #[arg(long, env = "CHAT_MODEL", default_value = "gemini-2.5-flash")]
    pub chat_model: String,

    /// Base URL override for the Gemini API
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let rllm use the public endpoint
    pub chat_base_url: Option<String>,

    // --- Storage Args ---
    /// Directory holding the persisted chat history
    #[arg(long, env = "DATA_DIR", default_value = ".country-skills")]
    pub data_dir: String,

    /// Optional JSON file with the book chapters. Defaults to the built-in handbook.
    #[arg(long, env = "CHAPTERS_PATH")]
    pub chapters_path: Option<String>,

    /// Largest text file accepted as a chat attachment, in bytes
    #[arg(long, env = "MAX_ATTACHMENT_BYTES", default_value_t = DEFAULT_MAX_ATTACHMENT_BYTES)]
    pub max_attachment_bytes: u64,

    // --- Server Args ---
    /// Host address and port for the HTTP API to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// The Gemini key, preferring `API_KEY` over `GEMINI_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| self.gemini_api_key.clone())
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the reader API (default)
    Serve,
    /// List the chapters by category
    Chapters,
    /// Print a chapter, translated when a language other than English is chosen
    Read {
        /// Chapter id, e.g. intro-wood
        id: String,
        /// Language code (en, es, fr, de)
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Ask the workshop assistant one question
    Ask {
        text: String,
        /// Text file to attach to the question
        #[arg(long)]
        attach: Option<String>,
        /// Language the assistant should reply in
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Print the stored chat history
    History,
    /// Clear the stored chat history
    Clear {
        /// Confirm clearing the history
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serving() {
        let args = Args::try_parse_from(["country-skills-reader", "--api-key", "k"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.max_attachment_bytes, 1024 * 1024);
        assert_eq!(args.api_key().as_deref(), Some("k"));
    }

    #[test]
    fn gemini_key_is_used_when_api_key_is_missing() {
        let args = Args::try_parse_from(["country-skills-reader", "--gemini-api-key", "g"]).unwrap();
        assert_eq!(args.api_key().as_deref(), Some("g"));

        let args = Args::try_parse_from([
            "country-skills-reader",
            "--api-key",
            "a",
            "--gemini-api-key",
            "g",
        ]).unwrap();
        assert_eq!(args.api_key().as_deref(), Some("a"));
    }

    #[test]
    fn parses_ask_with_attachment() {
        let args = Args::try_parse_from([
            "country-skills-reader",
            "ask",
            "Is this cut list right?",
            "--attach",
            "cuts.txt",
            "--lang",
            "fr",
        ]).unwrap();
        match args.command {
            Some(Command::Ask { text, attach, lang }) => {
                assert_eq!(text, "Is this cut list right?");
                assert_eq!(attach.as_deref(), Some("cuts.txt"));
                assert_eq!(lang, "fr");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
