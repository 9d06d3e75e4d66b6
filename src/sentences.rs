use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::error::SentenceError;
use crate::session::TargetText;

static SENTENCE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/sentences");

const BUILTIN_FILE: &str = "builtin.json";

#[derive(Deserialize, Clone, Debug)]
pub struct SentenceBank {
    pub name: String,
    sentences: Vec<String>,
}

impl SentenceBank {
    /// The sentences bundled into the binary
    pub fn builtin() -> Result<Self, SentenceError> {
        let file = SENTENCE_DIR
            .get_file(BUILTIN_FILE)
            .ok_or_else(|| SentenceError::Bundle(format!("{BUILTIN_FILE} not bundled")))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| SentenceError::Bundle(format!("{BUILTIN_FILE} is not UTF-8")))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, SentenceError> {
        let bank: SentenceBank =
            serde_json::from_str(json).map_err(|err| SentenceError::Bundle(err.to_string()))?;
        if bank.sentences.is_empty() {
            return Err(SentenceError::Bundle(format!("{} has no sentences", bank.name)));
        }
        Ok(bank)
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    /// Sentence by 1-based number, as listed to the user
    pub fn get(&self, number: usize) -> Result<TargetText, SentenceError> {
        let sentence = number
            .checked_sub(1)
            .and_then(|idx| self.sentences.get(idx))
            .ok_or(SentenceError::OutOfRange {
                index: number,
                available: self.sentences.len(),
            })?;
        Ok(TargetText::new(sentence.as_str())?)
    }

    pub fn random(&self) -> Result<TargetText, SentenceError> {
        let mut rng = rand::thread_rng();
        let sentence = self
            .sentences
            .choose(&mut rng)
            .ok_or(SentenceError::OutOfRange {
                index: 1,
                available: 0,
            })?;
        Ok(TargetText::new(sentence.as_str())?)
    }
}
