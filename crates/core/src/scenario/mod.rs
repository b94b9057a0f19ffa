use serde::{Deserialize, Serialize};

/// Identifier of a built-in practice scenario.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ScenarioError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ScenarioError::EmptyId);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scenario id must not be empty")]
    EmptyId,
}

/// One practice prompt. Selected once per session, read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PracticeScenario {
    pub id: ScenarioId,
    pub title: String,
    pub prompt_text: String,
    pub tips: Vec<String>,
}

fn scenario(id: &str, title: &str, prompt_text: &str, tips: &[&str]) -> PracticeScenario {
    PracticeScenario {
        id: ScenarioId(id.to_owned()),
        title: title.to_owned(),
        prompt_text: prompt_text.to_owned(),
        tips: tips.iter().map(|t| (*t).to_owned()).collect(),
    }
}

/// The built-in scenario list, in presentation order.
pub fn catalog() -> Vec<PracticeScenario> {
    vec![
        scenario(
            "introduction",
            "Introduce Yourself",
            "Introduce yourself in about a minute: who you are, what you do, \
             and one thing you are currently excited about.",
            &[
                "Look into the lens, not at your own preview.",
                "Smile before you start speaking.",
                "End on the thing you are excited about, not on your job title.",
            ],
        ),
        scenario(
            "interview",
            "Job Interview Answer",
            "Answer the classic interview question: tell me about a challenge \
             you faced and how you handled it.",
            &[
                "Structure the answer: situation, action, result.",
                "Keep your shoulders relaxed and your pace even.",
                "Let the result land before you stop talking.",
            ],
        ),
        scenario(
            "presentation",
            "Present an Idea",
            "Pitch an idea you care about to a small audience in under two \
             minutes.",
            &[
                "Open with why the idea matters, not with background.",
                "Use your hands, but keep them below your face.",
                "Vary your tone on the one sentence you want remembered.",
            ],
        ),
        scenario(
            "small-talk",
            "Small Talk Warm-up",
            "You just joined a video call two minutes early with someone you \
             barely know. Keep a light conversation going.",
            &[
                "Ask a question you actually want answered.",
                "React visibly while you listen.",
                "Short turns: hand the conversation back often.",
            ],
        ),
    ]
}

/// Look up a built-in scenario by id.
pub fn find(id: &str) -> Option<PracticeScenario> {
    catalog().into_iter().find(|s| s.id.as_str() == id)
}
