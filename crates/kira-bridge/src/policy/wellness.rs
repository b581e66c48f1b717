use super::{PolicyKind, ResponsePolicy};
use crate::error::BridgeError;
use crate::inference::CancelToken;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

pub const DEFAULT_RESPONSE: &str = "Hi, I'm Kira, your on-device wellness assistant. \
I can help with stress, sleep, exercise, nutrition and emotional wellbeing. \
What would you like to focus on today?";

#[derive(Debug, Clone, Copy)]
enum Keyword {
    /// The whole word must match.
    Word(&'static str),
    /// Any word starting with this stem matches.
    Stem(&'static str),
    /// Matched anywhere in the prompt, spaces included.
    Phrase(&'static str),
}

/// Topics recognized by [`RuleBasedWellness`]. Declaration order is the matching
/// priority: the first topic with a matching keyword wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Topic {
    Greeting,
    Stress,
    Sleep,
    Fitness,
    Nutrition,
    MentalHealth,
    Arithmetic,
}

impl Topic {
    fn keywords(self) -> &'static [Keyword] {
        use Keyword::*;
        match self {
            Topic::Greeting => &[
                Word("hello"),
                Word("hi"),
                Word("hey"),
                Phrase("good morning"),
                Phrase("good evening"),
            ],
            Topic::Stress => &[
                Stem("stress"),
                Stem("anxi"),
                Stem("worr"),
                Stem("overwhelm"),
                Stem("panic"),
            ],
            Topic::Sleep => &[
                Stem("sleep"),
                Stem("insomnia"),
                Word("tired"),
                Stem("fatigue"),
                Stem("exhaust"),
                Word("rest"),
            ],
            Topic::Fitness => &[
                Stem("exercis"),
                Stem("workout"),
                Stem("fitness"),
                Word("run"),
                Word("running"),
                Word("gym"),
                Stem("walk"),
            ],
            Topic::Nutrition => &[
                Stem("nutri"),
                Stem("diet"),
                Word("food"),
                Word("eat"),
                Word("eating"),
                Stem("meal"),
                Stem("hydrat"),
            ],
            Topic::MentalHealth => &[
                Phrase("mental health"),
                Stem("depress"),
                Word("sad"),
                Stem("lonel"),
                Word("mood"),
                Stem("therap"),
            ],
            Topic::Arithmetic => &[Phrase("2+2"), Phrase("2 + 2")],
        }
    }

    pub fn response(self) -> &'static str {
        match self {
            Topic::Greeting => {
                "Hello! I'm Kira, your wellness assistant. How can I help you today?"
            }
            Topic::Stress => {
                "It sounds like you're carrying some stress. Try a slow breathing exercise: \
                 breathe in for four seconds, hold for four, and breathe out for six. \
                 Short breaks and naming what is causing the stress can also help you regain control."
            }
            Topic::Sleep => {
                "Good sleep makes everything easier. Aim for a consistent bedtime, keep screens \
                 out of the last hour before bed, and keep your room cool and dark. \
                 If you feel tired during the day, a short walk in daylight can help."
            }
            Topic::Fitness => {
                "Regular movement is great for body and mind. Start with 20 to 30 minutes of \
                 activity you enjoy, such as walking, cycling or stretching, and build up gradually. \
                 Remember to warm up and listen to your body."
            }
            Topic::Nutrition => {
                "A balanced diet supports your energy and mood. Fill half your plate with \
                 vegetables and fruit, include some protein and whole grains, and drink water \
                 throughout the day."
            }
            Topic::MentalHealth => {
                "Thank you for sharing that with me. Your feelings matter. Talking with someone \
                 you trust, keeping a simple routine and being kind to yourself can help. \
                 If things feel too heavy, please reach out to a mental health professional."
            }
            Topic::Arithmetic => "2 + 2 = 4. Everything is working as expected on my side.",
        }
    }

    fn matches(self, lowered: &str, words: &[&str]) -> bool {
        self.keywords().iter().any(|keyword| match keyword {
            Keyword::Word(word) => words.contains(word),
            Keyword::Stem(stem) => words.iter().any(|w| w.starts_with(stem)),
            Keyword::Phrase(phrase) => lowered.contains(phrase),
        })
    }
}

/// Deterministic keyword-driven stand-in for the wellness model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedWellness;

impl RuleBasedWellness {
    /// First topic, in priority order, whose keywords occur in `prompt`.
    pub fn classify(&self, prompt: &str) -> Option<Topic> {
        let lowered = prompt.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();
        Topic::iter().find(|topic| topic.matches(&lowered, &words))
    }

    pub fn respond(&self, prompt: &str) -> &'static str {
        self.classify(prompt)
            .map(Topic::response)
            .unwrap_or(DEFAULT_RESPONSE)
    }
}

impl ResponsePolicy for RuleBasedWellness {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RuleBasedWellness
    }

    fn generate(&self, prompt: &str, _cancel: &CancelToken) -> Result<String, BridgeError> {
        let topic = self.classify(prompt);
        log::debug!(
            "Wellness prompt matched topic {}",
            topic.map(<&'static str>::from).unwrap_or("none")
        );
        Ok(topic
            .map(Topic::response)
            .unwrap_or(DEFAULT_RESPONSE)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello there", Some(Topic::Greeting))]
    #[case("hi", Some(Topic::Greeting))]
    #[case("Good morning Kira", Some(Topic::Greeting))]
    #[case("I feel stressed", Some(Topic::Stress))]
    #[case("My anxiety is bad lately", Some(Topic::Stress))]
    #[case("I can't sleep at night", Some(Topic::Sleep))]
    #[case("So tired today", Some(Topic::Sleep))]
    #[case("Suggest a workout", Some(Topic::Fitness))]
    #[case("What should I eat for dinner?", Some(Topic::Nutrition))]
    #[case("Is my diet ok", Some(Topic::Nutrition))]
    #[case("Let's talk about mental health", Some(Topic::MentalHealth))]
    #[case("I feel lonely", Some(Topic::MentalHealth))]
    #[case("2+2=", Some(Topic::Arithmetic))]
    #[case("what is 2 + 2", Some(Topic::Arithmetic))]
    #[case("Tell me about the weather", None)]
    #[case("", None)]
    fn classifies_single_topic(#[case] prompt: &str, #[case] expected: Option<Topic>) {
        assert_eq!(RuleBasedWellness.classify(prompt), expected);
    }

    #[test]
    fn priority_order_is_fixed() {
        let order: Vec<Topic> = Topic::iter().collect();
        assert_eq!(
            order,
            vec![
                Topic::Greeting,
                Topic::Stress,
                Topic::Sleep,
                Topic::Fitness,
                Topic::Nutrition,
                Topic::MentalHealth,
                Topic::Arithmetic,
            ]
        );
    }

    #[rstest]
    #[case("I can't sleep because of stress", Topic::Stress)]
    #[case("hello, I am stressed", Topic::Greeting)]
    #[case("too tired to exercise", Topic::Sleep)]
    #[case("does exercise help my diet", Topic::Fitness)]
    #[case("sad, what food helps", Topic::Nutrition)]
    #[case("does 2+2 make me sad", Topic::MentalHealth)]
    fn earlier_topic_wins_ties(#[case] prompt: &str, #[case] expected: Topic) {
        assert_eq!(RuleBasedWellness.classify(prompt), Some(expected));
    }

    #[test]
    fn short_greetings_need_a_whole_word() {
        // "this" and "think" contain "hi" but are not greetings.
        assert_eq!(RuleBasedWellness.classify("I think this is fine"), None);
        assert_eq!(RuleBasedWellness.classify("restaurant tips"), None);
    }

    #[test]
    fn unmatched_prompt_gets_introduction() {
        assert_eq!(RuleBasedWellness.respond("Tell me a joke"), DEFAULT_RESPONSE);
    }

    #[test]
    fn stress_response_gives_guidance() {
        let text = RuleBasedWellness
            .generate("I feel stressed", &CancelToken::new())
            .unwrap();
        assert!(text.contains("stress"));
        assert!(text.contains("breathing"));
    }
}
