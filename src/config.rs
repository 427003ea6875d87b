//! Application-level configuration loading, including the card dataset.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::deck::{AnswerCard, CardSet, PromptCard};

/// Default location on disk where the server looks for the JSON card dataset.
const DEFAULT_CONFIG_PATH: &str = "config/decks.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PROMPT_PARTY_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    cards: CardSet,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in card dataset.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        prompts = app_config.cards.prompts.len(),
                        answers = app_config.cards.answers.len(),
                        "loaded card dataset from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in card dataset"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// The card dataset rooms draw their decks from.
    pub fn cards(&self) -> &CardSet {
        &self.cards
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cards: default_card_set(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    prompts: Vec<RawPromptCard>,
    answers: Vec<RawAnswerCard>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let prompts = value
            .prompts
            .into_iter()
            .enumerate()
            .map(|(i, raw)| PromptCard {
                id: format!("p{}", i + 1),
                text: raw.text,
                pick: raw.pick.clamp(1, 3),
            })
            .collect();
        let answers = value
            .answers
            .into_iter()
            .enumerate()
            .map(|(i, raw)| AnswerCard {
                id: format!("a{}", i + 1),
                text: raw.text,
                is_custom: false,
            })
            .collect();
        Self {
            cards: CardSet { prompts, answers },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single prompt entry inside the configuration file.
struct RawPromptCard {
    text: String,
    #[serde(default = "default_pick")]
    pick: u8,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single answer entry inside the configuration file.
struct RawAnswerCard {
    text: String,
}

fn default_pick() -> u8 {
    1
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in card dataset shipped with the binary.
fn default_card_set() -> CardSet {
    let prompts: &[(&str, u8)] = &[
        ("The secret ingredient in grandma's famous stew is _____.", 1),
        ("My therapist says my biggest problem is _____.", 1),
        ("The next hit mobile game: a simulator about _____.", 1),
        ("I lost my job because of _____.", 1),
        ("The museum's newest exhibit: a shrine to _____.", 1),
        ("Nothing ruins a road trip faster than _____.", 1),
        ("Scientists have finally discovered the cause of _____.", 1),
        ("My dating profile says I enjoy long walks and _____.", 1),
        ("The real reason the meeting ran three hours: _____.", 1),
        ("This year's office party was cancelled due to _____.", 1),
        ("My superhero origin story involves _____.", 1),
        ("The worst possible wifi password: _____.", 1),
        ("Step one of my five-year plan: _____.", 1),
        ("The landlord said the rent covers heating, water, and _____.", 1),
        ("I knew the restaurant was bad when the menu listed _____.", 1),
        ("The new fitness craze sweeping the nation: _____.", 1),
        ("My autobiography will be titled 'A Life Ruined by _____'.", 1),
        ("The time capsule from 1995 contained nothing but _____.", 1),
        ("Breaking news: local man arrested for _____.", 1),
        ("The group chat has been silent ever since _____.", 1),
        ("My doctor prescribed two weeks of _____.", 1),
        ("The wedding was beautiful until _____.", 1),
        ("The job posting asked for five years of experience in _____.", 1),
        ("I survived the camping trip thanks to _____.", 1),
        ("The school board voted to replace history class with _____.", 1),
        ("My smart fridge keeps ordering _____.", 1),
        ("The award for worst smell goes to _____.", 1),
        ("Every family reunion ends with an argument about _____.", 1),
        ("The fortune teller looked at my palm and saw _____.", 1),
        ("In the sequel, the hero must choose between _____ and _____.", 2),
        ("My two greatest weaknesses: _____ and _____.", 2),
        ("The recipe calls for a pinch of _____ and a cup of _____.", 2),
        ("First date checklist: _____ and _____.", 2),
        ("The heist went wrong when _____ met _____.", 2),
        ("A balanced breakfast: _____, _____, and _____.", 3),
        ("My three wishes: _____, _____, and _____.", 3),
    ];

    let answers: &[&str] = &[
        "a suspiciously confident raccoon",
        "my collection of expired coupons",
        "interpretive dance",
        "the neighbor's leaf blower at 6 AM",
        "a lifetime supply of lukewarm soup",
        "aggressive small talk",
        "forgetting why I walked into the room",
        "a motivational poster of a cat",
        "the printer that only jams on Fridays",
        "my uncle's conspiracy theories",
        "an emotional support cactus",
        "replying-all by accident",
        "decorative soap nobody may use",
        "a 45-minute voicemail",
        "the world's loudest keyboard",
        "unsolicited life advice",
        "a pigeon with a grudge",
        "mismatched socks worn with pride",
        "the last slice of pizza, stolen",
        "an alarm clock with no snooze button",
        "my search history",
        "a glitter bomb",
        "twelve browser tabs of recipes I will never cook",
        "the office microwave smell",
        "a karaoke rendition of a power ballad",
        "instructions written entirely in riddles",
        "a squirrel in a tiny hard hat",
        "passive-aggressive sticky notes",
        "the fine print",
        "an inflatable flamingo",
        "my phone at one percent battery",
        "a dramatic weather forecast",
        "hold music from 1987",
        "the group project member who vanished",
        "a suspiciously cheap sushi buffet",
        "socks as a birthday present",
        "an overly honest fortune cookie",
        "the elevator that stops on every floor",
        "my imaginary friend's lawyer",
        "a treadmill used as a clothes rack",
        "spontaneous jazz hands",
        "the loading spinner of doom",
        "a family-sized tub of regret",
        "accidentally liking a photo from 2014",
        "the mystery stain on the ceiling",
        "a very judgmental parrot",
        "lukewarm applause",
        "assembly instructions with missing steps",
        "the smoke alarm chirping at 3 AM",
        "an extremely detailed spreadsheet about nothing",
        "a haunted vending machine",
        "my knees making sounds",
        "the wrong kind of mushroom",
        "a surprise fire drill during lunch",
        "glitter that never fully goes away",
        "the one shopping cart with a broken wheel",
        "an apology written by a lawyer",
        "a PowerPoint about my feelings",
        "the neighbor's wifi name insulting mine",
        "a dog wearing sunglasses",
        "expired yogurt roulette",
        "the committee for forming committees",
        "a trust fall gone wrong",
        "whispering 'no' at my alarm",
        "an invoice for emotional damages",
        "the chair that screams when you sit",
        "a llama in business casual",
        "pretending to understand the plot",
        "the last parking spot, taken",
        "a suspiciously smooth talking salesman",
        "my blood type: coffee",
        "a weather app that lies",
        "the aux cord, seized by force",
        "an escape room with no exit",
        "my signature dish: cereal",
        "a standing ovation for mediocrity",
        "the IT guy's deep sigh",
        "a bagpipe solo at midnight",
        "my collection of hotel shampoo bottles",
        "the word 'moist'",
        "an army of garden gnomes",
        "a plot twist nobody asked for",
        "the self-checkout yelling about the bagging area",
        "my fourth cup of coffee",
        "a fax machine in 2026",
        "the slow walker in the fast lane",
        "an autographed photo of nobody famous",
        "my retirement plan: the lottery",
        "a drum solo that never ends",
        "the sound of dial-up internet",
        "an all-you-can-eat salad bar",
        "my cat's disappointment in me",
    ];

    CardSet {
        prompts: prompts
            .iter()
            .enumerate()
            .map(|(i, (text, pick))| PromptCard {
                id: format!("p{}", i + 1),
                text: (*text).to_owned(),
                pick: *pick,
            })
            .collect(),
        answers: answers
            .iter()
            .enumerate()
            .map(|(i, text)| AnswerCard {
                id: format!("a{}", i + 1),
                text: (*text).to_owned(),
                is_custom: false,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dataset_is_playable() {
        let cards = default_card_set();

        assert!(cards.prompts.len() >= 30);
        assert!(cards.answers.len() >= 80);
        assert!(cards.prompts.iter().all(|p| (1..=3).contains(&p.pick)));
        assert!(cards.prompts.iter().any(|p| p.pick > 1));
        assert!(cards.answers.iter().all(|a| !a.is_custom));
    }

    #[test]
    fn raw_config_assigns_sequential_ids_and_clamps_pick() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "prompts": [
                    {"text": "____?"},
                    {"text": "____ and ____", "pick": 2},
                    {"text": "all of ____", "pick": 9}
                ],
                "answers": [{"text": "something"}, {"text": "anything"}]
            }"#,
        )
        .unwrap();

        let config: AppConfig = raw.into();
        let cards = config.cards();

        assert_eq!(cards.prompts[0].id, "p1");
        assert_eq!(cards.prompts[0].pick, 1);
        assert_eq!(cards.prompts[1].pick, 2);
        assert_eq!(cards.prompts[2].pick, 3);
        assert_eq!(cards.answers[1].id, "a2");
    }
}
