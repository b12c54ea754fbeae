// SPDX-License-Identifier: MIT
//! The built-in quest catalog: five templates per category.
//!
//! Templates are persisted into the `quests` table the first time they are
//! assigned, so quest IDs stay stable even if this list is reordered.

use rand_core::{OsRng, RngCore};

use super::Category;

#[derive(Debug, Clone, Copy)]
pub struct QuestTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub points: i64,
}

const SOCIAL: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Compliment someone today",
        description: "Give a genuine compliment to a friend, family member, or colleague.",
        points: 15,
    },
    QuestTemplate {
        title: "Call someone you haven't talked to in a while",
        description: "Reach out to an old friend or family member.",
        points: 20,
    },
    QuestTemplate {
        title: "Start a conversation with a stranger",
        description: "Say hello to someone new in a coffee shop, elevator, or waiting area.",
        points: 25,
    },
    QuestTemplate {
        title: "Share something positive on social media",
        description: "Post something uplifting or inspiring.",
        points: 10,
    },
    QuestTemplate {
        title: "Help someone with a small task",
        description: "Offer assistance to someone who might need it.",
        points: 15,
    },
];

const HEALTH: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Drink 8 glasses of water",
        description: "Stay hydrated throughout the day.",
        points: 10,
    },
    QuestTemplate {
        title: "Take a 10-minute walk",
        description: "Get some fresh air and light exercise.",
        points: 15,
    },
    QuestTemplate {
        title: "Do 20 push-ups or sit-ups",
        description: "Get your heart pumping with some bodyweight exercises.",
        points: 20,
    },
    QuestTemplate {
        title: "Eat a healthy breakfast",
        description: "Start your day with nutritious food.",
        points: 10,
    },
    QuestTemplate {
        title: "Stretch for 5 minutes",
        description: "Take time to stretch your muscles and improve flexibility.",
        points: 10,
    },
];

const MINDFULNESS: &[QuestTemplate] = &[
    QuestTemplate {
        title: "Meditate for 5 minutes",
        description: "Take time to clear your mind and focus on your breathing.",
        points: 20,
    },
    QuestTemplate {
        title: "Write down 3 things you're grateful for",
        description: "Practice gratitude by listing positive aspects of your life.",
        points: 15,
    },
    QuestTemplate {
        title: "Take 5 deep breaths",
        description: "Practice mindful breathing to reduce stress.",
        points: 10,
    },
    QuestTemplate {
        title: "Spend 10 minutes in nature",
        description: "Connect with the outdoors, even if just looking out a window.",
        points: 15,
    },
    QuestTemplate {
        title: "Practice positive self-talk",
        description: "Say something kind to yourself in the mirror.",
        points: 15,
    },
];

pub fn templates_for(category: Category) -> &'static [QuestTemplate] {
    match category {
        Category::Social => SOCIAL,
        Category::Health => HEALTH,
        Category::Mindfulness => MINDFULNESS,
    }
}

/// Pick a random template for `category`.
pub fn pick(category: Category) -> &'static QuestTemplate {
    let templates = templates_for(category);
    let idx = OsRng.next_u32() as usize % templates.len();
    &templates[idx]
}

/// Pick a random template whose title differs from `exclude_title`.
///
/// Best-effort distinctness: with a one-template catalog the excluded
/// template is returned anyway.
pub fn pick_different(category: Category, exclude_title: &str) -> &'static QuestTemplate {
    let candidates: Vec<&'static QuestTemplate> = templates_for(category)
        .iter()
        .filter(|t| t.title != exclude_title)
        .collect();
    if candidates.is_empty() {
        return pick(category);
    }
    let idx = OsRng.next_u32() as usize % candidates.len();
    candidates[idx]
}
