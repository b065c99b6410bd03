//! Ownerless example notes every fresh board starts with.

pub use crate::model::note::SEED_NOTE_IDS;

use crate::model::note::{LlmModel, Note, NoteColor, NoteId, Point};
use crate::model::Timestamp;

/// Seed note plus its fixed placement and pre-generated response.
#[derive(Debug, Clone)]
pub struct SeedEntry {
    pub note: Note,
    pub position: Point,
    pub response: String,
}

/// Builds the seed set stamped with `now`.
pub fn seed_entries(now: Timestamp) -> Vec<SeedEntry> {
    vec![
        entry(
            SEED_NOTE_IDS[0],
            "Marketing Team",
            "Write a catchy slogan for our new eco-friendly water bottle",
            NoteColor::Blue,
            LlmModel::Gpt4,
            Point::new(350.0, 120.0),
            "I've analyzed your request for a catchy slogan. As GPT-4, I suggest: \
             \"Wave Goodbye to Plastic, Hello to Fantastic! Our eco-bottles make every \
             drop count while keeping waste amounts down.\"",
            now,
        ),
        entry(
            SEED_NOTE_IDS[1],
            "Tech Support",
            "Explain how to troubleshoot a router connection issue to a non-technical person",
            NoteColor::Green,
            LlmModel::Claude3Sonnet,
            Point::new(500.0, 220.0),
            "I appreciate your question about router troubleshooting. As Claude 3 Sonnet, \
             here's a simple explanation: Imagine your router is like a mailroom for your \
             internet. If it's not working, first try turning it off for 30 seconds then \
             back on - this is like giving it a fresh start. Next, check if the cables are \
             connected properly, like making sure all the mailboxes are closed. If those \
             steps don't work, try moving closer to the router, as distance can weaken the \
             signal.",
            now,
        ),
        entry(
            SEED_NOTE_IDS[2],
            "Research",
            "Compare the environmental impact of electric vs. gas vehicles",
            NoteColor::Purple,
            LlmModel::Claude3Opus,
            Point::new(350.0, 320.0),
            "Thank you for your prompt about comparing environmental impacts. As Claude 3 \
             Opus, I'll approach this thoughtfully. Electric vehicles produce zero tailpipe \
             emissions but their environmental footprint depends heavily on how their \
             electricity is generated. If powered by renewable energy, EVs are significantly \
             cleaner overall. However, manufacturing EV batteries requires resource-intensive \
             mining. Gas vehicles produce direct emissions during operation and indirectly \
             through fuel production. When considering full lifecycle assessment, EVs \
             typically have lower total environmental impact in regions with cleaner \
             electricity grids.",
            now,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    title: &str,
    prompt: &str,
    color: NoteColor,
    model: LlmModel,
    position: Point,
    response: &str,
    now: Timestamp,
) -> SeedEntry {
    SeedEntry {
        note: Note {
            id: NoteId::new(id),
            owner_id: None,
            title: title.to_string(),
            prompt: prompt.to_string(),
            color,
            model,
            created_at: now,
        },
        position,
        response: response.to_string(),
    }
}
