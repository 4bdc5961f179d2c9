//! Attribute clan notification lines to the player they are about.
//!
//! The clan's notification bot posts one line per event, e.g. `Zed has defeated Bob` or
//! `**Alice**: gz`.  Each line is tried against an ordered table of templates.  The first template
//! that matches anywhere in the line wins, even if a later one would capture a "better" name.

use regex::Regex;
use std::sync::LazyLock;

/// Player name capture shared by every template.  Non-greedy, so the name stops at the first
/// occurrence of the template's keyword phrase.  Broadcasts often separate the words of a name with
/// a no-break space rather than a plain one, so any space separator is allowed inside the name.
const NAME: &str = r"(?P<name>\w[\w\p{Zs}\-]*?)";

const SKILLS: &str = "Attack|Strength|Defence|Ranged|Prayer|Magic|Runecraft|Construction|\
                      Hitpoints|Agility|Herblore|Thieving|Crafting|Fletching|Slayer|Hunter|\
                      Mining|Smithing|Fishing|Cooking|Firemaking|Woodcutting|Farming|Sailing|\
                      Combat|Overall";

const COMBAT_TIERS: &str = "easy|medium|hard|elite|master|grandmaster";

const DIARY_TIERS: &str = "easy|medium|hard|elite";

const DIARY_AREAS: &str = "Ardougne|Desert|Falador|Fremennik|Kandarin|Karamja|\
                           Kourend & Kebos|Lumbridge & Draynor|Morytania|Varrock|\
                           Western Provinces|Wilderness";

/// Kind of clan event a line reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Chat,
    Milestone,
    Drop,
    CollectionLog,
    RaidLoot,
    ClueItem,
    LevelUp,
    XpMilestone,
    CombatTask,
    Pet,
    Death,
    PvpKill,
    CofferDeposit,
    Diary,
    CombatAchievementTier,
    TotalLevel,
    Recruit,
    LootKey,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            Category::Chat => "chat",
            Category::Milestone => "milestone",
            Category::Drop => "drop",
            Category::CollectionLog => "collection log",
            Category::RaidLoot => "raid loot",
            Category::ClueItem => "clue item",
            Category::LevelUp => "level up",
            Category::XpMilestone => "xp milestone",
            Category::CombatTask => "combat task",
            Category::Pet => "pet",
            Category::Death => "death",
            Category::PvpKill => "pvp kill",
            Category::CofferDeposit => "coffer deposit",
            Category::Diary => "diary",
            Category::CombatAchievementTier => "combat achievement tier",
            Category::TotalLevel => "total level",
            Category::Recruit => "recruit",
            Category::LootKey => "loot key",
        };
        f.write_str(label)
    }
}

/// A classified line
#[derive(Debug, PartialEq, Eq)]
pub struct Attribution {
    pub player: String,
    pub category: Category,
}

struct Template {
    category: Category,
    regex: Regex,
}

impl Template {
    fn new(category: Category, pattern: &str) -> Self {
        Self {
            category,
            regex: Regex::new(pattern).expect("invalid clan chat template"),
        }
    }

    /// Template of the form `<name> <phrase>`
    fn narrative(category: Category, phrase: &str) -> Self {
        Self::new(category, &format!("{NAME} {phrase}"))
    }
}

/// Inline Discord markup such as `<:emoji:123>` or `<@123>`
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid markup pattern"));

/// Ordered template table.  Order matters: lines routinely satisfy more than one template, e.g. a
/// bolded chat message quoting a broadcast.
static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    use Category::*;

    vec![
        Template::new(Chat, &format!(r"\*\*{NAME}\*\*")),
        Template::narrative(Milestone, r"(?:has )?achieved a new"),
        Template::narrative(Drop, r"received a drop"),
        Template::narrative(CollectionLog, r"received a new collection log item"),
        Template::narrative(RaidLoot, r"received special loot from a raid"),
        Template::narrative(ClueItem, r"received a clue item"),
        Template::narrative(LevelUp, &format!(r"has reached (?i:{SKILLS}) level")),
        Template::narrative(
            XpMilestone,
            &format!(r"has reached [\d,]+ XP in (?i:{SKILLS})"),
        ),
        Template::narrative(
            CombatTask,
            &format!(r"has completed an? (?i:{COMBAT_TIERS}) combat task"),
        ),
        Template::narrative(Pet, r"has a funny feeling"),
        Template::narrative(Death, r"has been defeated"),
        Template::narrative(PvpKill, r"has defeated"),
        Template::narrative(CofferDeposit, r"has deposited [\d,]+ coins into the coffer"),
        Template::narrative(
            Diary,
            &format!(r"has completed the (?i:{DIARY_TIERS}) (?:{DIARY_AREAS}) diary"),
        ),
        Template::narrative(
            CombatAchievementTier,
            &format!(
                r"has unlocked the (?i:{COMBAT_TIERS}) tier of rewards from Combat Achievements"
            ),
        ),
        Template::narrative(TotalLevel, r"has reached a total level of [\d,]+"),
        Template::narrative(Recruit, r"has been invited into the clan by"),
        Template::narrative(LootKey, r"has opened a loot key worth [\d,]+"),
    ]
});

/// Remove inline markup spans (`<...>`) from a line
pub fn strip_markup(line: &str) -> std::borrow::Cow<'_, str> {
    MARKUP.replace_all(line, "")
}

/// Player a line is about, or None if the line is not an attributable event
pub fn classify(line: &str) -> Option<String> {
    attribute(line).map(|attribution| attribution.player)
}

/// Who a line is about and what happened
pub fn attribute(line: &str) -> Option<Attribution> {
    let line = strip_markup(line);

    TEMPLATES.iter().find_map(|template| {
        let captures = template.regex.captures(&line)?;
        let player = captures.name("name")?.as_str().trim();
        if player.is_empty() {
            return None;
        }
        Some(Attribution {
            player: player.to_owned(),
            category: template.category,
        })
    })
}
